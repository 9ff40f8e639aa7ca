use serde::{Deserialize, Serialize};

use super::instruction::CallSite;
use crate::ast::{BinaryOp, UnaryOp};

/// Right-hand side of an assignment.
///
/// Operands are raw text: a variable or temporary name, or literal text exactly as it was
/// written (strings keep their quotes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrValue {
    Single(String),
    Unary {
        op: UnaryOp,
        operand: String,
    },
    Binary {
        op: BinaryOp,
        lhs: String,
        rhs: String,
    },
    /// Result of a call.
    Call(CallSite),
}

impl std::fmt::Display for IrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrValue::Single(value) => write!(f, "{}", value),
            IrValue::Unary { op, operand } => write!(f, "{} {}", op, operand),
            IrValue::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            IrValue::Call(call) => write!(f, "{}", call),
        }
    }
}
