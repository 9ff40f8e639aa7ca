use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, UnaryOp};
use crate::lang::value::Value;

// =============================================================================
// OP - Stack machine instructions
// =============================================================================

/// One stack-machine instruction. An op's address is its index in the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // binary operators: ( rhs lhs -- result ), lhs is on top
    Or,
    And,
    Eq,
    Neq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    DivRem,

    // unary operators: ( a -- result )
    UnaryPlus,
    UnaryMinus,
    UnaryNot,

    // ==========================================================================
    // Commands
    // ==========================================================================
    /// Push the binding of a slot in the current frame (`nil` if unbound).
    Pushv(usize),
    /// Push a literal.
    Pushl(Value),
    Pop,
    /// ( slot value -- ) bind value to slot.
    Load,
    /// ( addr -- )
    Jmp,
    /// ( addr cond -- ) jump when cond is truthy.
    CJmp,
    /// ( pairs.. [slot] flag addr argc -- [slot] )
    Call,
    /// ( pairs.. [slot] flag name argc -- [slot] result )
    Callb,
    Return,
    Hault,
}

impl Op {
    pub fn binary(op: BinaryOp) -> Op {
        match op {
            BinaryOp::Or => Op::Or,
            BinaryOp::And => Op::And,
            BinaryOp::Eq => Op::Eq,
            BinaryOp::Neq => Op::Neq,
            BinaryOp::Less => Op::Less,
            BinaryOp::LessEq => Op::LessEq,
            BinaryOp::Greater => Op::Greater,
            BinaryOp::GreaterEq => Op::GreaterEq,
            BinaryOp::Add => Op::Add,
            BinaryOp::Sub => Op::Sub,
            BinaryOp::Mul => Op::Mul,
            BinaryOp::Div => Op::Div,
            BinaryOp::Rem => Op::DivRem,
        }
    }

    pub fn unary(op: UnaryOp) -> Op {
        match op {
            UnaryOp::Plus => Op::UnaryPlus,
            UnaryOp::Minus => Op::UnaryMinus,
            UnaryOp::Not => Op::UnaryNot,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Or => "OR",
            Op::And => "AND",
            Op::Eq => "EQ",
            Op::Neq => "NEQ",
            Op::Less => "LESS",
            Op::LessEq => "LESSEQ",
            Op::Greater => "GREATER",
            Op::GreaterEq => "GREATEREQ",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::DivRem => "DIVREM",
            Op::UnaryPlus => "UNARYPLUS",
            Op::UnaryMinus => "UNARYMINUS",
            Op::UnaryNot => "UNARYNOT",
            Op::Pushv(_) => "PUSHV",
            Op::Pushl(_) => "PUSHL",
            Op::Pop => "POP",
            Op::Load => "LOAD",
            Op::Jmp => "JMP",
            Op::CJmp => "CJMP",
            Op::Call => "CALL",
            Op::Callb => "CALLB",
            Op::Return => "RETURN",
            Op::Hault => "HAULT",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Pushv(slot) => write!(f, "{} {}", self.mnemonic(), slot),
            Op::Pushl(Value::String(s)) => write!(f, "{} {:?}", self.mnemonic(), s),
            Op::Pushl(value) => write!(f, "{} {}", self.mnemonic(), value),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
