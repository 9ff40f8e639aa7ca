use thiserror::Error;

use crate::lang::value::Value;

/// A fault stops the machine; `Vm::ip` still points at the failing op.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime error: pop from an empty stack")]
    StackUnderflow,

    #[error("runtime error: stack overflow ({limit} frames)")]
    StackOverflow { limit: usize },

    #[error("runtime error: cannot convert {found} '{value}' to a number")]
    NotANumber { found: &'static str, value: String },

    #[error("runtime error: division by zero")]
    DivisionByZero,

    #[error("runtime error: unknown builtin '{0}'")]
    UnknownBuiltin(String),

    #[error("runtime error: invalid slot '{0}'")]
    InvalidSlot(String),

    #[error("runtime error: invalid address '{0}'")]
    InvalidAddress(String),

    /// A call operand (argument count or builtin name) has the wrong shape.
    #[error("runtime error: invalid call operand '{0}'")]
    InvalidOperand(String),

    #[error("runtime error: console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn not_a_number(value: &Value) -> Self {
        RuntimeError::NotANumber {
            found: value.type_name(),
            value: value.to_string(),
        }
    }
}
