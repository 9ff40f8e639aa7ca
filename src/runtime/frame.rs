use std::collections::HashMap;

use crate::lang::value::Value;
use crate::runtime::runtime_error::RuntimeError;

/// One function activation: an operand stack plus slot bindings.
///
/// A callee frame's stack starts with the caller's return address.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    stack: Vec<Value>,
    bindings: HashMap<usize, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// The binding of `slot`, `nil` when unbound.
    pub fn get(&self, slot: usize) -> Value {
        self.bindings.get(&slot).cloned().unwrap_or(Value::Nil)
    }

    pub fn bind(&mut self, slot: usize, value: Value) {
        self.bindings.insert(slot, value);
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }
}
