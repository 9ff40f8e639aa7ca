use serde::{Deserialize, Serialize};

use super::codec::{self, DecodeError, EncodeError};
use super::disasm::disassemble;
use super::op::Op;

/// A compiled instruction stream. Execution starts at op 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeObject {
    pub ops: Vec<Op>,
}

impl CodeObject {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        codec::encode(&self.ops)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::new(codec::decode(bytes)?))
    }
}

impl std::fmt::Display for CodeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&disassemble(&self.ops))
    }
}
