use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::instruction::{InstrId, Instruction};

#[derive(Debug, Error)]
pub enum IrError {
    /// A jump or call points past the last real instruction.
    #[error("instruction {from} targets {to}, which is not a live instruction")]
    DanglingTarget { from: InstrId, to: InstrId },

    #[error("a blank instruction survived linearization at {0}")]
    BlankRemains(InstrId),

    #[error("IR snapshot error: {0}")]
    Snapshot(#[from] postcard::Error),
}

/// Linearized IR: ids are `0..len()` in order, no blanks, every target is a valid id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearIr {
    instructions: Vec<Instruction>,
}

impl LinearIr {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.instructions.get(id)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstrId, &Instruction)> {
        self.instructions.iter().enumerate()
    }

    /// Checks the linearization invariants.
    pub fn validate(&self) -> Result<(), IrError> {
        for (id, instr) in self.iter() {
            if instr.is_blank() {
                return Err(IrError::BlankRemains(id));
            }
            if let Some(target) = instr.target() {
                if target >= self.len() {
                    return Err(IrError::DanglingTarget {
                        from: id,
                        to: target,
                    });
                }
            }
        }
        Ok(())
    }

    /// Compact snapshot for tools that consume the IR read-only.
    pub fn to_postcard(&self) -> Result<Vec<u8>, IrError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_postcard(bytes: &[u8]) -> Result<Self, IrError> {
        let ir: LinearIr = postcard::from_bytes(bytes)?;
        ir.validate()?;
        Ok(ir)
    }
}

impl std::fmt::Display for LinearIr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (id, instr) in self.iter() {
            writeln!(f, "{}: {}", id, instr)?;
        }
        Ok(())
    }
}

/// Drops blanks and renumbers densely.
///
/// A target that named a blank is moved to the first non-blank instruction after it.
pub fn linearize(arena: Vec<Instruction>) -> Result<LinearIr, IrError> {
    let mut remap = Vec::with_capacity(arena.len());
    let mut next_id = 0;
    for instr in &arena {
        remap.push(next_id);
        if !instr.is_blank() {
            next_id += 1;
        }
    }

    let mut instructions = Vec::with_capacity(next_id);
    for mut instr in arena.into_iter().filter(|i| !i.is_blank()) {
        if let Some(target) = instr.target_mut() {
            let from = instructions.len();
            *target = *remap.get(*target).ok_or(IrError::DanglingTarget {
                from,
                to: *target,
            })?;
        }
        instructions.push(instr);
    }

    let ir = LinearIr { instructions };
    ir.validate()?;
    debug!(instructions = ir.len(), "linearized IR");
    Ok(ir)
}
