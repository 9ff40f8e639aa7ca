use thiserror::Error;

use crate::ir::InstrId;

/// Lowering failures. Linearized IR from the code generator never produces these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BytecodeError {
    /// A jump or call names an IR id that generated no ops.
    #[error("op {op} refers to IR instruction {target}, which does not exist")]
    UnresolvedTarget { op: usize, target: InstrId },

    #[error("no slot was numbered for '{0}'")]
    UnknownSlot(String),
}
