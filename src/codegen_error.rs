use thiserror::Error;

use crate::ir::IrError;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("'break' outside of a loop")]
    BreakOutsideLoop,

    /// A declared function was called with more arguments than it has parameters.
    #[error("function '{name}' takes {expected} argument(s) but {found} were supplied")]
    TooManyArguments {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Ir(#[from] IrError),
}
