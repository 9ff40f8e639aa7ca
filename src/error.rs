use thiserror::Error;

use crate::bytecode::{BytecodeError, DecodeError, EncodeError};
use crate::codegen_error::CodegenError;
use crate::lexer::LexerError;
use crate::parser_error::ParserError;
use crate::runtime::RuntimeError;

/// Any failure from the pipeline, tagged by the phase that raised it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, Error>;
