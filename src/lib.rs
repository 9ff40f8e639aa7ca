//! Compiler and virtual machine for a small Lua-like scripting language.
//!
//! ```text
//! source → tokens → AST → IR → linear IR → bytecode → binary ⇄ bytecode → VM
//! ```
//!
//! Each stage is a separate module and produces a new artifact; the helpers below chain
//! them. The library never installs a `tracing` subscriber.

pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod codegen_error;
pub mod error;
pub mod ir;
pub mod lang;
pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod runtime;
pub mod token;

use tracing::{debug, instrument};

pub use error::{Error, Result};
pub use lang::Value;
pub use runtime::{Console, VmConfig};

use crate::ast::Program;
use crate::bytecode::{CodeObject, Compiler};
use crate::codegen::CodeGenerator;
use crate::ir::LinearIr;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runtime::Vm;
use crate::token::Token;

#[instrument(skip_all)]
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let tokens = Lexer::new(source).tokenize()?;
    debug!(tokens = tokens.len(), "lexed");
    Ok(tokens)
}

#[instrument(skip_all)]
pub fn parse(source: &str) -> Result<Program> {
    let program = Parser::new(tokenize(source)?).parse()?;
    debug!(statements = program.statements.len(), "parsed");
    Ok(program)
}

#[instrument(skip_all)]
pub fn generate_ir(source: &str) -> Result<LinearIr> {
    Ok(CodeGenerator::new().generate(&parse(source)?)?)
}

#[instrument(skip_all)]
pub fn compile_to_bytecode(source: &str) -> Result<CodeObject> {
    Ok(Compiler::new().compile(&generate_ir(source)?)?)
}

/// Compiles a source unit to its binary form.
#[instrument(skip_all)]
pub fn compile(source: &str) -> Result<Vec<u8>> {
    let bytes = compile_to_bytecode(source)?.encode()?;
    debug!(bytes = bytes.len(), "encoded");
    Ok(bytes)
}

/// Compiles and runs a source unit. Returns the value of a top-level `return`, if any.
///
/// The program goes through its binary form first, so literals are classified exactly
/// as [`run_binary`] sees them.
#[instrument(skip_all)]
pub fn run_source(source: &str, config: VmConfig, console: Console<'_>) -> Result<Option<Value>> {
    run_binary(&compile(source)?, config, console)
}

/// Decodes and runs a binary produced by [`compile`].
#[instrument(skip_all)]
pub fn run_binary(bytes: &[u8], config: VmConfig, console: Console<'_>) -> Result<Option<Value>> {
    let code = CodeObject::decode(bytes)?;
    debug!(ops = code.len(), "decoded");
    Ok(Vm::new(code.ops, config, console).run()?)
}
