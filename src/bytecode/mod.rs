pub mod code_object;
pub mod codec;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod op;

pub use code_object::CodeObject;
pub use codec::{DecodeError, EncodeError};
pub use compile::Compiler;
pub use compile_error::BytecodeError;
pub use disasm::disassemble;
pub use op::Op;
