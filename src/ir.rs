//! Three-address intermediate representation.
//!
//! The code generator appends instructions to an arena (`Vec<Instruction>`); jump and call
//! targets are arena indices. `linearize` then drops the `Blank` placeholders and rewrites
//! every target so that ids are dense and every target names a real instruction.

pub mod instruction;
pub mod linearize;
pub mod value;

pub use instruction::{CallSite, InstrId, Instruction};
pub use linearize::{IrError, LinearIr, linearize};
pub use value::IrValue;
