//! Language-level data shared by the compiler and the virtual machine.

pub mod value;

pub use value::Value;
