pub mod builtins;
pub mod config;
pub mod console;
pub mod frame;
pub mod runtime_error;
pub mod vm;

pub use config::VmConfig;
pub use console::Console;
pub use runtime_error::RuntimeError;
pub use vm::{RunState, Vm};
