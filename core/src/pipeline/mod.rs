// schema_init/src/pipeline/mod.rs

//! The `Pipeline<TData, Err>` struct: construction, handler registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
