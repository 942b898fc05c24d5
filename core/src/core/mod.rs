pub mod context;
pub mod context_data;
pub mod control;
pub mod step;

// Re-export key types for the pipeline modules (and lib.rs)
pub use context::Handler;
pub use context_data::ContextData;
pub use control::{RunOutcome, StepControl};
pub use step::{SkipCondition, StepDef};
