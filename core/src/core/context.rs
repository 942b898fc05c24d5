// schema_init/src/core/context.rs

//! The `Handler<TData, Err>` type that every step phase stores.

use crate::core::context_data::ContextData;
use crate::core::control::StepControl;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a pipeline step handler.
///
/// A handler takes a clone of the run's `ContextData<TData>` and returns a
/// boxed future resolving to `Result<StepControl, Err>`.
///
/// Handlers read what they need under a short lock, drop the guard, and only
/// then await store calls. Results are written back under a fresh write lock.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;
