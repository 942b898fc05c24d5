// schema_init/src/core/step.rs

//! A single named step within a pipeline.

use super::ContextData;

/// Evaluated right before a step runs; returning `true` skips the step.
/// Operates on the root context so it can look at what earlier steps recorded.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// Definition of a pipeline step: its name, optionality, and skip condition.
///
/// An optional step without handlers is passed over silently. A non-optional
/// step without handlers fails the run with `SetupError::HandlerMissing`.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

// SkipCondition has no Debug, so print whether one is set.
impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
