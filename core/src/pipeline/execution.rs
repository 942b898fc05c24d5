// schema_init/src/pipeline/execution.rs

//! `Pipeline::run()`: executes steps in order, phase by phase.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{RunOutcome, StepControl};
use crate::core::step::StepDef;
use crate::error::SetupError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

/// What a phase asked the run loop to do next.
enum PhaseOutcome {
  Continue,
  Stop,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SetupError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// The first handler error aborts the run and is returned unchanged. Steps
  /// already executed are not undone.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(
            context_type = %std::any::type_name::<TData>(),
            num_steps = self.steps.len(),
        ),
        err(Display)
    )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<RunOutcome, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );
      if let PhaseOutcome::Stop = self.run_step(step_def, &ctx_data).instrument(step_span).await? {
        return Ok(RunOutcome::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(RunOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<PhaseOutcome, Err> {
    let step_name_str = step_def.name.as_str();

    if let Some(skip_cond_fn) = &step_def.skip_if {
      if skip_cond_fn(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped due to 'skip_if' condition.");
        return Ok(PhaseOutcome::Continue);
      }
    }

    let has_handlers = [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name_str).map_or(false, |v| !v.is_empty()));

    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PhaseOutcome::Continue);
      }
      event!(Level::ERROR, "Non-optional step has no handlers.");
      return Err(Err::from(SetupError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase_name, phase) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
      if let Some(handlers) = phase.get(step_name_str) {
        if let PhaseOutcome::Stop = run_phase(phase_name, handlers, ctx_data).await? {
          return Ok(PhaseOutcome::Stop);
        }
      }
    }
    event!(Level::DEBUG, "Step finished.");
    Ok(PhaseOutcome::Continue)
  }
}

async fn run_phase<TData, Err>(
  phase_name: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PhaseOutcome, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase = phase_name, handler_index = handler_idx, "Executing handler.");
    match handler_fn(ctx_data.clone()).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Stop) => {
        event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
        return Ok(PhaseOutcome::Stop);
      }
      Err(e) => {
        event!(Level::ERROR, phase = phase_name, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PhaseOutcome::Continue)
}
