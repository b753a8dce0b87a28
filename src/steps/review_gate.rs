//! Third step: suspend and hand the proposal to the external reviewer.

use async_trait::async_trait;

use crate::review::{DecisionCapabilities, SUSPENSION_SCHEMA_VERSION, SuspensionPayload};
use crate::state::WorkflowState;
use crate::step::{Step, StepContext, StepError, StepOutcome};

/// Always suspends — yielding control is this step's entire purpose.
///
/// Depends on: `proposed_updates`, `notify_message`. The suspension payload
/// carries the proposal plus a capability descriptor with all four response
/// kinds enabled. Resumption is a later, separate engine call; no task
/// blocks while the reviewer deliberates.
#[derive(Debug, Default, Clone)]
pub struct ReviewGate;

impl ReviewGate {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for ReviewGate {
    async fn run(&self, state: WorkflowState, ctx: StepContext) -> Result<StepOutcome, StepError> {
        if state.proposed_updates.is_empty() {
            return Err(StepError::MissingInput {
                what: "proposed_updates",
            });
        }

        let payload = SuspensionPayload {
            schema_version: SUSPENSION_SCHEMA_VERSION,
            instance_id: state.instance_id.clone(),
            proposed_updates: state.proposed_updates.clone(),
            notify_message: state.notify_message.clone(),
            capabilities: DecisionCapabilities::all(),
        };
        tracing::info!(
            instance = %ctx.instance_id,
            step = %ctx.step_name,
            "suspending for review"
        );
        Ok(StepOutcome::Suspend(state, payload))
    }
}
