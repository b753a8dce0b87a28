//! Final step: push the reviewed updates to the record source.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::RecordApplier;
use crate::state::{Status, WorkflowState};
use crate::step::{Step, StepContext, StepError, StepOutcome};

/// Applies `proposed_updates` through the external applier and marks the
/// instance applied.
///
/// Depends on: `proposed_updates`, `status` in `{approved, edited}`. On
/// applier failure the step fails with `CommitFailed` and the checkpoint
/// keeps the approved state, so a later re-attempt is not forbidden by the
/// persisted data.
pub struct Commit {
    applier: Arc<dyn RecordApplier>,
}

impl Commit {
    pub fn new(applier: Arc<dyn RecordApplier>) -> Self {
        Self { applier }
    }
}

#[async_trait]
impl Step for Commit {
    async fn run(
        &self,
        mut state: WorkflowState,
        ctx: StepContext,
    ) -> Result<StepOutcome, StepError> {
        if !matches!(state.status, Status::Approved | Status::Edited) {
            return Err(StepError::Invariant {
                message: format!("commit reached with status {}", state.status),
            });
        }
        if state.proposed_updates.is_empty() {
            return Err(StepError::Invariant {
                message: "commit reached with no proposed updates".to_string(),
            });
        }

        self.applier
            .apply_updates(&state.instance_id, &state.proposed_updates)
            .await
            .map_err(|err| StepError::CommitFailed {
                message: err.to_string(),
            })?;

        tracing::info!(
            instance = %ctx.instance_id,
            update_count = state.proposed_updates.len(),
            "updates applied"
        );
        state.applied = true;
        state.advance_status(Status::Applied)?;
        Ok(StepOutcome::Continue(state))
    }
}
