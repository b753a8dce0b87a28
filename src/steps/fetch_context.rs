//! First step: fetch the context record for the instance.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::RecordSource;
use crate::state::WorkflowState;
use crate::step::{Step, StepContext, StepError, StepOutcome};

/// Fetches the current record from the external source and writes it into
/// `context_record`.
///
/// Depends on: `instance_id`. Produces: `context_record`. Never suspends.
pub struct FetchContext {
    source: Arc<dyn RecordSource>,
}

impl FetchContext {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Step for FetchContext {
    async fn run(
        &self,
        mut state: WorkflowState,
        ctx: StepContext,
    ) -> Result<StepOutcome, StepError> {
        let record = self
            .source
            .fetch_record(&state.instance_id)
            .await
            .map_err(|err| StepError::SourceUnavailable {
                message: err.to_string(),
            })?;

        tracing::debug!(
            instance = %ctx.instance_id,
            step = %ctx.step_name,
            "context record fetched"
        );
        state.context_record = Some(record);
        Ok(StepOutcome::Continue(state))
    }
}
