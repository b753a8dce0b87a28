//! Second step: draft the field updates and the notification message.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::{DraftProposal, ProposalDrafter};
use crate::state::{Status, WorkflowState};
use crate::step::{Step, StepContext, StepError, StepOutcome};

/// Instruction preamble handed to the drafting collaborator on every call.
///
/// The contract is fixed: the drafter produces a proposal for human review,
/// never applies anything itself, and replies with JSON only.
pub const DRAFT_INSTRUCTIONS: &str = "You are drafting record updates for a loan case. \
Given the current record and the preliminary screening result, propose the field \
updates that bring the record in line with the result. The proposal is a draft for \
human review; you never apply updates yourself. Reply with JSON only, of the shape \
{\"updates\": [{\"field_code\": \"...\", \"value\": ...}, ...], \"message\": \"...\"} \
where message is a short notification naming the case and the result.";

/// Calls the drafting collaborator and parses its reply into
/// `proposed_updates` and `notify_message`.
///
/// Depends on: `context_record`, `external_input`. Produces:
/// `proposed_updates`, `notify_message`, `status = ready_for_review`,
/// `needs_review`. Idempotent: a failed instance can be restarted from
/// scratch without side effects.
pub struct DraftUpdates {
    drafter: Arc<dyn ProposalDrafter>,
}

impl DraftUpdates {
    pub fn new(drafter: Arc<dyn ProposalDrafter>) -> Self {
        Self { drafter }
    }

    fn parse_proposal(raw: &str) -> Result<DraftProposal, StepError> {
        let proposal: DraftProposal =
            serde_json::from_str(raw).map_err(|err| StepError::DraftMalformed {
                message: err.to_string(),
            })?;
        if proposal.updates.is_empty() {
            return Err(StepError::DraftMalformed {
                message: "proposal carries no updates".to_string(),
            });
        }
        Ok(proposal)
    }
}

#[async_trait]
impl Step for DraftUpdates {
    async fn run(
        &self,
        mut state: WorkflowState,
        ctx: StepContext,
    ) -> Result<StepOutcome, StepError> {
        let record = state.context_record.as_ref().ok_or(StepError::MissingInput {
            what: "context_record",
        })?;

        let raw = self
            .drafter
            .draft(DRAFT_INSTRUCTIONS, record, &state.external_input)
            .await
            .map_err(|err| StepError::DraftUnavailable {
                message: err.to_string(),
            })?;

        let proposal = Self::parse_proposal(&raw)?;
        tracing::info!(
            instance = %ctx.instance_id,
            update_count = proposal.updates.len(),
            "update proposal drafted"
        );

        state.proposed_updates = proposal.updates;
        state.notify_message = proposal.message;
        state.advance_status(Status::ReadyForReview)?;
        state.needs_review = true;
        Ok(StepOutcome::Continue(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_reply_is_malformed() {
        let err = DraftUpdates::parse_proposal("I cannot produce JSON today.").unwrap_err();
        assert!(matches!(err, StepError::DraftMalformed { .. }));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = DraftUpdates::parse_proposal(r#"{"updates": "not-a-list", "message": "m"}"#)
            .unwrap_err();
        assert!(matches!(err, StepError::DraftMalformed { .. }));
    }

    #[test]
    fn empty_updates_are_malformed() {
        let err =
            DraftUpdates::parse_proposal(r#"{"updates": [], "message": "nothing"}"#).unwrap_err();
        assert!(matches!(err, StepError::DraftMalformed { .. }));
    }

    #[test]
    fn well_formed_proposal_parses() {
        let proposal = DraftUpdates::parse_proposal(
            r#"{"updates": [{"field_code": "screening_result", "value": "approved"}], "message": "Case A-1 approved."}"#,
        )
        .unwrap();
        assert_eq!(proposal.updates.len(), 1);
        assert_eq!(proposal.message, "Case A-1 approved.");
    }
}
