//! Mock-backed collaborators.
//!
//! These stand in for the real record system and drafting model. They are
//! deterministic so the surrounding tests can assert exact payloads, and
//! they honor the same contracts a production implementation would.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{CollaboratorError, ProposalDrafter, RecordApplier, RecordSource};
use crate::state::FieldUpdate;

/// Synthesizes a case record for any instance id. Has no failure mode; a
/// real source would surface unavailability instead.
#[derive(Debug, Default, Clone)]
pub struct MockRecordSource;

impl MockRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_record(&self, instance_id: &str) -> Result<Value, CollaboratorError> {
        Ok(json!({
            "case_number": instance_id,
            "loan_phase": "awaiting_screening_result",
            "screening_result": null,
            "screening_result_received": null,
        }))
    }
}

/// Deterministic drafter that fills the drafting contract from a template
/// instead of calling a generative model.
///
/// Reads `result` from the external input and the case number from the
/// record, and replies with the exact JSON shape the drafting step parses.
#[derive(Debug, Default, Clone)]
pub struct TemplateDrafter;

impl TemplateDrafter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProposalDrafter for TemplateDrafter {
    async fn draft(
        &self,
        _instructions: &str,
        record: &Value,
        external_input: &Value,
    ) -> Result<String, CollaboratorError> {
        let case_number = record
            .get("case_number")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let result = external_input
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let received = chrono::Utc::now().date_naive().to_string();

        let reply = json!({
            "updates": [
                {"field_code": "screening_result", "value": result},
                {"field_code": "screening_result_received", "value": received},
                {"field_code": "loan_phase", "value": "screening_result_received"},
            ],
            "message": format!("Case {case_number} preliminary screening result: {result}."),
        });
        Ok(reply.to_string())
    }
}

/// Applier that always succeeds without touching anything.
#[derive(Debug, Default, Clone)]
pub struct MockRecordApplier;

impl MockRecordApplier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordApplier for MockRecordApplier {
    async fn apply_updates(
        &self,
        instance_id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), CollaboratorError> {
        tracing::debug!(
            instance = %instance_id,
            update_count = updates.len(),
            "mock applier accepted updates"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::DraftProposal;

    #[tokio::test]
    async fn mock_record_carries_the_instance_id() {
        let record = MockRecordSource::new().fetch_record("A-42").await.unwrap();
        assert_eq!(record["case_number"], json!("A-42"));
        assert_eq!(record["loan_phase"], json!("awaiting_screening_result"));
        assert!(record["screening_result"].is_null());
    }

    #[tokio::test]
    async fn template_draft_parses_as_a_proposal() {
        let record = MockRecordSource::new().fetch_record("A-7").await.unwrap();
        let reply = TemplateDrafter::new()
            .draft("", &record, &json!({"result": "rejected"}))
            .await
            .unwrap();

        let proposal: DraftProposal = serde_json::from_str(&reply).unwrap();
        assert_eq!(proposal.updates.len(), 3);
        assert_eq!(proposal.updates[0].field_code, "screening_result");
        assert_eq!(proposal.updates[0].value, json!("rejected"));
        assert!(proposal.message.contains("A-7"));
        assert!(proposal.message.contains("rejected"));
    }
}
