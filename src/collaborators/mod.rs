//! External collaborator contracts the workflow consumes.
//!
//! All three collaborators are injected trait objects so tests (and a real
//! deployment) can substitute their own implementations; nothing in the
//! engine holds a global instance. The mock-backed implementations used by
//! this repository live in [`mocks`].

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::state::FieldUpdate;

pub mod mocks;

/// Failure reported by a collaborator call.
#[derive(Debug, Error, Diagnostic)]
pub enum CollaboratorError {
    /// The call itself could not be completed.
    #[error("collaborator unavailable: {detail}")]
    #[diagnostic(code(reviewgate::collaborators::unavailable))]
    Unavailable { detail: String },

    /// The collaborator answered, and the answer was a failure.
    #[error("collaborator reported failure: {detail}")]
    #[diagnostic(code(reviewgate::collaborators::failed))]
    Failed { detail: String },
}

/// Source of the context record for an instance.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_record(&self, instance_id: &str) -> Result<Value, CollaboratorError>;
}

/// The drafting collaborator: given fixed instructions, the current record,
/// and the external input, reply with raw text that is expected to parse as
/// a [`DraftProposal`].
///
/// Parsing is the caller's job; a drafter that replies with prose instead
/// of JSON is a contract violation the drafting step reports, not one this
/// trait models.
#[async_trait]
pub trait ProposalDrafter: Send + Sync {
    async fn draft(
        &self,
        instructions: &str,
        record: &Value,
        external_input: &Value,
    ) -> Result<String, CollaboratorError>;
}

/// Pushes accepted updates back to the record source.
#[async_trait]
pub trait RecordApplier: Send + Sync {
    async fn apply_updates(
        &self,
        instance_id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), CollaboratorError>;
}

/// The structured shape a drafter's reply must parse into.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftProposal {
    pub updates: Vec<FieldUpdate>,
    pub message: String,
}

/// The three collaborators a standard chain is wired with.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn RecordSource>,
    pub drafter: Arc<dyn ProposalDrafter>,
    pub applier: Arc<dyn RecordApplier>,
}

impl Collaborators {
    pub fn new(
        source: Arc<dyn RecordSource>,
        drafter: Arc<dyn ProposalDrafter>,
        applier: Arc<dyn RecordApplier>,
    ) -> Self {
        Self {
            source,
            drafter,
            applier,
        }
    }

    /// The mock-backed set used by this repository: synthesized records,
    /// a deterministic template drafter, and an applier that always
    /// succeeds.
    #[must_use]
    pub fn mocked() -> Self {
        Self {
            source: Arc::new(mocks::MockRecordSource::new()),
            drafter: Arc::new(mocks::TemplateDrafter::new()),
            applier: Arc::new(mocks::MockRecordApplier::new()),
        }
    }
}
