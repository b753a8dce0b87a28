//! Public error taxonomy of the workflow engine.
//!
//! Three classes, never conflated:
//!
//! - **Caller errors** — bad input or bad timing; instance state is
//!   unchanged and the call is safe to retry after correcting the input.
//! - **Collaborator errors** — an external dependency failed; the
//!   checkpoint is left at the last successfully completed step and
//!   re-invoking is the retry path.
//! - **Internal errors** — broken storage or a violated engine invariant;
//!   never something a caller can fix by adjusting input.
//!
//! Every variant carries the instance id and a human-readable detail.

use miette::Diagnostic;
use thiserror::Error;

use crate::review::DecisionError;
use crate::step::StepError;

/// Which party an error implicates. See the module docs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Caller,
    Collaborator,
    Internal,
}

/// Errors surfaced by [`Engine`](crate::runtimes::Engine) calls.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("instance {instance_id} already exists")]
    #[diagnostic(
        code(reviewgate::engine::instance_already_exists),
        help("Request an explicit restart to discard the existing checkpoint.")
    )]
    InstanceAlreadyExists { instance_id: String },

    #[error("no such instance: {instance_id}")]
    #[diagnostic(code(reviewgate::engine::unknown_instance))]
    UnknownInstance { instance_id: String },

    #[error("instance {instance_id} is not suspended")]
    #[diagnostic(
        code(reviewgate::engine::not_suspended),
        help("Only an instance paused at a review gate can be resumed.")
    )]
    NotSuspended { instance_id: String },

    #[error("invalid decision for instance {instance_id}: {source}")]
    #[diagnostic(code(reviewgate::engine::invalid_decision))]
    InvalidDecision {
        instance_id: String,
        #[source]
        source: DecisionError,
    },

    #[error("concurrent modification of instance {instance_id}")]
    #[diagnostic(
        code(reviewgate::engine::concurrent_modification),
        help("Another start/resume call won the race; reload the checkpoint before retrying.")
    )]
    ConcurrentModification { instance_id: String },

    #[error("record source unavailable for instance {instance_id}: {detail}")]
    #[diagnostic(code(reviewgate::engine::source_unavailable))]
    SourceUnavailable { instance_id: String, detail: String },

    #[error("drafting collaborator unavailable for instance {instance_id}: {detail}")]
    #[diagnostic(code(reviewgate::engine::draft_unavailable))]
    DraftUnavailable { instance_id: String, detail: String },

    #[error("drafting output malformed for instance {instance_id}: {detail}")]
    #[diagnostic(
        code(reviewgate::engine::draft_malformed),
        help("The instance can be restarted from scratch; drafting is idempotent.")
    )]
    DraftMalformed { instance_id: String, detail: String },

    #[error("commit failed for instance {instance_id}: {detail}")]
    #[diagnostic(code(reviewgate::engine::commit_failed))]
    CommitFailed { instance_id: String, detail: String },

    #[error("engine internal error for instance {instance_id}: {detail}")]
    #[diagnostic(
        code(reviewgate::engine::internal),
        help("Indicates broken storage or a violated invariant, not bad caller input.")
    )]
    Internal { instance_id: String, detail: String },
}

impl EngineError {
    /// The instance the error concerns.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        match self {
            EngineError::InstanceAlreadyExists { instance_id }
            | EngineError::UnknownInstance { instance_id }
            | EngineError::NotSuspended { instance_id }
            | EngineError::InvalidDecision { instance_id, .. }
            | EngineError::ConcurrentModification { instance_id }
            | EngineError::SourceUnavailable { instance_id, .. }
            | EngineError::DraftUnavailable { instance_id, .. }
            | EngineError::DraftMalformed { instance_id, .. }
            | EngineError::CommitFailed { instance_id, .. }
            | EngineError::Internal { instance_id, .. } => instance_id,
        }
    }

    /// Classify the error for retry policy and operator triage.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::InstanceAlreadyExists { .. }
            | EngineError::UnknownInstance { .. }
            | EngineError::NotSuspended { .. }
            | EngineError::InvalidDecision { .. }
            | EngineError::ConcurrentModification { .. } => ErrorClass::Caller,
            EngineError::SourceUnavailable { .. }
            | EngineError::DraftUnavailable { .. }
            | EngineError::DraftMalformed { .. }
            | EngineError::CommitFailed { .. } => ErrorClass::Collaborator,
            EngineError::Internal { .. } => ErrorClass::Internal,
        }
    }

    /// Map a fatal step failure onto the public taxonomy.
    pub(crate) fn from_step(instance_id: &str, err: StepError) -> Self {
        let instance_id = instance_id.to_string();
        match err {
            StepError::SourceUnavailable { message } => EngineError::SourceUnavailable {
                instance_id,
                detail: message,
            },
            StepError::DraftUnavailable { message } => EngineError::DraftUnavailable {
                instance_id,
                detail: message,
            },
            StepError::DraftMalformed { message } => EngineError::DraftMalformed {
                instance_id,
                detail: message,
            },
            StepError::CommitFailed { message } => EngineError::CommitFailed {
                instance_id,
                detail: message,
            },
            StepError::MissingInput { what } => EngineError::Internal {
                instance_id,
                detail: format!("step ran without its input: {what}"),
            },
            StepError::Invariant { message } => EngineError::Internal {
                instance_id,
                detail: message,
            },
        }
    }
}
