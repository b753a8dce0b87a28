//! The unit of work executed by the engine.
//!
//! A [`Step`] is a stateless async function from [`WorkflowState`] to a
//! [`StepOutcome`]. Steps own no data between invocations; anything they
//! need across a suspend boundary must live in the state or the checkpoint.
//!
//! A step either continues the chain, suspends it with a payload for an
//! external actor, or fails. Failure is fatal to the current call — the
//! engine performs no retries — but the checkpoint keeps the last good
//! state so the caller can retry.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::review::SuspensionPayload;
use crate::state::{StatusError, WorkflowState};

/// A single unit of work in a workflow chain.
///
/// Implementations receive an owned copy of the current state and return a
/// new one inside the outcome; the engine snapshots the result into the
/// checkpoint before the next step runs.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, state: WorkflowState, ctx: StepContext) -> Result<StepOutcome, StepError>;
}

/// Execution context handed to a step for tracing and diagnostics.
#[derive(Clone, Debug)]
pub struct StepContext {
    /// Instance this invocation belongs to.
    pub instance_id: String,
    /// Position of the step in its chain.
    pub step_index: usize,
    /// Name the step was registered under.
    pub step_name: String,
}

/// What a step asks the engine to do next.
#[derive(Clone, Debug)]
pub enum StepOutcome {
    /// Persist the state and run the next step.
    Continue(WorkflowState),
    /// Persist the state and the payload, then return control to the caller.
    /// The chain resumes from the step after this one once a decision
    /// arrives.
    Suspend(WorkflowState, SuspensionPayload),
}

/// Fatal step failures. The engine maps these onto its public error
/// taxonomy; the checkpoint is left at the last successfully completed step.
#[derive(Debug, Error, Diagnostic)]
pub enum StepError {
    /// A field this step depends on has not been produced yet.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(reviewgate::step::missing_input),
        help("Check that the previous step produced the required field.")
    )]
    MissingInput { what: &'static str },

    /// The external record source could not serve the fetch.
    #[error("record source unavailable: {message}")]
    #[diagnostic(code(reviewgate::step::source_unavailable))]
    SourceUnavailable { message: String },

    /// The drafting collaborator call itself failed.
    #[error("drafting collaborator unavailable: {message}")]
    #[diagnostic(code(reviewgate::step::draft_unavailable))]
    DraftUnavailable { message: String },

    /// The drafting collaborator replied with something that does not parse
    /// as `{updates, message}`.
    #[error("drafting output malformed: {message}")]
    #[diagnostic(
        code(reviewgate::step::draft_malformed),
        help("The drafter must reply with JSON carrying an `updates` array and a `message` string.")
    )]
    DraftMalformed { message: String },

    /// The apply collaborator reported failure while pushing updates.
    #[error("commit failed: {message}")]
    #[diagnostic(code(reviewgate::step::commit_failed))]
    CommitFailed { message: String },

    /// The chain reached this step with state it should never carry here.
    /// Indicates an engine or chain-wiring bug, not bad caller input.
    #[error("step invariant violated: {message}")]
    #[diagnostic(code(reviewgate::step::invariant))]
    Invariant { message: String },
}

impl From<StatusError> for StepError {
    fn from(err: StatusError) -> Self {
        StepError::Invariant {
            message: err.to_string(),
        }
    }
}
