//! The review contract: what a suspended instance hands to the external
//! actor, and how the actor's decision is folded back into the state.
//!
//! Both sides of the contract are versioned independently of step internals:
//! [`SuspensionPayload`] and [`Decision`] each carry a `schema_version`, and
//! the adapter rejects versions it does not understand rather than guessing.
//!
//! # Decision protocol
//!
//! The adapter speaks the richer four-kind protocol:
//!
//! | kind      | data              | effect                       | continues? |
//! |-----------|-------------------|------------------------------|------------|
//! | `ignore`  | none              | none                         | no         |
//! | `comment` | string            | stores the comment           | no         |
//! | `edit`    | replacement updates | replaces proposed updates  | yes        |
//! | `accept`  | none              | none                         | yes        |
//!
//! A malformed decision never mutates anything: the adapter works on a copy
//! and returns an error before the engine persists, so the checkpoint is
//! untouched and the resume call is safe to retry.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::state::{FieldUpdate, Status, StatusError, WorkflowState};

/// Version of the suspension payload contract produced by this crate.
pub const SUSPENSION_SCHEMA_VERSION: u32 = 1;

/// Version of the decision contract understood by this crate.
pub const DECISION_SCHEMA_VERSION: u32 = 1;

fn suspension_schema_version() -> u32 {
    SUSPENSION_SCHEMA_VERSION
}

fn decision_schema_version() -> u32 {
    DECISION_SCHEMA_VERSION
}

/// What a suspending step hands to the external actor.
///
/// Persisted inside the checkpoint for as long as the instance stays
/// suspended, and returned verbatim from `start`/`resume` calls that end in
/// suspension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuspensionPayload {
    #[serde(default = "suspension_schema_version")]
    pub schema_version: u32,
    pub instance_id: String,
    pub proposed_updates: Vec<FieldUpdate>,
    pub notify_message: String,
    /// Which response kinds the actor may choose.
    pub capabilities: DecisionCapabilities,
}

/// Capability descriptor: the response kinds an external actor may choose
/// for one suspension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCapabilities {
    pub accept: bool,
    pub edit: bool,
    pub comment: bool,
    pub ignore: bool,
}

impl DecisionCapabilities {
    /// All four response kinds enabled — the review-gate default.
    #[must_use]
    pub fn all() -> Self {
        Self {
            accept: true,
            edit: true,
            comment: true,
            ignore: true,
        }
    }

    #[must_use]
    pub fn permits(&self, kind: DecisionKind) -> bool {
        match kind {
            DecisionKind::Accept => self.accept,
            DecisionKind::Edit => self.edit,
            DecisionKind::Comment => self.comment,
            DecisionKind::Ignore => self.ignore,
        }
    }
}

/// The response kind chosen by the external actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Accept,
    Edit,
    Comment,
    Ignore,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DecisionKind::Accept => "accept",
            DecisionKind::Edit => "edit",
            DecisionKind::Comment => "comment",
            DecisionKind::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

/// The external actor's reply that resumes a suspended instance.
///
/// `data` is raw JSON; the adapter parses it per kind so that shape errors
/// surface as [`DecisionError`] instead of partially applied state. Kinds
/// that expect no data tolerate and discard any that is supplied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default = "decision_schema_version")]
    pub schema_version: u32,
    pub kind: DecisionKind,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Decision {
    #[must_use]
    pub fn accept() -> Self {
        Self {
            schema_version: DECISION_SCHEMA_VERSION,
            kind: DecisionKind::Accept,
            data: None,
        }
    }

    #[must_use]
    pub fn ignore() -> Self {
        Self {
            schema_version: DECISION_SCHEMA_VERSION,
            kind: DecisionKind::Ignore,
            data: None,
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            schema_version: DECISION_SCHEMA_VERSION,
            kind: DecisionKind::Comment,
            data: Some(Value::String(text.into())),
        }
    }

    /// An `edit` decision replacing the drafted updates wholesale.
    pub fn edit(updates: Vec<FieldUpdate>) -> Self {
        let data = serde_json::to_value(updates).unwrap_or(Value::Null);
        Self {
            schema_version: DECISION_SCHEMA_VERSION,
            kind: DecisionKind::Edit,
            data: Some(data),
        }
    }
}

/// How the engine should continue after a decision is folded in.
#[derive(Clone, Debug)]
pub enum DecisionEffect {
    /// Resume execution at the step after the suspension.
    Continue(WorkflowState),
    /// The decision ended the run; no further steps execute.
    Halt(WorkflowState),
}

/// Decision payloads the adapter refuses to apply. The checkpoint is left
/// unchanged in every case.
#[derive(Debug, Error, Diagnostic)]
pub enum DecisionError {
    #[error("unsupported decision schema version {got} (supported: {DECISION_SCHEMA_VERSION})")]
    #[diagnostic(code(reviewgate::review::unsupported_schema))]
    UnsupportedSchema { got: u32 },

    #[error("decision kind {kind} is not permitted for this suspension")]
    #[diagnostic(
        code(reviewgate::review::not_permitted),
        help("Consult the capability descriptor in the suspension payload.")
    )]
    NotPermitted { kind: DecisionKind },

    #[error("decision kind {kind} requires {expected} data, none supplied")]
    #[diagnostic(code(reviewgate::review::missing_data))]
    MissingData {
        kind: DecisionKind,
        expected: &'static str,
    },

    #[error("decision data for {kind} is malformed: {detail}")]
    #[diagnostic(code(reviewgate::review::malformed_data))]
    MalformedData { kind: DecisionKind, detail: String },

    #[error("edit decision supplied an empty replacement sequence")]
    #[diagnostic(
        code(reviewgate::review::empty_updates),
        help("An edit must carry at least one field update.")
    )]
    EmptyUpdates,

    #[error(transparent)]
    #[diagnostic(code(reviewgate::review::status))]
    Status(#[from] StatusError),
}

/// Fold an external decision into the suspended state.
///
/// Works on a copy of `state`; the caller persists the returned state only
/// on success, which is what makes a failed resume safe to retry.
pub fn apply_decision(
    state: &WorkflowState,
    capabilities: &DecisionCapabilities,
    decision: &Decision,
) -> Result<DecisionEffect, DecisionError> {
    if decision.schema_version != DECISION_SCHEMA_VERSION {
        return Err(DecisionError::UnsupportedSchema {
            got: decision.schema_version,
        });
    }
    if !capabilities.permits(decision.kind) {
        return Err(DecisionError::NotPermitted {
            kind: decision.kind,
        });
    }

    let mut next = state.clone();
    match decision.kind {
        DecisionKind::Ignore => {
            next.advance_status(Status::Ignored)?;
            next.needs_review = false;
            Ok(DecisionEffect::Halt(next))
        }
        DecisionKind::Comment => {
            let text = match &decision.data {
                Some(Value::String(text)) => text.clone(),
                Some(other) => {
                    return Err(DecisionError::MalformedData {
                        kind: DecisionKind::Comment,
                        detail: format!("expected a string, got {other}"),
                    });
                }
                None => {
                    return Err(DecisionError::MissingData {
                        kind: DecisionKind::Comment,
                        expected: "a comment string",
                    });
                }
            };
            next.human_comment = Some(text);
            next.advance_status(Status::Commented)?;
            next.needs_review = false;
            Ok(DecisionEffect::Halt(next))
        }
        DecisionKind::Edit => {
            let data = decision.data.clone().ok_or(DecisionError::MissingData {
                kind: DecisionKind::Edit,
                expected: "a replacement update sequence",
            })?;
            let updates: Vec<FieldUpdate> =
                serde_json::from_value(data).map_err(|e| DecisionError::MalformedData {
                    kind: DecisionKind::Edit,
                    detail: e.to_string(),
                })?;
            if updates.is_empty() {
                return Err(DecisionError::EmptyUpdates);
            }
            next.proposed_updates = updates;
            next.advance_status(Status::Edited)?;
            next.needs_review = false;
            Ok(DecisionEffect::Continue(next))
        }
        DecisionKind::Accept => {
            next.advance_status(Status::Approved)?;
            next.needs_review = false;
            Ok(DecisionEffect::Continue(next))
        }
    }
}
