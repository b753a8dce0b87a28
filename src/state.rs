//! Workflow state threaded through every step of a review-gated run.
//!
//! [`WorkflowState`] is plain, serializable data with value semantics: the
//! engine hands each step an owned copy and snapshots the result into the
//! checkpoint before the next step runs, so a step can never observe a
//! mutation made by a later one.
//!
//! # Status machine
//!
//! [`Status`] only ever moves forward:
//!
//! ```text
//! pending -> ready_for_review -> { approved | edited | commented | ignored } -> applied
//! ```
//!
//! `commented` and `ignored` are terminal; `approved` and `edited` continue
//! to the commit step, which advances to `applied`.
//!
//! # Examples
//!
//! ```rust
//! use reviewgate::state::{Status, WorkflowState};
//! use serde_json::json;
//!
//! let mut state = WorkflowState::new("A-1", json!({"result": "rejected"}));
//! assert_eq!(state.status, Status::Pending);
//! assert!(!state.applied);
//!
//! state.advance_status(Status::ReadyForReview).unwrap();
//! // Moving backwards is rejected.
//! assert!(state.advance_status(Status::Pending).is_err());
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One proposed mutation of the external record: a field code paired with
/// the value it should take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field_code: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(field_code: impl Into<String>, value: Value) -> Self {
        Self {
            field_code: field_code.into(),
            value,
        }
    }
}

/// Review lifecycle position of a workflow instance.
///
/// Serialized in `snake_case` so persisted checkpoints and payloads read as
/// `"ready_for_review"`, `"applied"`, etc.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created, no proposal drafted yet.
    Pending,
    /// A proposal exists and awaits the human decision.
    ReadyForReview,
    /// The reviewer accepted the drafted updates as-is.
    Approved,
    /// The reviewer replaced the drafted updates with their own.
    Edited,
    /// The reviewer left a comment instead of a decision; nothing is applied.
    Commented,
    /// The reviewer dismissed the proposal; nothing is applied.
    Ignored,
    /// The updates were pushed to the record source.
    Applied,
}

impl Status {
    /// Position along the forward-only lifecycle. Decision outcomes share a
    /// rank: exactly one of them is ever reached, chosen by the reviewer.
    fn rank(self) -> u8 {
        match self {
            Status::Pending => 0,
            Status::ReadyForReview => 1,
            Status::Approved | Status::Edited | Status::Commented | Status::Ignored => 2,
            Status::Applied => 3,
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Transitions must strictly increase the rank; siblings at the decision
    /// rank are mutually exclusive, and terminal statuses advance nowhere.
    #[must_use]
    pub fn can_advance_to(self, next: Status) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Whether no further steps may execute once this status is reached.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Commented | Status::Ignored | Status::Applied)
    }

    /// The persisted `snake_case` form, matching the serde encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::ReadyForReview => "ready_for_review",
            Status::Approved => "approved",
            Status::Edited => "edited",
            Status::Commented => "commented",
            Status::Ignored => "ignored",
            Status::Applied => "applied",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempted status transition that would move the lifecycle backwards or
/// sideways.
#[derive(Debug, Error, Diagnostic)]
#[error("status may not move from {from} to {to}")]
#[diagnostic(
    code(reviewgate::state::status_regression),
    help("Status transitions are forward-only; see the Status lifecycle docs.")
)]
pub struct StatusError {
    pub from: Status,
    pub to: Status,
}

/// All data passed between steps of one workflow instance.
///
/// The engine owns the canonical copy inside the checkpoint; steps receive
/// and return owned values. Fields a step has not been documented to depend
/// on must not be read by it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Immutable instance key, assigned at creation.
    pub instance_id: String,
    /// The preliminary result handed in by the caller. Immutable input.
    pub external_input: Value,
    /// Record fetched from the external source; written once by the first step.
    pub context_record: Option<Value>,
    /// Drafted field updates; may be replaced wholesale by an `edit` decision.
    #[serde(default)]
    pub proposed_updates: Vec<FieldUpdate>,
    /// Human-readable notification accompanying the proposal.
    #[serde(default)]
    pub notify_message: String,
    pub status: Status,
    /// Set when a proposal awaits review, cleared once a decision is folded in.
    #[serde(default)]
    pub needs_review: bool,
    /// Reviewer comment captured by a `comment` decision.
    #[serde(default)]
    pub human_comment: Option<String>,
    /// Whether the updates have been pushed to the record source.
    #[serde(default)]
    pub applied: bool,
}

impl WorkflowState {
    /// Initial state for a fresh instance: `pending`, nothing drafted,
    /// nothing applied.
    pub fn new(instance_id: impl Into<String>, external_input: Value) -> Self {
        Self {
            instance_id: instance_id.into(),
            external_input,
            context_record: None,
            proposed_updates: Vec::new(),
            notify_message: String::new(),
            status: Status::Pending,
            needs_review: false,
            human_comment: None,
            applied: false,
        }
    }

    /// Move the status forward, rejecting regressions.
    pub fn advance_status(&mut self, next: Status) -> Result<(), StatusError> {
        if !self.status.can_advance_to(next) {
            return Err(StatusError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// The response-shaped summary of this instance, for a surrounding
    /// service layer to return to its callers.
    #[must_use]
    pub fn response_view(&self) -> ResponseView {
        ResponseView {
            instance_id: self.instance_id.clone(),
            proposed_updates: self.proposed_updates.clone(),
            notify_message: self.notify_message.clone(),
            status: self.status,
            applied: self.applied,
        }
    }
}

/// Serializable summary of an instance, shaped for API responses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseView {
    pub instance_id: String,
    pub proposed_updates: Vec<FieldUpdate>,
    pub notify_message: String,
    pub status: Status,
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_state_defaults() {
        let state = WorkflowState::new("A-1", json!({"result": "approved"}));
        assert_eq!(state.instance_id, "A-1");
        assert_eq!(state.status, Status::Pending);
        assert!(state.proposed_updates.is_empty());
        assert!(state.context_record.is_none());
        assert!(!state.needs_review);
        assert!(!state.applied);
    }

    #[test]
    fn status_moves_forward_only() {
        let mut state = WorkflowState::new("A-1", Value::Null);
        state.advance_status(Status::ReadyForReview).unwrap();
        state.advance_status(Status::Approved).unwrap();
        state.advance_status(Status::Applied).unwrap();

        let err = state.advance_status(Status::Pending).unwrap_err();
        assert_eq!(err.from, Status::Applied);
        assert_eq!(err.to, Status::Pending);
    }

    #[test]
    fn decision_outcomes_are_mutually_exclusive() {
        assert!(!Status::Approved.can_advance_to(Status::Edited));
        assert!(!Status::Edited.can_advance_to(Status::Ignored));
        assert!(Status::Edited.can_advance_to(Status::Applied));
    }

    #[test]
    fn terminal_statuses_advance_nowhere() {
        assert!(!Status::Ignored.can_advance_to(Status::Applied));
        assert!(!Status::Commented.can_advance_to(Status::Applied));
        assert!(!Status::Applied.can_advance_to(Status::Applied));
    }

    #[test]
    fn terminal_statuses() {
        assert!(Status::Commented.is_terminal());
        assert!(Status::Ignored.is_terminal());
        assert!(Status::Applied.is_terminal());
        assert!(!Status::Approved.is_terminal());
        assert!(!Status::ReadyForReview.is_terminal());
    }

    #[test]
    fn status_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&Status::ReadyForReview).unwrap(),
            "\"ready_for_review\""
        );
        let parsed: Status = serde_json::from_str("\"applied\"").unwrap();
        assert_eq!(parsed, Status::Applied);
    }

    #[test]
    fn response_view_mirrors_state() {
        let mut state = WorkflowState::new("A-9", json!({}));
        state.proposed_updates = vec![FieldUpdate::new("screening_result", json!("approved"))];
        state.notify_message = "Case A-9 screening result: approved.".into();

        let view = state.response_view();
        assert_eq!(view.instance_id, "A-9");
        assert_eq!(view.proposed_updates, state.proposed_updates);
        assert_eq!(view.status, Status::Pending);
        assert!(!view.applied);
    }
}
