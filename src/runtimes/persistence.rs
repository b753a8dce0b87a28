/*!
Persistence models for externalizing checkpoints to a durable backend.

Design goals:
- Explicit serde-friendly structs decoupled from the in-memory types, so a
  storage backend's row format never leaks into engine code.
- Conversion logic localized in `From` / `TryFrom` impls.
- Forward compatibility: every optional field defaults on read, so a
  checkpoint written by an older build round-trips through a newer one.

This module performs no I/O; it is pure data transformation and
(de)serialization glue. The in-memory store does not use it — it exists for
the durable backends the [`CheckpointStore`](super::CheckpointStore) seam
anticipates, and its shape is part of the crate's public contract.
*/

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::review::SuspensionPayload;
use crate::state::{FieldUpdate, Status, WorkflowState};

use super::checkpointer::{Checkpoint, PendingSuspension, StepFailure};

/// Version stamped on every persisted checkpoint document.
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

fn checkpoint_schema_version() -> u32 {
    CHECKPOINT_SCHEMA_VERSION
}

/// Serialization/conversion failures for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("unsupported checkpoint schema version {got} (supported: {CHECKPOINT_SCHEMA_VERSION})")]
    #[diagnostic(code(reviewgate::persistence::unsupported_schema))]
    UnsupportedSchema { got: u32 },

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(reviewgate::persistence::serde),
        help("Ensure the document matches the Persisted* shapes.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    #[error("timestamp field {field} is not RFC 3339: {value}")]
    #[diagnostic(code(reviewgate::persistence::timestamp))]
    Timestamp { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Persisted shape of [`WorkflowState`]. Every non-identity field defaults
/// on read so old documents tolerate new fields and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub instance_id: String,
    #[serde(default)]
    pub external_input: Value,
    #[serde(default)]
    pub context_record: Option<Value>,
    #[serde(default)]
    pub proposed_updates: Vec<FieldUpdate>,
    #[serde(default)]
    pub notify_message: String,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default)]
    pub human_comment: Option<String>,
    #[serde(default)]
    pub applied: bool,
}

fn default_status() -> Status {
    Status::Pending
}

/// Persisted shape of [`PendingSuspension`]. The embedded payload is
/// already a versioned wire type and serializes as itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSuspension {
    pub step_index: usize,
    pub payload: SuspensionPayload,
}

/// Persisted shape of [`StepFailure`], with the timestamp as RFC 3339 text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedFailure {
    pub when: String,
    pub step_index: usize,
    pub step_name: String,
    pub detail: String,
}

/// Full persisted checkpoint document: one record per instance id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    #[serde(default = "checkpoint_schema_version")]
    pub schema_version: u32,
    pub instance_id: String,
    pub version: u64,
    pub next_step_index: usize,
    pub state: PersistedState,
    #[serde(default)]
    pub pending_suspension: Option<PersistedSuspension>,
    #[serde(default)]
    pub last_failure: Option<PersistedFailure>,
    /// RFC 3339 creation time (keeps `chrono` types out of the document).
    pub created_at: String,
    pub updated_at: String,
}

impl PersistedCheckpoint {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| PersistenceError::Serde { source })
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
    }
}

/* ---------- WorkflowState <-> PersistedState ---------- */

impl From<&WorkflowState> for PersistedState {
    fn from(s: &WorkflowState) -> Self {
        PersistedState {
            instance_id: s.instance_id.clone(),
            external_input: s.external_input.clone(),
            context_record: s.context_record.clone(),
            proposed_updates: s.proposed_updates.clone(),
            notify_message: s.notify_message.clone(),
            status: s.status,
            needs_review: s.needs_review,
            human_comment: s.human_comment.clone(),
            applied: s.applied,
        }
    }
}

impl From<PersistedState> for WorkflowState {
    fn from(p: PersistedState) -> Self {
        WorkflowState {
            instance_id: p.instance_id,
            external_input: p.external_input,
            context_record: p.context_record,
            proposed_updates: p.proposed_updates,
            notify_message: p.notify_message,
            status: p.status,
            needs_review: p.needs_review,
            human_comment: p.human_comment,
            applied: p.applied,
        }
    }
}

/* ---------- Checkpoint <-> PersistedCheckpoint ---------- */

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        PersistedCheckpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            instance_id: cp.instance_id.clone(),
            version: cp.version,
            next_step_index: cp.next_step_index,
            state: PersistedState::from(&cp.state),
            pending_suspension: cp.pending_suspension.as_ref().map(|p| PersistedSuspension {
                step_index: p.step_index,
                payload: p.payload.clone(),
            }),
            last_failure: cp.last_failure.as_ref().map(|f| PersistedFailure {
                when: f.when.to_rfc3339(),
                step_index: f.step_index,
                step_name: f.step_name.clone(),
                detail: f.detail.clone(),
            }),
            created_at: cp.created_at.to_rfc3339(),
            updated_at: cp.updated_at.to_rfc3339(),
        }
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PersistenceError::Timestamp {
            field,
            value: value.to_string(),
        })
}

impl TryFrom<PersistedCheckpoint> for Checkpoint {
    type Error = PersistenceError;

    fn try_from(p: PersistedCheckpoint) -> Result<Self> {
        if p.schema_version != CHECKPOINT_SCHEMA_VERSION {
            return Err(PersistenceError::UnsupportedSchema {
                got: p.schema_version,
            });
        }
        let created_at = parse_timestamp("created_at", &p.created_at)?;
        let updated_at = parse_timestamp("updated_at", &p.updated_at)?;
        let last_failure = p
            .last_failure
            .map(|f| {
                Ok::<_, PersistenceError>(StepFailure {
                    when: parse_timestamp("last_failure.when", &f.when)?,
                    step_index: f.step_index,
                    step_name: f.step_name,
                    detail: f.detail,
                })
            })
            .transpose()?;
        Ok(Checkpoint {
            instance_id: p.instance_id,
            version: p.version,
            next_step_index: p.next_step_index,
            state: WorkflowState::from(p.state),
            pending_suspension: p.pending_suspension.map(|s| PendingSuspension {
                step_index: s.step_index,
                payload: s.payload,
            }),
            last_failure,
            created_at,
            updated_at,
        })
    }
}
