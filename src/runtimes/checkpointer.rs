//! Checkpoints and the pluggable store that holds them.
//!
//! A [`Checkpoint`] is the sole durable representation of an instance's
//! progress: its position in the chain, the state snapshot taken after the
//! last completed step, and — while suspended — the payload waiting on the
//! external actor. Exactly one checkpoint exists per live instance.
//!
//! The store contract is optimistic: every save carries a version that must
//! be exactly one past the stored version. A stale writer gets
//! [`StoreError::VersionConflict`] instead of silently clobbering a
//! concurrent transition, which is what serializes racing `resume` calls
//! without a per-instance lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::review::SuspensionPayload;
use crate::state::WorkflowState;

/// A suspension recorded in the checkpoint: which step yielded, and the
/// payload handed to the external actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingSuspension {
    pub step_index: usize,
    pub payload: SuspensionPayload,
}

/// Diagnostic record of the most recent step failure, kept alongside the
/// last good state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub when: DateTime<Utc>,
    pub step_index: usize,
    pub step_name: String,
    pub detail: String,
}

/// Durable record of one instance's execution position and state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub instance_id: String,
    /// Monotonically increasing; bumped by the engine before every save.
    pub version: u64,
    /// Index of the next step to execute. Equal to the chain length once
    /// the chain is exhausted.
    pub next_step_index: usize,
    pub state: WorkflowState,
    /// Set while the instance waits on an external decision.
    pub pending_suspension: Option<PendingSuspension>,
    /// Most recent step failure, if any. The state above it is the last
    /// good snapshot, not the failed one.
    pub last_failure: Option<StepFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Fresh checkpoint at position zero. `version` starts at 0; the first
    /// save bumps it to 1.
    pub fn new(instance_id: impl Into<String>, state: WorkflowState) -> Self {
        let now = Utc::now();
        Self {
            instance_id: instance_id.into(),
            version: 0,
            next_step_index: 0,
            state,
            pending_suspension: None,
            last_failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The instance's derived execution phase, given the chain length it
    /// runs against.
    #[must_use]
    pub fn phase(&self, chain_len: usize) -> InstancePhase {
        if let Some(pending) = &self.pending_suspension {
            return InstancePhase::Suspended {
                step_index: pending.step_index,
            };
        }
        if self.state.status.is_terminal() || self.next_step_index >= chain_len {
            return InstancePhase::Terminal;
        }
        InstancePhase::Running {
            next_step_index: self.next_step_index,
        }
    }
}

/// Execution phase derived from a checkpoint; see §4.3 of the state machine
/// described in the engine docs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstancePhase {
    Running { next_step_index: usize },
    Suspended { step_index: usize },
    Terminal,
}

/// Failures of the checkpoint store itself.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The supplied version does not follow the stored one; another writer
    /// got there first.
    #[error(
        "checkpoint version conflict for instance {instance_id}: store accepts {expected}, got {got}"
    )]
    #[diagnostic(
        code(reviewgate::store::version_conflict),
        help("Reload the checkpoint and re-derive the transition before retrying.")
    )]
    VersionConflict {
        instance_id: String,
        expected: u64,
        got: u64,
    },

    /// Backend failure of a durable implementation (connection loss,
    /// corrupt row, ...). The in-memory store uses it only for poisoned
    /// lock recovery edge cases.
    #[error("checkpoint store backend error: {detail}")]
    #[diagnostic(code(reviewgate::store::backend))]
    Backend { detail: String },
}

/// Keyed, atomically written storage of checkpoints.
///
/// Implementations must make each `save` atomic per key — a reader never
/// observes a partially written checkpoint — and must serve distinct keys
/// concurrently. This repository ships only [`InMemoryCheckpointStore`];
/// the trait is the seam where a durable backend plugs in.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, instance_id: &str) -> Result<Option<Checkpoint>, StoreError>;

    /// Persist `checkpoint` if its version is exactly one past the stored
    /// version (or 1 when no checkpoint exists for the key).
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), StoreError>;

    /// Remove an instance's checkpoint. Deleting an absent key is not an
    /// error.
    async fn delete(&self, instance_id: &str) -> Result<(), StoreError>;

    /// Ids of all instances with a live checkpoint.
    async fn list_instances(&self) -> Result<Vec<String>, StoreError>;
}

/// Volatile store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    inner: Mutex<FxHashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, Checkpoint>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, instance_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.guard().get(instance_id).cloned())
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        let mut map = self.guard();
        let expected = map
            .get(&checkpoint.instance_id)
            .map(|existing| existing.version + 1)
            .unwrap_or(1);
        if checkpoint.version != expected {
            return Err(StoreError::VersionConflict {
                instance_id: checkpoint.instance_id.clone(),
                expected,
                got: checkpoint.version,
            });
        }
        map.insert(checkpoint.instance_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, instance_id: &str) -> Result<(), StoreError> {
        self.guard().remove(instance_id);
        Ok(())
    }

    async fn list_instances(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.guard().keys().cloned().collect())
    }
}
