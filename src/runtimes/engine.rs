//! The workflow engine: sequences steps, persists checkpoints, detects and
//! propagates suspension, and folds external decisions back in.
//!
//! # Execution model
//!
//! There is no long-lived task per instance. Each [`start`](Engine::start)
//! or [`resume`](Engine::resume) call is a bounded, synchronous run of
//! steps that ends by returning to the caller — on suspension, completion,
//! or failure. Suspension is materialized as persisted state plus a
//! returned payload, never as a blocked future, because the external wait
//! is unbounded and must survive process restarts.
//!
//! # Instance state machine
//!
//! Derived from the checkpoint (`status` plus `pending_suspension`):
//!
//! ```text
//! running(i)   --Continue-->  running(i+1)        checkpoint saved
//! running(i)   --Suspend--->  suspended(i)        payload returned to caller
//! running(i)   --Fail------>  error returned      checkpoint keeps last good state
//! suspended(i) --resume---->  running(i+1)        accept / edit
//! suspended(i) --resume---->  terminal            ignore / comment
//! running(len) ------------>  terminal            chain exhausted
//! ```
//!
//! # Serialization of concurrent calls
//!
//! Every save is a compare-and-swap on the checkpoint version. Two racing
//! `resume` calls both load the same version; exactly one save wins and
//! the loser surfaces [`EngineError::ConcurrentModification`] with the
//! checkpoint untouched by it. Calls on distinct instances never contend.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use crate::chain::Chain;
use crate::errors::EngineError;
use crate::review::{Decision, DecisionEffect, SuspensionPayload, apply_decision};
use crate::state::WorkflowState;
use crate::step::{StepContext, StepOutcome};

use super::checkpointer::{
    Checkpoint, CheckpointStore, InMemoryCheckpointStore, PendingSuspension, StepFailure,
    StoreError,
};
use super::runtime_config::{RuntimeConfig, StoreKind};

/// Options for [`Engine::start_with`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StartOptions {
    /// Discard an existing checkpoint and run the chain from scratch
    /// instead of failing with `InstanceAlreadyExists`.
    pub restart: bool,
}

/// How a `start`/`resume` call ended.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    /// A step yielded; the payload is waiting on an external decision.
    Suspended(SuspensionPayload),
    /// A decision ended the run before the chain finished (ignore/comment).
    Halted(WorkflowState),
    /// The chain ran to exhaustion.
    Completed(WorkflowState),
}

impl RunOutcome {
    /// Final state, when the run produced one (not suspended).
    #[must_use]
    pub fn state(&self) -> Option<&WorkflowState> {
        match self {
            RunOutcome::Suspended(_) => None,
            RunOutcome::Halted(state) | RunOutcome::Completed(state) => Some(state),
        }
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        matches!(self, RunOutcome::Suspended(_))
    }
}

/// Executes workflow chains over a checkpoint store.
///
/// Cheap to clone; clones share the chain and the store.
#[derive(Clone)]
pub struct Engine {
    chain: Arc<Chain>,
    store: Arc<dyn CheckpointStore>,
}

impl Engine {
    pub fn new(chain: Chain, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            chain: Arc::new(chain),
            store,
        }
    }

    /// Engine over a fresh [`InMemoryCheckpointStore`].
    #[must_use]
    pub fn with_in_memory_store(chain: Chain) -> Self {
        Self::new(chain, Arc::new(InMemoryCheckpointStore::new()))
    }

    /// Engine with the store selected by `config`.
    #[must_use]
    pub fn from_config(chain: Chain, config: &RuntimeConfig) -> Self {
        match config.store {
            StoreKind::InMemory => Self::with_in_memory_store(chain),
        }
    }

    /// Create an instance and run its chain until it suspends, completes,
    /// or fails.
    ///
    /// Fails with [`EngineError::InstanceAlreadyExists`] if a checkpoint
    /// already exists for `instance_id`; see [`start_with`](Self::start_with)
    /// to restart explicitly.
    #[instrument(skip(self, external_input), err)]
    pub async fn start(
        &self,
        instance_id: &str,
        external_input: Value,
    ) -> Result<RunOutcome, EngineError> {
        self.start_with(instance_id, external_input, StartOptions::default())
            .await
    }

    /// [`start`](Self::start) with explicit options.
    #[instrument(skip(self, external_input), err)]
    pub async fn start_with(
        &self,
        instance_id: &str,
        external_input: Value,
        options: StartOptions,
    ) -> Result<RunOutcome, EngineError> {
        if self.load(instance_id).await?.is_some() {
            if !options.restart {
                return Err(EngineError::InstanceAlreadyExists {
                    instance_id: instance_id.to_string(),
                });
            }
            tracing::info!(instance = %instance_id, "restart requested, discarding checkpoint");
            self.store
                .delete(instance_id)
                .await
                .map_err(|err| self.internal(instance_id, err))?;
        }

        let state = WorkflowState::new(instance_id, external_input);
        let mut checkpoint = Checkpoint::new(instance_id, state);
        // Persist position zero first: the checkpoint exists from the
        // instant the instance does.
        self.persist(&mut checkpoint).await?;
        tracing::info!(instance = %instance_id, "instance created");
        self.advance(checkpoint).await
    }

    /// Fold an external decision into a suspended instance and continue
    /// from the step after the one that suspended.
    ///
    /// An invalid decision leaves the checkpoint byte-for-byte unchanged,
    /// so the call is safe to retry with corrected input.
    #[instrument(skip(self, decision), err)]
    pub async fn resume(
        &self,
        instance_id: &str,
        decision: Decision,
    ) -> Result<RunOutcome, EngineError> {
        let Some(mut checkpoint) = self.load(instance_id).await? else {
            return Err(EngineError::UnknownInstance {
                instance_id: instance_id.to_string(),
            });
        };
        let Some(pending) = checkpoint.pending_suspension.take() else {
            return Err(EngineError::NotSuspended {
                instance_id: instance_id.to_string(),
            });
        };

        let effect = apply_decision(&checkpoint.state, &pending.payload.capabilities, &decision)
            .map_err(|source| EngineError::InvalidDecision {
                instance_id: instance_id.to_string(),
                source,
            })?;

        match effect {
            DecisionEffect::Halt(state) => {
                tracing::info!(
                    instance = %instance_id,
                    status = %state.status,
                    "decision ended the run"
                );
                checkpoint.state = state.clone();
                self.persist(&mut checkpoint).await?;
                Ok(RunOutcome::Halted(state))
            }
            DecisionEffect::Continue(state) => {
                checkpoint.state = state;
                checkpoint.next_step_index = pending.step_index + 1;
                // This save is the exactly-once gate: of two racing
                // resumes, only the one that lands it keeps running.
                self.persist(&mut checkpoint).await?;
                self.advance(checkpoint).await
            }
        }
    }

    /// Read-only snapshot of an instance's checkpoint.
    pub async fn inspect(&self, instance_id: &str) -> Result<Checkpoint, EngineError> {
        self.load(instance_id)
            .await?
            .ok_or_else(|| EngineError::UnknownInstance {
                instance_id: instance_id.to_string(),
            })
    }

    /// Ids of all instances with a live checkpoint.
    pub async fn list_instances(&self) -> Result<Vec<String>, EngineError> {
        self.store
            .list_instances()
            .await
            .map_err(|err| self.internal("", err))
    }

    /// Number of steps in the chain this engine executes.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Run steps from the checkpoint's position until suspension,
    /// exhaustion, or failure, persisting after every step.
    async fn advance(&self, mut checkpoint: Checkpoint) -> Result<RunOutcome, EngineError> {
        loop {
            let index = checkpoint.next_step_index;
            let Some(entry) = self.chain.get(index) else {
                if index > self.chain.len() {
                    // A checkpoint pointing past the chain end is storage
                    // corruption, not a completed run.
                    return Err(EngineError::Internal {
                        instance_id: checkpoint.instance_id,
                        detail: format!(
                            "checkpoint step index {index} exceeds chain length {}",
                            self.chain.len()
                        ),
                    });
                }
                tracing::info!(instance = %checkpoint.instance_id, "chain exhausted");
                return Ok(RunOutcome::Completed(checkpoint.state));
            };

            let ctx = StepContext {
                instance_id: checkpoint.instance_id.clone(),
                step_index: index,
                step_name: entry.name.clone(),
            };
            tracing::debug!(
                instance = %checkpoint.instance_id,
                step = %entry.name,
                index,
                "running step"
            );

            match entry.step.run(checkpoint.state.clone(), ctx).await {
                Ok(StepOutcome::Continue(state)) => {
                    checkpoint.state = state;
                    checkpoint.next_step_index = index + 1;
                    self.persist(&mut checkpoint).await?;
                }
                Ok(StepOutcome::Suspend(state, payload)) => {
                    checkpoint.state = state;
                    checkpoint.pending_suspension = Some(PendingSuspension {
                        step_index: index,
                        payload: payload.clone(),
                    });
                    self.persist(&mut checkpoint).await?;
                    return Ok(RunOutcome::Suspended(payload));
                }
                Err(err) => {
                    // Keep the last good state; record the failure beside it.
                    checkpoint.last_failure = Some(StepFailure {
                        when: Utc::now(),
                        step_index: index,
                        step_name: entry.name.clone(),
                        detail: err.to_string(),
                    });
                    let instance_id = checkpoint.instance_id.clone();
                    if let Err(save_err) = self.persist(&mut checkpoint).await {
                        tracing::warn!(
                            instance = %instance_id,
                            error = %save_err,
                            "failed to record step failure on checkpoint"
                        );
                    }
                    tracing::warn!(
                        instance = %instance_id,
                        step = %entry.name,
                        error = %err,
                        "step failed"
                    );
                    return Err(EngineError::from_step(&instance_id, err));
                }
            }
        }
    }

    async fn load(&self, instance_id: &str) -> Result<Option<Checkpoint>, EngineError> {
        self.store
            .load(instance_id)
            .await
            .map_err(|err| self.internal(instance_id, err))
    }

    /// Bump the version and save, mapping a CAS loss to
    /// `ConcurrentModification`.
    async fn persist(&self, checkpoint: &mut Checkpoint) -> Result<(), EngineError> {
        checkpoint.version += 1;
        checkpoint.updated_at = Utc::now();
        self.store
            .save(checkpoint.clone())
            .await
            .map_err(|err| match err {
                StoreError::VersionConflict { .. } => EngineError::ConcurrentModification {
                    instance_id: checkpoint.instance_id.clone(),
                },
                other => self.internal(&checkpoint.instance_id, other),
            })
    }

    fn internal(&self, instance_id: &str, err: StoreError) -> EngineError {
        EngineError::Internal {
            instance_id: instance_id.to_string(),
            detail: err.to_string(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}
