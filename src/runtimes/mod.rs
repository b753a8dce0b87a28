//! Runtime infrastructure: the engine, checkpoint storage, persistence
//! models, and configuration.
//!
//! The runtime layer is built around a few abstractions:
//!
//! - [`Engine`] — sequences chain steps, persists checkpoints, and folds
//!   external decisions back into suspended instances.
//! - [`CheckpointStore`] — trait seam for pluggable persistence, with
//!   [`InMemoryCheckpointStore`] as the shipped backend.
//! - Persistence models — serde-friendly document shapes for durable
//!   backends (see [`persistence`]).
//!
//! # Usage
//!
//! ```rust,no_run
//! use reviewgate::collaborators::Collaborators;
//! use reviewgate::review::Decision;
//! use reviewgate::runtimes::{Engine, RunOutcome};
//! use reviewgate::steps::standard_chain;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let chain = standard_chain(Collaborators::mocked())?;
//! let engine = Engine::with_in_memory_store(chain);
//!
//! // Runs until the review gate suspends and hands back the proposal.
//! let outcome = engine.start("A-1", json!({"result": "rejected"})).await?;
//! assert!(outcome.is_suspended());
//!
//! // Days later, in a different process: accept and drain the chain.
//! let outcome = engine.resume("A-1", Decision::accept()).await?;
//! assert!(matches!(outcome, RunOutcome::Completed(_)));
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
pub mod engine;
pub mod persistence;
pub mod runtime_config;

pub use checkpointer::{
    Checkpoint, CheckpointStore, InMemoryCheckpointStore, InstancePhase, PendingSuspension,
    StepFailure, StoreError,
};
pub use engine::{Engine, RunOutcome, StartOptions};
pub use persistence::{
    CHECKPOINT_SCHEMA_VERSION, PersistedCheckpoint, PersistedFailure, PersistedState,
    PersistedSuspension, PersistenceError,
};
pub use runtime_config::{RuntimeConfig, StoreKind};
