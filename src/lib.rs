//! # Reviewgate: review-gated record-update workflows
//!
//! Reviewgate runs a typed chain of steps over durable, versioned state,
//! where one step can suspend execution indefinitely, hand a payload to an
//! external human reviewer, and later resume from exactly that point with
//! the reviewer's decision folded in.
//!
//! The suspend boundary may last seconds or weeks: suspension is persisted
//! state plus a returned payload, never a blocked task, so instances
//! survive process restarts and scale without held threads.
//!
//! ## Core concepts
//!
//! - **State** — [`state::WorkflowState`], plain serializable data with
//!   value semantics, snapshotted into the checkpoint after every step.
//! - **Steps** — [`step::Step`] implementations in a fixed chain
//!   ([`chain::Chain`]); each continues, suspends, or fails.
//! - **Checkpoints** — [`runtimes::Checkpoint`], the sole durable record of
//!   an instance's position, written with optimistic versioning.
//! - **Decisions** — the four-kind review protocol
//!   (`accept | edit | comment | ignore`) in [`review`].
//!
//! ## Quick start
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
//! match engine.start("A-1", json!({"result": "rejected"})).await? {
//!     RunOutcome::Suspended(payload) => {
//!         // Hand `payload` to the reviewer; nothing blocks meanwhile.
//!         println!("{}", payload.notify_message);
//!     }
//!     other => unreachable!("the review gate always suspends: {other:?}"),
//! }
//!
//! // A separate call — possibly days later — resumes the instance.
//! let outcome = engine.resume("A-1", Decision::accept()).await?;
//! assert!(outcome.state().is_some_and(|s| s.applied));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module guide
//!
//! - [`state`] — workflow state, field updates, the status machine
//! - [`step`] — the `Step` trait and outcomes
//! - [`chain`] — chain construction and validation
//! - [`review`] — suspension payloads, decisions, the decision adapter
//! - [`steps`] — the four concrete steps and [`steps::standard_chain`]
//! - [`collaborators`] — external collaborator traits and their mocks
//! - [`runtimes`] — engine, checkpoint store, persistence models, config
//! - [`errors`] — the public error taxonomy
//! - [`telemetry`] — tracing subscriber setup

pub mod chain;
pub mod collaborators;
pub mod errors;
pub mod review;
pub mod runtimes;
pub mod state;
pub mod step;
pub mod steps;
pub mod telemetry;

pub use chain::{Chain, ChainBuilder};
pub use errors::{EngineError, ErrorClass};
pub use review::{Decision, DecisionKind, SuspensionPayload};
pub use runtimes::{Engine, RunOutcome, StartOptions};
pub use state::{FieldUpdate, Status, WorkflowState};
