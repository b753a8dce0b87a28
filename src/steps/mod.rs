//! Step implementations for the review-gated record-update workflow.
//!
//! The fixed chain, in order:
//!
//! 1. [`FetchContext`] — fetch the current record.
//! 2. [`DraftUpdates`] — draft field updates plus a notification message.
//! 3. [`ReviewGate`] — suspend and hand the proposal to the reviewer.
//! 4. [`Commit`] — push the accepted (or edited) updates.
//!
//! The decision adapter that runs between 3 and 4 is not a chain step; it
//! is invoked by the engine on resume (see [`crate::review`]).

mod commit;
mod draft_updates;
mod fetch_context;
mod review_gate;

pub use commit::Commit;
pub use draft_updates::{DRAFT_INSTRUCTIONS, DraftUpdates};
pub use fetch_context::FetchContext;
pub use review_gate::ReviewGate;

use crate::chain::{Chain, ChainBuilder, ChainError};
use crate::collaborators::Collaborators;

/// Step names of the standard chain, in execution order.
pub const FETCH_CONTEXT: &str = "fetch_context";
pub const DRAFT_UPDATES: &str = "draft_updates";
pub const REVIEW_GATE: &str = "review_gate";
pub const COMMIT: &str = "commit";

/// Wire the standard four-step chain against the given collaborators.
pub fn standard_chain(collaborators: Collaborators) -> Result<Chain, ChainError> {
    ChainBuilder::new()
        .add_step(FETCH_CONTEXT, FetchContext::new(collaborators.source))
        .add_step(DRAFT_UPDATES, DraftUpdates::new(collaborators.drafter))
        .add_step(REVIEW_GATE, ReviewGate::new())
        .add_step(COMMIT, Commit::new(collaborators.applier))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_chain_has_the_documented_order() {
        let chain = standard_chain(Collaborators::mocked()).unwrap();
        assert_eq!(
            chain.step_names(),
            vec![FETCH_CONTEXT, DRAFT_UPDATES, REVIEW_GATE, COMMIT]
        );
    }
}
