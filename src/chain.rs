//! Chain construction: the ordered registry of steps an engine executes.
//!
//! Steps form a fixed, statically known linear order. The chain is the unit
//! the engine is compiled against; checkpoints index into it by position, so
//! a chain must not be reordered while instances of it are live.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::step::Step;

/// A named step at a fixed position in a chain.
#[derive(Clone)]
pub struct ChainStep {
    pub name: String,
    pub step: Arc<dyn Step>,
}

/// An immutable, validated sequence of steps.
///
/// Built with [`ChainBuilder`]; positions are stable for the lifetime of the
/// chain and are what checkpoints record as `next_step_index`.
#[derive(Clone)]
pub struct Chain {
    steps: Vec<ChainStep>,
}

impl Chain {
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step registered at `index`, if the chain extends that far.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChainStep> {
        self.steps.get(index)
    }

    /// Name of the step at `index`.
    #[must_use]
    pub fn step_name(&self, index: usize) -> Option<&str> {
        self.steps.get(index).map(|s| s.name.as_str())
    }

    /// Registered step names, in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Chain validation failures, reported at build time.
#[derive(Debug, Error, Diagnostic)]
pub enum ChainError {
    #[error("chain has no steps")]
    #[diagnostic(
        code(reviewgate::chain::empty),
        help("Register at least one step before building the chain.")
    )]
    Empty,

    #[error("duplicate step name: {name}")]
    #[diagnostic(
        code(reviewgate::chain::duplicate_step),
        help("Step names must be unique within a chain.")
    )]
    DuplicateStep { name: String },
}

/// Fluent builder for [`Chain`].
///
/// ```rust
/// use reviewgate::chain::ChainBuilder;
/// use reviewgate::steps::ReviewGate;
///
/// let chain = ChainBuilder::new()
///     .add_step("review_gate", ReviewGate::new())
///     .build()
///     .unwrap();
/// assert_eq!(chain.len(), 1);
/// ```
#[derive(Default)]
pub struct ChainBuilder {
    steps: Vec<ChainStep>,
}

impl ChainBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step under a unique name. Order of calls is execution order.
    #[must_use]
    pub fn add_step(mut self, name: impl Into<String>, step: impl Step + 'static) -> Self {
        self.steps.push(ChainStep {
            name: name.into(),
            step: Arc::new(step),
        });
        self
    }

    /// Validate and freeze the chain.
    pub fn build(self) -> Result<Chain, ChainError> {
        if self.steps.is_empty() {
            return Err(ChainError::Empty);
        }
        for (i, step) in self.steps.iter().enumerate() {
            if self.steps[..i].iter().any(|prior| prior.name == step.name) {
                return Err(ChainError::DuplicateStep {
                    name: step.name.clone(),
                });
            }
        }
        Ok(Chain { steps: self.steps })
    }
}
