#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use reviewgate::collaborators::{
    CollaboratorError, Collaborators, ProposalDrafter, RecordApplier, mocks,
};
use reviewgate::runtimes::Engine;
use reviewgate::state::FieldUpdate;
use reviewgate::steps::standard_chain;

/// Engine over the shipped mocks and an in-memory store.
pub fn mocked_engine() -> Engine {
    let chain = standard_chain(Collaborators::mocked()).unwrap();
    Engine::with_in_memory_store(chain)
}

/// Engine whose applier is replaced, keeping the mock source and drafter.
pub fn engine_with_applier(applier: Arc<dyn RecordApplier>) -> Engine {
    let collaborators = Collaborators::new(
        Arc::new(mocks::MockRecordSource::new()),
        Arc::new(mocks::TemplateDrafter::new()),
        applier,
    );
    Engine::with_in_memory_store(standard_chain(collaborators).unwrap())
}

/// Engine whose drafter is replaced, keeping the mock source and applier.
pub fn engine_with_drafter(drafter: Arc<dyn ProposalDrafter>) -> Engine {
    let collaborators = Collaborators::new(
        Arc::new(mocks::MockRecordSource::new()),
        drafter,
        Arc::new(mocks::MockRecordApplier::new()),
    );
    Engine::with_in_memory_store(standard_chain(collaborators).unwrap())
}

/// Applier that records every successful call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingApplier {
    calls: Mutex<Vec<(String, Vec<FieldUpdate>)>>,
}

impl RecordingApplier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<(String, Vec<FieldUpdate>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RecordApplier for RecordingApplier {
    async fn apply_updates(
        &self,
        instance_id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), CollaboratorError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((instance_id.to_string(), updates.to_vec()));
        Ok(())
    }
}

/// Applier that always reports failure.
#[derive(Debug, Default)]
pub struct FailingApplier;

#[async_trait]
impl RecordApplier for FailingApplier {
    async fn apply_updates(
        &self,
        _instance_id: &str,
        _updates: &[FieldUpdate],
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Failed {
            detail: "record system rejected the update batch".into(),
        })
    }
}

/// Drafter that replies with a fixed string, whatever the inputs.
#[derive(Debug)]
pub struct StaticDrafter {
    pub reply: String,
}

impl StaticDrafter {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
        })
    }
}

#[async_trait]
impl ProposalDrafter for StaticDrafter {
    async fn draft(
        &self,
        _instructions: &str,
        _record: &Value,
        _external_input: &Value,
    ) -> Result<String, CollaboratorError> {
        Ok(self.reply.clone())
    }
}

/// Drafter whose call itself fails.
#[derive(Debug, Default)]
pub struct FailingDrafter;

#[async_trait]
impl ProposalDrafter for FailingDrafter {
    async fn draft(
        &self,
        _instructions: &str,
        _record: &Value,
        _external_input: &Value,
    ) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable {
            detail: "drafting endpoint timed out".into(),
        })
    }
}
