use reviewgate::errors::{EngineError, ErrorClass};
use reviewgate::review::Decision;
use reviewgate::runtimes::{RunOutcome, StartOptions};
use reviewgate::state::Status;
use reviewgate::steps::{COMMIT, DRAFT_UPDATES};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::*;

#[tokio::test]
async fn malformed_draft_output_fails_and_stays_restartable() {
    let engine = engine_with_drafter(StaticDrafter::new("so sorry, prose only"));

    let err = engine
        .start("A-1", json!({"result": "ok"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DraftMalformed { .. }));
    assert_eq!(err.class(), ErrorClass::Collaborator);

    // Checkpoint keeps the last good state: context fetched, nothing drafted.
    let checkpoint = engine.inspect("A-1").await.unwrap();
    assert_eq!(checkpoint.state.status, Status::Pending);
    assert!(checkpoint.state.context_record.is_some());
    assert!(checkpoint.state.proposed_updates.is_empty());
    let failure = checkpoint.last_failure.expect("failure recorded");
    assert_eq!(failure.step_name, DRAFT_UPDATES);

    // Drafting is idempotent, so the instance can be restarted from scratch.
    let err = engine
        .start_with("A-1", json!({"result": "ok"}), StartOptions { restart: true })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DraftMalformed { .. }));
}

#[tokio::test]
async fn restart_with_a_fixed_drafter_recovers() {
    let bad = engine_with_drafter(StaticDrafter::new("{broken"));
    let err = bad.start("A-2", json!({"result": "ok"})).await.unwrap_err();
    assert!(matches!(err, EngineError::DraftMalformed { .. }));

    // A separate deployment with a working drafter runs the same id clean.
    let good = mocked_engine();
    let outcome = good.start("A-2", json!({"result": "ok"})).await.unwrap();
    assert!(outcome.is_suspended());
}

#[tokio::test]
async fn draft_call_failure_is_unavailability() {
    let engine = engine_with_drafter(Arc::new(FailingDrafter));
    let err = engine
        .start("A-3", json!({"result": "ok"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DraftUnavailable { .. }));
    assert_eq!(err.class(), ErrorClass::Collaborator);
}

#[tokio::test]
async fn draft_missing_message_field_is_malformed() {
    let engine = engine_with_drafter(StaticDrafter::new(
        r#"{"updates": [{"field_code": "x", "value": 1}]}"#,
    ));
    let err = engine
        .start("A-4", json!({"result": "ok"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DraftMalformed { .. }));
}

#[tokio::test]
async fn commit_failure_keeps_the_approved_state() {
    let engine = engine_with_applier(Arc::new(FailingApplier));
    engine.start("A-5", json!({"result": "ok"})).await.unwrap();

    let err = engine
        .resume("A-5", Decision::accept())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CommitFailed { .. }));
    assert_eq!(err.class(), ErrorClass::Collaborator);

    // The decision survived; nothing was applied; the failure is on record.
    let checkpoint = engine.inspect("A-5").await.unwrap();
    assert_eq!(checkpoint.state.status, Status::Approved);
    assert!(!checkpoint.state.applied);
    assert!(checkpoint.pending_suspension.is_none());
    let failure = checkpoint.last_failure.expect("failure recorded");
    assert_eq!(failure.step_name, COMMIT);
}

#[tokio::test]
async fn full_run_produces_a_response_view() {
    let engine = mocked_engine();
    engine
        .start("A-6", json!({"result": "approved"}))
        .await
        .unwrap();
    let outcome = engine.resume("A-6", Decision::accept()).await.unwrap();

    let RunOutcome::Completed(state) = outcome else {
        panic!("expected completion");
    };
    let view = state.response_view();
    assert_eq!(view.instance_id, "A-6");
    assert_eq!(view.status, Status::Applied);
    assert!(view.applied);
    assert!(view.notify_message.contains("A-6"));

    let encoded = serde_json::to_value(&view).unwrap();
    assert_eq!(encoded["status"], json!("applied"));
    assert_eq!(encoded["applied"], json!(true));
}
