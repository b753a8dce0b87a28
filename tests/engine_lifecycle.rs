use reviewgate::errors::{EngineError, ErrorClass};
use reviewgate::review::Decision;
use reviewgate::runtimes::{InstancePhase, RunOutcome, StartOptions};
use reviewgate::state::Status;
use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn start_suspends_at_the_review_gate() {
    let engine = mocked_engine();

    let outcome = engine
        .start("A-1", json!({"result": "rejected"}))
        .await
        .unwrap();

    let RunOutcome::Suspended(payload) = outcome else {
        panic!("expected suspension, got {outcome:?}");
    };
    assert_eq!(payload.instance_id, "A-1");
    assert!(payload.notify_message.contains("A-1"));
    assert!(payload.notify_message.contains("rejected"));
    assert!(!payload.proposed_updates.is_empty());
    assert!(payload.capabilities.accept);
    assert!(payload.capabilities.edit);
    assert!(payload.capabilities.comment);
    assert!(payload.capabilities.ignore);

    let checkpoint = engine.inspect("A-1").await.unwrap();
    assert_eq!(checkpoint.state.status, Status::ReadyForReview);
    assert!(checkpoint.state.needs_review);
    assert!(!checkpoint.state.applied);
    assert_eq!(
        checkpoint.phase(engine.chain_len()),
        InstancePhase::Suspended { step_index: 2 }
    );
}

#[tokio::test]
async fn accept_drains_the_chain_to_applied() {
    let applier = RecordingApplier::new();
    let engine = engine_with_applier(applier.clone());

    let started = engine
        .start("A-2", json!({"result": "approved"}))
        .await
        .unwrap();
    let RunOutcome::Suspended(payload) = started else {
        panic!("expected suspension");
    };

    let outcome = engine.resume("A-2", Decision::accept()).await.unwrap();
    let RunOutcome::Completed(state) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(state.status, Status::Applied);
    assert!(state.applied);
    assert!(!state.needs_review);

    // Exactly the drafted updates were committed.
    let calls = applier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "A-2");
    assert_eq!(calls[0].1, payload.proposed_updates);

    let checkpoint = engine.inspect("A-2").await.unwrap();
    assert_eq!(checkpoint.phase(engine.chain_len()), InstancePhase::Terminal);
    assert!(checkpoint.pending_suspension.is_none());
}

#[tokio::test]
async fn duplicate_start_is_a_caller_error() {
    let engine = mocked_engine();
    engine.start("A-3", json!({"result": "ok"})).await.unwrap();

    let err = engine
        .start("A-3", json!({"result": "ok"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InstanceAlreadyExists { .. }));
    assert_eq!(err.class(), ErrorClass::Caller);
    assert_eq!(err.instance_id(), "A-3");
}

#[tokio::test]
async fn explicit_restart_discards_the_old_checkpoint() {
    let engine = mocked_engine();
    engine.start("A-4", json!({"result": "ok"})).await.unwrap();
    let first = engine.inspect("A-4").await.unwrap();

    let outcome = engine
        .start_with(
            "A-4",
            json!({"result": "rejected"}),
            StartOptions { restart: true },
        )
        .await
        .unwrap();
    assert!(outcome.is_suspended());

    let second = engine.inspect("A-4").await.unwrap();
    assert_eq!(second.state.external_input, json!({"result": "rejected"}));
    // Versions restart from scratch with the fresh checkpoint.
    assert!(second.version <= first.version);
}

#[tokio::test]
async fn inspect_is_read_only() {
    let engine = mocked_engine();
    engine.start("A-5", json!({"result": "ok"})).await.unwrap();

    let first = engine.inspect("A-5").await.unwrap();
    for _ in 0..3 {
        let again = engine.inspect("A-5").await.unwrap();
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn inspect_of_unknown_instance_fails() {
    let engine = mocked_engine();
    let err = engine.inspect("missing").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownInstance { .. }));
}

#[tokio::test]
async fn list_instances_sees_every_live_checkpoint() {
    let engine = mocked_engine();
    engine.start("A-6", json!({"result": "ok"})).await.unwrap();
    engine.start("A-7", json!({"result": "ok"})).await.unwrap();

    let mut ids = engine.list_instances().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["A-6", "A-7"]);
}

#[tokio::test]
async fn engine_from_default_config_runs_the_chain() {
    use reviewgate::collaborators::Collaborators;
    use reviewgate::runtimes::{Engine, RuntimeConfig};
    use reviewgate::steps::standard_chain;

    reviewgate::telemetry::init_tracing();
    let chain = standard_chain(Collaborators::mocked()).unwrap();
    let engine = Engine::from_config(chain, &RuntimeConfig::default());

    let outcome = engine.start("C-1", json!({"result": "ok"})).await.unwrap();
    assert!(outcome.is_suspended());
}

#[tokio::test]
async fn checkpoint_versions_increase_monotonically() {
    let engine = mocked_engine();
    engine.start("A-8", json!({"result": "ok"})).await.unwrap();
    let suspended = engine.inspect("A-8").await.unwrap();
    // create + fetch + draft + suspend = four saves.
    assert_eq!(suspended.version, 4);

    engine.resume("A-8", Decision::accept()).await.unwrap();
    let done = engine.inspect("A-8").await.unwrap();
    // + decision fold + commit = six.
    assert_eq!(done.version, 6);
    assert!(done.updated_at >= suspended.updated_at);
}
