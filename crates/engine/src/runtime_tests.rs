use super::runtime::TrackerEngine;
use super::sync::FlushReport;
use crate::error::EngineError;
use chrono::{Duration, TimeZone, Utc};
use hearth_adapters::{FakeNotifyAdapter, FakeRemoteStore, RemoteError};
use hearth_core::clock::{Clock, FakeClock};
use hearth_core::config::EngineConfig;
use hearth_core::household::Household;
use hearth_core::id::SequentialIdGen;
use hearth_core::outbox::ActionId;
use hearth_core::task::{TaskDraft, TaskId, TaskStatus};
use tempfile::TempDir;

type TestEngine = TrackerEngine<FakeRemoteStore, FakeNotifyAdapter, FakeClock, SequentialIdGen>;

struct Fixture {
    _dir: TempDir,
    engine: TestEngine,
    remote: FakeRemoteStore,
    notify: FakeNotifyAdapter,
    clock: FakeClock,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let remote = FakeRemoteStore::new();
    let notify = FakeNotifyAdapter::new();
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());

    let mut config = EngineConfig::default();
    config.journal_path = dir.path().join("outbox.jsonl");

    let engine = TrackerEngine::new(
        config,
        Household::new("home-1".into()),
        remote.clone(),
        notify.clone(),
        clock.clone(),
        SequentialIdGen::new("a"),
    )
    .unwrap();

    Fixture {
        _dir: dir,
        engine,
        remote,
        notify,
        clock,
    }
}

#[tokio::test]
async fn accept_mirrors_to_remote_when_online() {
    let mut fx = fixture();
    let id = fx.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    fx.engine.accept_task(&id, &"alice".into()).await.unwrap();

    assert_eq!(fx.engine.pending_sync_count(), 0);
    assert_eq!(fx.remote.applied_keys().len(), 1);
    assert_eq!(
        fx.engine.task(&id).unwrap().status,
        TaskStatus::InProgress
    );
}

#[tokio::test]
async fn transient_failure_queues_intent_and_keeps_local_state() {
    let mut fx = fixture();
    let id = fx.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    fx.remote.fail_next_times(1);
    fx.engine.accept_task(&id, &"alice".into()).await.unwrap();

    // Intent preserved locally and in the outbox
    assert_eq!(fx.engine.pending_sync_count(), 1);
    assert_eq!(
        fx.engine.task(&id).unwrap().status,
        TaskStatus::InProgress
    );
    assert!(fx.remote.applied_keys().is_empty());

    // Connectivity returns
    let report = fx.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 1, failed: 0 });
    assert_eq!(fx.engine.pending_sync_count(), 0);
    assert_eq!(fx.remote.applied_keys().len(), 1);
}

#[tokio::test]
async fn definitive_refusal_rolls_back_local_apply() {
    let mut fx = fixture();
    let id = fx.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();
    // create consumed a-1; the accept intent will be a-2
    fx.remote.reject_id("a-2");

    let result = fx.engine.accept_task(&id, &"alice".into()).await;
    assert!(matches!(result, Err(EngineError::Remote(RemoteError::Rejected(_)))));

    let task = fx.engine.task(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Open);
    assert!(task.accepted_by.is_empty());
    assert_eq!(fx.engine.pending_sync_count(), 0);
}

#[tokio::test]
async fn offline_accept_and_complete_flush_in_order() {
    let mut fx = fixture();
    let id = fx.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    fx.remote.fail_next_times(2);
    fx.engine.accept_task(&id, &"alice".into()).await.unwrap();
    fx.engine.complete_task(&id, &"alice".into()).await.unwrap();
    assert_eq!(fx.engine.pending_sync_count(), 2);

    let report = fx.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 2, failed: 0 });

    let calls = fx.remote.calls();
    // Two failed attempts, then the ordered replay
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[2].action_id, ActionId::from("a-2"));
    assert_eq!(calls[3].action_id, ActionId::from("a-3"));
}

#[tokio::test]
async fn unblock_routes_notification_and_bus_event() {
    let mut fx = fixture();
    let mut rx = fx.engine.subscribe("test", &["task:*"]);

    let blocker = fx.engine.create_task(TaskDraft::new("Vacuum")).await.unwrap();
    let dependent = fx
        .engine
        .create_task(TaskDraft::new("Mop").with_dependencies([blocker.clone()]))
        .await
        .unwrap();
    assert_eq!(
        fx.engine.task(&dependent).unwrap().status,
        TaskStatus::Blocked
    );

    fx.engine
        .complete_task(&blocker, &"alice".into())
        .await
        .unwrap();

    assert_eq!(
        fx.engine.task(&dependent).unwrap().status,
        TaskStatus::Open
    );
    let sent = fx.notify.sent();
    assert!(sent.iter().any(|n| n.title == "Task Ready"));

    let mut saw_unblocked = false;
    while let Ok(event) = rx.try_recv() {
        if event.name() == "task:unblocked" {
            saw_unblocked = true;
        }
    }
    assert!(saw_unblocked);
}

#[tokio::test]
async fn tick_announces_due_occurrence_once() {
    let mut fx = fixture();
    let mut draft = TaskDraft::new("Host dinner")
        .with_due(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap());
    draft.prep_window_hours = 2;
    fx.engine.create_task(draft).await.unwrap();

    let mut rx = fx.engine.subscribe("due-watch", &["occurrence:due"]);

    // Outside the prep window: quiet
    fx.engine.tick().await.unwrap();
    assert!(rx.try_recv().is_err());

    // Inside the window: announced exactly once across ticks
    fx.clock.advance(Duration::hours(9));
    fx.engine.tick().await.unwrap();
    fx.engine.tick().await.unwrap();

    let mut announced = 0;
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.name(), "occurrence:due");
        announced += 1;
    }
    assert_eq!(announced, 1);
}

#[tokio::test]
async fn pending_outbox_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let journal_path = dir.path().join("outbox.jsonl");
    let remote = FakeRemoteStore::new();
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());

    let mut config = EngineConfig::default();
    config.journal_path = journal_path.clone();

    let task_id;
    {
        let mut engine = TrackerEngine::new(
            config.clone(),
            Household::new("home-1".into()),
            remote.clone(),
            FakeNotifyAdapter::new(),
            clock.clone(),
            SequentialIdGen::new("a"),
        )
        .unwrap();
        task_id = engine.create_task(TaskDraft::new("Dishes")).await.unwrap();
        remote.fail_next_times(1);
        engine.accept_task(&task_id, &"alice".into()).await.unwrap();
        assert_eq!(engine.pending_sync_count(), 1);
    }

    // Fresh process: the household mirror is refetched out of band, the
    // outbox comes back from the journal
    let mut household = Household::new("home-1".into());
    household
        .create_task(task_id.clone(), TaskDraft::new("Dishes"), clock.now())
        .unwrap();
    let mut engine = TrackerEngine::new(
        config,
        household,
        remote.clone(),
        FakeNotifyAdapter::new(),
        clock,
        SequentialIdGen::new("b"),
    )
    .unwrap();
    assert_eq!(engine.pending_sync_count(), 1);

    let report = engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 1, failed: 0 });
    assert_eq!(remote.applied_keys().len(), 1);
}

#[tokio::test]
async fn comment_on_missing_task_is_not_found() {
    let mut fx = fixture();
    let result = fx
        .engine
        .comment(&TaskId::from("ghost"), &"alice".into(), "hello?")
        .await;
    assert!(matches!(result, Err(EngineError::Household(_))));
}

#[tokio::test]
async fn comment_carries_text_payload_through_outbox() {
    let mut fx = fixture();
    let id = fx.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    fx.remote.fail_next_times(1);
    fx.engine
        .comment(&id, &"alice".into(), "used the last sponge")
        .await
        .unwrap();
    assert_eq!(fx.engine.pending_sync_count(), 1);

    fx.engine.flush().await.unwrap();
    let calls = fx.remote.calls();
    assert_eq!(calls.last().unwrap().kind, hearth_core::outbox::ActionKind::Comment);
}
