//! Offline capture and idempotent replay of user intents

use crate::prelude::*;
use hearth_core::task::{TaskDraft, TaskStatus};
use hearth_engine::FlushReport;

#[tokio::test]
async fn offline_actions_queue_and_flush_in_enqueue_order() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    // Airplane mode: both intents fail transiently and queue up
    bench.remote.fail_next_times(2);
    bench.engine.accept_task(&id, &"alice".into()).await.unwrap();
    bench.engine.complete_task(&id, &"alice".into()).await.unwrap();
    assert_eq!(bench.engine.pending_sync_count(), 2);

    // Local state already reflects the intents
    assert_eq!(bench.engine.task(&id).unwrap().status, TaskStatus::Done);

    // Reconnect
    let report = bench.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 2, failed: 0 });
    assert_eq!(bench.engine.pending_sync_count(), 0);

    let keys = bench.remote.applied_keys();
    assert_eq!(keys.len(), 2, "accept then complete, in order");
}

#[tokio::test]
async fn failed_accept_holds_back_the_complete() {
    // Outbox [accept(T1), complete(T1)]: if the accept fails on flush,
    // the complete must not be applied first; a retried flush sends
    // both in the original order.
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    bench.remote.fail_next_times(2);
    bench.engine.accept_task(&id, &"alice".into()).await.unwrap();
    bench.engine.complete_task(&id, &"alice".into()).await.unwrap();

    // Still offline for the first flushed action
    bench.remote.fail_next_times(1);
    let report = bench.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 0, failed: 1 });
    assert!(bench.remote.applied_keys().is_empty());
    assert_eq!(bench.engine.pending_sync_count(), 2);

    let report = bench.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport { ok: 2, failed: 0 });

    let calls = bench.remote.calls();
    let applied: Vec<_> = calls.iter().skip(3).map(|c| c.kind).collect();
    assert_eq!(
        applied,
        vec![
            hearth_core::outbox::ActionKind::Accept,
            hearth_core::outbox::ActionKind::Complete
        ]
    );
}

#[tokio::test]
async fn replaying_the_same_key_applies_once() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    bench.remote.fail_next_times(1);
    bench.engine.accept_task(&id, &"alice".into()).await.unwrap();

    // Two flushes; the second finds nothing left
    bench.engine.flush().await.unwrap();
    let report = bench.engine.flush().await.unwrap();
    assert_eq!(report, FlushReport::default());
    assert_eq!(bench.remote.applied_keys().len(), 1);
}

#[tokio::test]
async fn tick_drains_the_outbox() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench.engine.create_task(TaskDraft::new("Dishes")).await.unwrap();

    bench.remote.fail_next_times(1);
    bench.engine.accept_task(&id, &"alice".into()).await.unwrap();
    assert_eq!(bench.engine.pending_sync_count(), 1);

    let report = bench.engine.tick().await.unwrap();
    assert_eq!(report, FlushReport { ok: 1, failed: 0 });
    assert_eq!(bench.engine.pending_sync_count(), 0);
}
