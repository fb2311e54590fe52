//! Dependency blocking, cycles, and the unblock cascade

use crate::prelude::*;
use hearth_core::reschedule::ShiftReason;
use hearth_engine::EngineError;
use hearth_core::household::HouseholdError;
use hearth_core::task::{TaskDraft, TaskStatus};

#[tokio::test]
async fn dependent_blocks_until_blocker_completes() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let blocker = bench
        .engine
        .create_task(TaskDraft::new("Vacuum kitchen"))
        .await
        .unwrap();
    let dependent = bench
        .engine
        .create_task(TaskDraft::new("Mop kitchen").with_dependencies([blocker.clone()]))
        .await
        .unwrap();

    assert_eq!(
        bench.engine.task(&dependent).unwrap().status,
        TaskStatus::Blocked
    );

    bench
        .engine
        .complete_task(&blocker, &"alice".into())
        .await
        .unwrap();
    assert_eq!(
        bench.engine.task(&dependent).unwrap().status,
        TaskStatus::Open
    );
}

#[tokio::test]
async fn unblocking_after_the_due_time_reschedules_with_reason() {
    // Task A (recurring, due Monday 09:00) depends on B. B completes
    // two days late; A must move forward with reason unblocked_past.
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let b = bench
        .engine
        .create_task(TaskDraft::new("Buy fence paint"))
        .await
        .unwrap();
    let a = bench
        .engine
        .create_task(
            TaskDraft::new("Paint fence")
                .with_rrule("FREQ=WEEKLY")
                .with_start(dt(2024, 3, 4, 9, 0))
                .with_dependencies([b.clone()]),
        )
        .await
        .unwrap();

    bench.clock.set(dt(2024, 3, 6, 12, 0));
    bench.engine.complete_task(&b, &"alice".into()).await.unwrap();

    let task = bench.engine.task(&a).unwrap();
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.next_occurrence_at, Some(dt(2024, 3, 11, 9, 0)));
    let shift = task.last_auto_shift.as_ref().unwrap();
    assert_eq!(shift.reason, ShiftReason::UnblockedPast);
}

#[tokio::test]
async fn cycle_insertion_is_rejected_synchronously() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let a = bench.engine.create_task(TaskDraft::new("A")).await.unwrap();
    let b = bench.engine.create_task(TaskDraft::new("B")).await.unwrap();
    let c = bench.engine.create_task(TaskDraft::new("C")).await.unwrap();

    bench.engine.add_dependency(&a, &b).await.unwrap();
    bench.engine.add_dependency(&b, &c).await.unwrap();

    let result = bench.engine.add_dependency(&c, &a).await;
    assert!(matches!(
        result,
        Err(EngineError::Household(HouseholdError::Cycle(_)))
    ));
    // The graph is unchanged: c still has no blockers
    assert!(bench.engine.task(&c).unwrap().depends_on.is_empty());
}

#[tokio::test]
async fn completed_blocker_no_longer_counts_for_cycles() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let a = bench.engine.create_task(TaskDraft::new("A")).await.unwrap();
    let b = bench.engine.create_task(TaskDraft::new("B")).await.unwrap();

    bench.engine.add_dependency(&a, &b).await.unwrap();
    bench.engine.complete_task(&b, &"alice".into()).await.unwrap();

    // b is terminal; a reverse edge cannot block anything anymore
    bench.engine.add_dependency(&b, &a).await.unwrap();
}

#[tokio::test]
async fn removing_the_last_edge_unblocks() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let b1 = bench.engine.create_task(TaskDraft::new("B1")).await.unwrap();
    let b2 = bench.engine.create_task(TaskDraft::new("B2")).await.unwrap();
    let a = bench
        .engine
        .create_task(TaskDraft::new("A").with_dependencies([b1.clone(), b2.clone()]))
        .await
        .unwrap();

    bench.engine.remove_dependency(&a, &b1).await.unwrap();
    assert_eq!(bench.engine.task(&a).unwrap().status, TaskStatus::Blocked);

    bench.engine.remove_dependency(&a, &b2).await.unwrap();
    assert_eq!(bench.engine.task(&a).unwrap().status, TaskStatus::Open);
}

#[tokio::test]
async fn unblock_notifies_the_household() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let b = bench.engine.create_task(TaskDraft::new("Vacuum")).await.unwrap();
    let a = bench
        .engine
        .create_task(TaskDraft::new("Mop").with_dependencies([b.clone()]))
        .await
        .unwrap();

    bench.engine.complete_task(&b, &"alice".into()).await.unwrap();

    let sent = bench.notify.sent();
    assert!(sent.iter().any(|n| n.title == "Task Ready" && n.body.contains(&a.0)));
}
