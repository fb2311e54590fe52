//! Recurrence, exceptions, and auto-reschedule through the engine API

use crate::prelude::*;
use chrono::{Duration, NaiveDate};
use hearth_core::reschedule::ShiftReason;
use hearth_core::task::{TaskDraft, TaskPatch, TaskStatus};

#[tokio::test]
async fn weekly_rule_with_skip_jumps_a_week() {
    // Weekly on Monday, 2024-03-04 skipped: the next occurrence after
    // March 1st is March 11th, not March 4th.
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Take out bins")
                .with_rrule("FREQ=WEEKLY")
                .with_start(dt(2024, 2, 5, 9, 0)),
        )
        .await
        .unwrap();

    bench
        .engine
        .update_task(
            &id,
            TaskPatch {
                skip_dates: Some(
                    [NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()]
                        .into_iter()
                        .collect(),
                ),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    let task = bench.engine.task(&id).unwrap();
    assert_eq!(task.next_occurrence_at, Some(dt(2024, 3, 11, 9, 0)));
    // The base rule never changes
    assert_eq!(task.rrule.as_deref(), Some("FREQ=WEEKLY"));
}

#[tokio::test]
async fn dropping_an_exception_restores_the_bare_rule() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Water plants")
                .with_rrule("FREQ=WEEKLY")
                .with_start(dt(2024, 2, 5, 9, 0)),
        )
        .await
        .unwrap();
    assert_eq!(
        bench.engine.task(&id).unwrap().next_occurrence_at,
        Some(dt(2024, 3, 4, 9, 0))
    );

    // Snooze the occurrence, then withdraw the exception
    bench.engine.snooze_task(&id, 45).await.unwrap();
    assert_eq!(
        bench.engine.task(&id).unwrap().next_occurrence_at,
        Some(dt(2024, 3, 4, 9, 45))
    );

    bench
        .engine
        .update_task(
            &id,
            TaskPatch {
                exception_shifts: Some(Default::default()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    // Exactly what the unmodified rule would have produced
    assert_eq!(
        bench.engine.task(&id).unwrap().next_occurrence_at,
        Some(dt(2024, 3, 4, 9, 0))
    );
}

#[tokio::test]
async fn missed_occurrence_is_shifted_on_tick_with_past_due() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Water plants")
                .with_rrule("FREQ=WEEKLY")
                .with_start(dt(2024, 3, 4, 9, 0)),
        )
        .await
        .unwrap();

    // The app was closed over the occurrence
    bench.clock.advance(Duration::days(4));
    bench.engine.tick().await.unwrap();

    let task = bench.engine.task(&id).unwrap();
    assert_eq!(task.next_occurrence_at, Some(dt(2024, 3, 11, 9, 0)));
    let shift = task.last_auto_shift.as_ref().unwrap();
    assert_eq!(shift.reason, ShiftReason::PastDue);
    assert_eq!(shift.from, dt(2024, 3, 4, 9, 0));
}

#[tokio::test]
async fn opted_out_task_is_left_overdue() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let mut draft = TaskDraft::new("Water plants")
        .with_rrule("FREQ=WEEKLY")
        .with_start(dt(2024, 3, 4, 9, 0));
    draft.auto_reschedule_disabled = true;
    let id = bench.engine.create_task(draft).await.unwrap();

    bench.clock.advance(Duration::days(4));
    bench.engine.tick().await.unwrap();

    let task = bench.engine.task(&id).unwrap();
    assert_eq!(task.next_occurrence_at, Some(dt(2024, 3, 4, 9, 0)));
    assert!(task.last_auto_shift.is_none());
}

#[tokio::test]
async fn paused_series_resumes_after_the_pause_lapses() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Mow the lawn")
                .with_rrule("FREQ=WEEKLY")
                .with_start(dt(2024, 3, 4, 9, 0)),
        )
        .await
        .unwrap();

    // Vacation until April
    bench
        .engine
        .update_task(
            &id,
            TaskPatch {
                paused_until: Some(Some(dt(2024, 4, 1, 0, 0))),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    bench
        .engine
        .complete_task(&id, &"alice".into())
        .await
        .unwrap();
    assert_eq!(bench.engine.task(&id).unwrap().next_occurrence_at, None);

    // Ticks during the pause schedule nothing
    bench.clock.advance(Duration::days(14));
    bench.engine.tick().await.unwrap();
    assert_eq!(bench.engine.task(&id).unwrap().next_occurrence_at, None);

    // First tick after the pause materializes the next Monday
    bench.clock.set(dt(2024, 4, 2, 8, 0));
    bench.engine.tick().await.unwrap();
    let task = bench.engine.task(&id).unwrap();
    assert_eq!(task.next_occurrence_at, Some(dt(2024, 4, 8, 9, 0)));
    assert_eq!(task.status, TaskStatus::Open);
}

#[tokio::test]
async fn bounded_series_finishes_and_rests() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Physio exercises")
                .with_rrule("FREQ=DAILY;COUNT=2")
                .with_start(dt(2024, 3, 1, 9, 0)),
        )
        .await
        .unwrap();

    bench.clock.set(dt(2024, 3, 1, 10, 0));
    bench.engine.complete_task(&id, &"alice".into()).await.unwrap();
    bench.clock.set(dt(2024, 3, 2, 10, 0));
    bench.engine.complete_task(&id, &"alice".into()).await.unwrap();

    let task = bench.engine.task(&id).unwrap();
    assert!(task.series_finished);
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.next_occurrence_at, None);

    // Further ticks leave the finished series alone
    bench.clock.advance(Duration::days(7));
    bench.engine.tick().await.unwrap();
    assert!(bench.engine.task(&id).unwrap().next_occurrence_at.is_none());
}
