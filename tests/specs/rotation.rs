//! Rotation assignment and fairness through renewals

use crate::prelude::*;
use chrono::Duration;
use hearth_core::task::{MemberId, TaskDraft};
use std::collections::BTreeMap;

fn weights(entries: &[(&str, u32)]) -> BTreeMap<MemberId, u32> {
    entries
        .iter()
        .map(|(name, w)| (MemberId::from(*name), *w))
        .collect()
}

#[tokio::test]
async fn weighted_rotation_follows_the_expanded_sequence() {
    // Pool [alice, bob] with weights {alice: 2, bob: 1}, starting at
    // index 0: assignees over six occurrences run
    // alice, alice, bob, alice, alice, bob.
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Dishes")
                .with_rrule("FREQ=DAILY")
                .with_start(dt(2024, 3, 1, 19, 0))
                .with_rotation(vec!["alice".into(), "bob".into()])
                .with_weights(weights(&[("alice", 2), ("bob", 1)])),
        )
        .await
        .unwrap();

    let assignee = |engine: &crate::prelude::SpecEngine| {
        engine
            .household()
            .current_assignee(&id)
            .unwrap()
            .unwrap()
            .0
            .clone()
    };

    let mut seen = vec![assignee(&bench.engine)];
    for _ in 0..5 {
        bench.clock.advance(Duration::days(1));
        bench
            .engine
            .complete_task(&id, &"alice".into())
            .await
            .unwrap();
        seen.push(assignee(&bench.engine));
    }

    similar_asserts::assert_eq!(seen, vec!["alice", "alice", "bob", "alice", "alice", "bob"]);
}

#[tokio::test]
async fn release_and_reaccept_do_not_consume_a_turn() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Dishes")
                .with_rrule("FREQ=DAILY")
                .with_start(dt(2024, 3, 1, 19, 0))
                .with_rotation(vec!["alice".into(), "bob".into()]),
        )
        .await
        .unwrap();
    assert_eq!(bench.engine.task(&id).unwrap().rotation_index, Some(0));

    // Claim churn on the same occurrence
    bench.engine.accept_task(&id, &"alice".into()).await.unwrap();
    bench.engine.release_task(&id, &"alice".into()).await.unwrap();
    bench.engine.accept_task(&id, &"bob".into()).await.unwrap();
    assert_eq!(bench.engine.task(&id).unwrap().rotation_index, Some(0));

    // Only the renewal advances
    bench.engine.complete_task(&id, &"bob".into()).await.unwrap();
    assert_eq!(bench.engine.task(&id).unwrap().rotation_index, Some(1));
}

#[tokio::test]
async fn fairness_report_tracks_weighted_shares() {
    let mut bench = bench_at(dt(2024, 3, 1, 8, 0));
    let id = bench
        .engine
        .create_task(
            TaskDraft::new("Dishes")
                .with_rrule("FREQ=DAILY")
                .with_start(dt(2024, 3, 1, 19, 0))
                .with_rotation(vec!["alice".into(), "bob".into(), "carol".into()])
                .with_weights(weights(&[("alice", 3), ("bob", 2), ("carol", 1)])),
        )
        .await
        .unwrap();

    // Everyone completes the slots the rotation hands them
    for _ in 0..60 {
        let member = bench
            .engine
            .household()
            .current_assignee(&id)
            .unwrap()
            .unwrap();
        bench.engine.complete_task(&id, &member).await.unwrap();
        bench.clock.advance(Duration::days(1));
    }

    let report = bench.engine.fairness_report(&id).unwrap();
    let total: u64 = report.iter().map(|e| e.completed).sum();
    assert_eq!(total, 60);

    // Within one completion of the weight-proportional share
    for entry in &report {
        assert!(
            entry.delta.abs() <= 1.0,
            "{}: completed {} expected {}",
            entry.id,
            entry.completed,
            entry.expected_share
        );
    }
    // And the shares actually differ by weight
    assert_eq!(report[0].completed, 30);
    assert_eq!(report[1].completed, 20);
    assert_eq!(report[2].completed, 10);
}
