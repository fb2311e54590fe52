use super::*;
use crate::entry::OutboxOp;
use chrono::{TimeZone, Utc};
use hearth_core::outbox::{ActionKind, OutboxAction};
use hearth_core::task::{HouseholdId, MemberId, TaskId};

fn action(id: &str, kind: ActionKind) -> OutboxAction {
    OutboxAction::new(
        id,
        kind,
        HouseholdId::from("h-1"),
        TaskId::from("t-1"),
        MemberId::from("alice"),
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    )
}

#[test]
fn enqueued_ops_build_pending_in_order() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
        OutboxOp::Enqueued {
            action: action("a-2", ActionKind::Complete),
        },
    ]);
    let ids: Vec<&str> = state.pending().iter().map(|a| a.id.0.as_str()).collect();
    assert_eq!(ids, vec!["a-1", "a-2"]);
}

#[test]
fn applied_op_settles_and_removes() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
        OutboxOp::Applied {
            action_id: "a-1".into(),
        },
    ]);
    assert!(state.pending().is_empty());
    assert!(state.settled().contains(&"a-1".into()));
}

#[test]
fn rejected_op_settles_without_pending() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Complete),
        },
        OutboxOp::Rejected {
            action_id: "a-1".into(),
            reason: "task vanished".to_string(),
        },
    ]);
    assert!(state.pending().is_empty());
    assert!(state.settled().contains(&"a-1".into()));
}

#[test]
fn duplicate_enqueue_replay_applies_once() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
    ]);
    assert_eq!(state.pending().len(), 1);
}

#[test]
fn enqueue_after_settle_is_ignored() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
        OutboxOp::Applied {
            action_id: "a-1".into(),
        },
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
    ]);
    assert!(state.pending().is_empty());
}

#[test]
fn into_queue_carries_pending_and_settled() {
    let state = MaterializedOutbox::from_ops(vec![
        OutboxOp::Enqueued {
            action: action("a-1", ActionKind::Accept),
        },
        OutboxOp::Applied {
            action_id: "a-1".into(),
        },
        OutboxOp::Enqueued {
            action: action("a-2", ActionKind::Complete),
        },
    ]);
    let queue = state.into_queue();
    assert_eq!(queue.pending_count(), 1);
    assert!(queue.is_settled(&"a-1".into()));
}
