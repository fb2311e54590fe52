use super::subscription::*;

#[test]
fn exact_pattern_matches_only_itself() {
    let pattern = EventPattern::new("task:unblocked");
    assert!(pattern.matches("task:unblocked"));
    assert!(!pattern.matches("task:blocked"));
    assert!(!pattern.matches("task:unblocked:extra"));
}

#[test]
fn single_wildcard_matches_one_segment() {
    let pattern = EventPattern::new("task:*");
    assert!(pattern.matches("task:blocked"));
    assert!(pattern.matches("task:unblocked"));
    assert!(!pattern.matches("occurrence:due"));
    assert!(!pattern.matches("task"));
}

#[test]
fn double_wildcard_matches_rest() {
    let pattern = EventPattern::new("outbox:**");
    assert!(pattern.matches("outbox:applied"));
    assert!(pattern.matches("outbox:flush:failed"));
    assert!(!pattern.matches("task:blocked"));
}

#[test]
fn bare_wildcards_match_everything() {
    assert!(EventPattern::new("*").matches("task:created"));
    assert!(EventPattern::new("**").matches("occurrence:due"));
}

#[test]
fn empty_pattern_matches_nothing() {
    assert!(!EventPattern::new("").matches("task:created"));
}

#[test]
fn subscription_matches_any_of_its_patterns() {
    let sub = Subscription::new(
        "notifier",
        vec![
            EventPattern::new("task:unblocked"),
            EventPattern::new("occurrence:due"),
        ],
    );
    assert!(sub.matches("occurrence:due"));
    assert!(sub.matches("task:unblocked"));
    assert!(!sub.matches("task:created"));
}
