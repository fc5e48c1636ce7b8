// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn exact_pattern_matches_exact_event() {
    let pattern = EventPattern::new("record:saved");
    assert!(pattern.matches("record:saved"));
    assert!(!pattern.matches("record:updated"));
    assert!(!pattern.matches("connection:changed"));
}

#[test]
fn wildcard_matches_single_segment() {
    let pattern = EventPattern::new("record:*");
    assert!(pattern.matches("record:saved"));
    assert!(pattern.matches("record:updated"));
    assert!(!pattern.matches("connection:changed"));
    assert!(!pattern.matches("record:saved:again")); // * doesn't match multiple segments
}

#[test]
fn double_wildcard_matches_everything_after() {
    let pattern = EventPattern::new("sync:**");
    assert!(pattern.matches("sync:record:synced"));
    assert!(pattern.matches("sync:record:failed"));
    assert!(pattern.matches("sync:drain:completed"));
    assert!(!pattern.matches("record:saved"));
}

#[test]
fn global_wildcards() {
    let star = EventPattern::new("*");
    let double_star = EventPattern::new("**");

    assert!(star.matches("anything"));
    assert!(double_star.matches("anything:here:too"));
}

#[test]
fn empty_pattern_matches_nothing() {
    assert!(!EventPattern::new("").matches("record:saved"));
}

#[test]
fn subscription_matches_any_pattern() {
    let sub = Subscription::new(
        "status-bar",
        vec![
            EventPattern::new("connection:changed"),
            EventPattern::new("sync:record:*"),
        ],
        "Status indicator",
    );

    assert!(sub.matches("connection:changed"));
    assert!(sub.matches("sync:record:synced"));
    assert!(sub.matches("sync:record:failed"));
    assert!(!sub.matches("sync:drain:completed"));
}
