//! Tests for `PresenceTracker`

use alma_realtime::{PresenceTracker, UserId};

fn ids(raw: &[i64]) -> Vec<UserId> {
    raw.iter().copied().map(UserId::new).collect()
}

#[test]
fn test_snapshot_then_delta() {
    let mut presence = PresenceTracker::new();
    presence.apply_snapshot(ids(&[1, 2, 3]));
    presence.apply_delta(UserId::new(2), false);

    assert!(presence.is_online(UserId::new(1)));
    assert!(!presence.is_online(UserId::new(2)));
    assert!(presence.is_online(UserId::new(3)));
}

#[test]
fn test_snapshot_replaces_whole_set() {
    let mut presence = PresenceTracker::new();
    assert!(presence.apply_snapshot(ids(&[1, 2])));
    assert!(presence.apply_snapshot(ids(&[3])));

    assert_eq!(presence.online_ids(), ids(&[3]));
    assert!(!presence.apply_snapshot(ids(&[3])), "same set is not a change");
}

#[test]
fn test_deltas_are_idempotent() {
    let mut presence = PresenceTracker::new();

    assert!(presence.apply_delta(UserId::new(4), true));
    assert!(!presence.apply_delta(UserId::new(4), true));
    assert_eq!(presence.len(), 1);

    assert!(presence.apply_delta(UserId::new(4), false));
    assert!(!presence.apply_delta(UserId::new(4), false));
    assert!(!presence.apply_delta(UserId::new(5), false));
    assert!(presence.is_empty());
}

#[test]
fn test_last_event_for_a_user_wins() {
    let mut presence = PresenceTracker::new();
    presence.apply_delta(UserId::new(7), true);
    presence.apply_snapshot(ids(&[1]));
    assert!(!presence.is_online(UserId::new(7)));

    presence.apply_delta(UserId::new(7), true);
    assert_eq!(presence.online_ids(), ids(&[1, 7]));
}
