//! Test assertions for graph snapshots.

use crate::core::StageStatus;
use crate::graph::GraphSnapshot;

/// Asserts that a stage has the expected status.
pub fn assert_stage_status(snapshot: &GraphSnapshot, id: &str, expected: StageStatus) {
    let stage = snapshot
        .stage(id)
        .unwrap_or_else(|| panic!("Expected stage '{id}' in graph '{}'", snapshot.name));
    assert_eq!(
        stage.status(),
        expected,
        "Expected stage '{}' to be {:?}, got {:?}",
        id,
        expected,
        stage.status()
    );
}

/// Asserts that a stage has the expected status and label.
pub fn assert_stage(snapshot: &GraphSnapshot, id: &str, expected: StageStatus, label: &str) {
    assert_stage_status(snapshot, id, expected);
    let actual = snapshot.stage(id).map(|s| s.label().to_string());
    assert_eq!(
        actual.as_deref(),
        Some(label),
        "Expected stage '{id}' to read '{label}'"
    );
}

/// Asserts that a transition's active flag matches.
pub fn assert_transition_active(snapshot: &GraphSnapshot, id: &str, expected: bool) {
    let transition = snapshot
        .transition(id)
        .unwrap_or_else(|| panic!("Expected transition '{id}' in graph '{}'", snapshot.name));
    assert_eq!(
        transition.is_active(),
        expected,
        "Expected transition '{}' active={}, active transitions: {:?}",
        id,
        expected,
        snapshot.active_transitions()
    );
}

/// Asserts that every stage succeeded and no transition is active.
pub fn assert_complete(snapshot: &GraphSnapshot) {
    assert!(
        snapshot.is_complete(),
        "Expected graph '{}' to be complete, active stages: {:?}, active transitions: {:?}",
        snapshot.name,
        snapshot.active_stages(),
        snapshot.active_transitions()
    );
}

/// Asserts that nothing has been mutated yet.
pub fn assert_pristine(snapshot: &GraphSnapshot) {
    assert!(
        snapshot.is_pristine(),
        "Expected graph '{}' to be untouched, revision is {}",
        snapshot.name,
        snapshot.revision
    );
}
