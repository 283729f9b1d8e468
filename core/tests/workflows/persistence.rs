// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Store snapshots written to and read from disk.

use std::sync::Arc;

use recurcal_core::{MemoryStore, Scheduler, Snapshot};

use crate::common::{test_config, test_scheduler, ts, utc, weekly_standup_draft};

#[test]
fn snapshot_survives_a_file_round_trip() {
    // Arrange
    let store = Arc::new(MemoryStore::new());
    let scheduler = Scheduler::with_memory_store(test_config(), store.clone())
        .unwrap()
        .with_now(utc(2024, 1, 1, 0, 0));
    let (_, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-08T09:00:00Z"))
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    // Act
    let json = serde_json::to_string_pretty(&store.snapshot().unwrap()).unwrap();
    std::fs::write(&path, json).unwrap();
    let snapshot: Snapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let restored = Scheduler::with_memory_store(
        test_config(),
        Arc::new(MemoryStore::from_snapshot(snapshot)),
    )
    .unwrap();

    // Assert
    let (from, to) = (ts("2024-01-01T00:00:00Z"), ts("2024-01-31T00:00:00Z"));
    assert_eq!(restored.get_series(&ctx, series.id()).unwrap(), series);
    assert_eq!(
        restored.list_occurrences(&ctx, from, to).unwrap(),
        scheduler.list_occurrences(&ctx, from, to).unwrap()
    );
    assert_eq!(restored.list_occurrences(&ctx, from, to).unwrap().len(), 4);
}

#[test]
fn snapshot_with_an_invalid_rule_is_rejected() {
    let json = r#"{
        "owners": {
            "local": {
                "series": {
                    "a": {
                        "id": "a",
                        "title": "Broken",
                        "anchor_start": "2024-01-01T09:00:00+00:00[UTC]",
                        "anchor_end": "2024-01-01T10:00:00+00:00[UTC]",
                        "recurrence": "FREQ=HOURLY",
                        "recurrence_version": 1
                    }
                }
            }
        }
    }"#;

    assert!(serde_json::from_str::<Snapshot>(json).is_err());
}
