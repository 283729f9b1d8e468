// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Per-occurrence deletions, modifications and restores.

use std::sync::Arc;

use jiff::civil::Weekday;
use recurcal_core::{
    Context, Error, ExceptionKind, Frequency, MemoryStore, OccurrencePatch, RuleDraft,
    SchedulePatch, Scheduler, SeriesDraft,
};

use crate::common::{assert_starts, test_config, test_scheduler, test_series_draft, ts, utc};

fn mondays() -> SeriesDraft {
    test_series_draft(
        "Review",
        utc(2024, 1, 1, 9, 0),
        60,
        Some(RuleDraft::new(Frequency::Weekly).weekdays([Weekday::Monday])),
    )
}

#[test]
fn deleting_third_of_eight_mondays_leaves_seven() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    let (from, to) = (ts("2024-01-01T00:00:00Z"), ts("2024-02-19T23:59:59Z"));
    assert_eq!(scheduler.list_occurrences(&ctx, from, to).unwrap().len(), 8);

    // Act
    let exception = scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-15T09:00:00Z"))
        .unwrap();

    // Assert
    assert_eq!(exception.kind, ExceptionKind::Deleted);
    assert_eq!(exception.recurrence_version, 1);
    let occurrences = scheduler.list_occurrences(&ctx, from, to).unwrap();
    assert_eq!(occurrences.len(), 7);
    assert!(
        occurrences
            .iter()
            .all(|o| o.original_start.timestamp() != ts("2024-01-15T09:00:00Z"))
    );
}

#[test]
fn moved_occurrence_is_found_by_its_original_slot() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    let patch = OccurrencePatch {
        start: Some(utc(2024, 1, 10, 9, 0)),
        ..OccurrencePatch::default()
    };

    // Act
    let moved = scheduler
        .modify_occurrence(&ctx, series.id(), ts("2024-01-08T09:00:00Z"), patch)
        .unwrap();
    let in_original_week = scheduler
        .list_occurrences(&ctx, ts("2024-01-08T00:00:00Z"), ts("2024-01-08T23:59:59Z"))
        .unwrap();

    // Assert
    assert!(moved.modified);
    assert_eq!(moved.start, utc(2024, 1, 10, 9, 0));
    assert_eq!(moved.end, utc(2024, 1, 10, 10, 0));
    assert_eq!(in_original_week, vec![moved]);
    assert_eq!(
        in_original_week[0].original_start.timestamp(),
        ts("2024-01-08T09:00:00Z")
    );
}

#[test]
fn modifications_of_one_slot_merge() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    let slot = ts("2024-01-22T09:00:00Z");

    // Act
    scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            slot,
            OccurrencePatch {
                title: Some("Review (remote)".to_string()),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();
    let merged = scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            slot,
            OccurrencePatch {
                start: Some(utc(2024, 1, 22, 14, 0)),
                end: Some(utc(2024, 1, 22, 14, 30)),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();

    // Assert
    assert_eq!(merged.title, "Review (remote)");
    assert_eq!(merged.start, utc(2024, 1, 22, 14, 0));
    assert_eq!(merged.end, utc(2024, 1, 22, 14, 30));
    assert_eq!(merged.description, series.description());
}

#[test]
fn restore_brings_back_the_plain_occurrence() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    let slot = ts("2024-01-08T09:00:00Z");
    scheduler.delete_occurrence(&ctx, series.id(), slot).unwrap();

    // Act
    scheduler.restore_occurrence(&ctx, series.id(), slot).unwrap();

    // Assert
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-08T00:00:00Z"), ts("2024-01-08T23:59:59Z"))
        .unwrap();
    assert_starts(&occurrences, &["2024-01-08T09:00:00Z"]);
    assert!(!occurrences[0].modified);
    assert!(matches!(
        scheduler.restore_occurrence(&ctx, series.id(), slot),
        Err(Error::NotFound { kind: "exception", .. })
    ));
}

#[test]
fn exceptions_need_a_real_slot() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();

    // Act
    let tuesday = scheduler.delete_occurrence(&ctx, series.id(), ts("2024-01-09T09:00:00Z"));
    let wrong_time = scheduler.modify_occurrence(
        &ctx,
        series.id(),
        ts("2024-01-08T10:00:00Z"),
        OccurrencePatch::default(),
    );
    let missing_series = scheduler.delete_occurrence(&ctx, "nope", ts("2024-01-08T09:00:00Z"));

    // Assert
    assert!(matches!(tuesday, Err(Error::NotFound { kind: "occurrence", .. })));
    assert!(matches!(wrong_time, Err(Error::NotFound { kind: "occurrence", .. })));
    assert!(matches!(missing_series, Err(Error::NotFound { kind: "series", .. })));
}

#[test]
fn schedule_change_drops_orphaned_exceptions() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-08T09:00:00Z"))
        .unwrap();
    scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-15T09:00:00Z"),
            OccurrencePatch {
                title: Some("Special".to_string()),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();

    // Act
    let (updated, dropped) = scheduler
        .update_schedule(
            &ctx,
            series.id(),
            SchedulePatch {
                start: Some(utc(2024, 1, 1, 10, 0)),
                ..SchedulePatch::default()
            },
        )
        .unwrap();

    // Assert
    assert_eq!(updated.recurrence_version(), 2);
    assert_eq!(updated.duration(), series.duration());
    assert_eq!(dropped.len(), 2);
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-21T23:59:59Z"))
        .unwrap();
    assert_starts(
        &occurrences,
        &[
            "2024-01-01T10:00:00Z",
            "2024-01-08T10:00:00Z",
            "2024-01-15T10:00:00Z",
        ],
    );
    assert!(occurrences.iter().all(|o| !o.modified));
}

#[test]
fn deleting_a_series_removes_its_exceptions() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, mondays()).unwrap();
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-08T09:00:00Z"))
        .unwrap();

    // Act
    scheduler.delete_series(&ctx, series.id()).unwrap();

    // Assert
    assert!(matches!(
        scheduler.get_series(&ctx, series.id()),
        Err(Error::NotFound { kind: "series", .. })
    ));
    assert!(matches!(
        scheduler.export_series(&ctx, series.id()),
        Err(Error::NotFound { .. })
    ));
    assert!(
        scheduler
            .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-12-31T00:00:00Z"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn upcoming_follows_moved_occurrences_across_now() {
    // Arrange
    let scheduler = Scheduler::with_memory_store(test_config(), Arc::new(MemoryStore::new()))
        .unwrap()
        .with_now(utc(2024, 1, 10, 12, 0));
    let ctx = Context::new("local");
    let draft = test_series_draft(
        "Daily",
        utc(2024, 1, 1, 9, 0),
        60,
        Some(RuleDraft::new(Frequency::Daily)),
    );
    let series = scheduler.create_series(&ctx, draft).unwrap();
    let move_to = |at| OccurrencePatch {
        start: Some(at),
        ..OccurrencePatch::default()
    };
    scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-11T09:00:00Z"),
            move_to(utc(2024, 1, 5, 9, 0)),
        )
        .unwrap();
    scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-09T09:00:00Z"),
            move_to(utc(2024, 1, 10, 15, 0)),
        )
        .unwrap();

    // Act
    let upcoming = scheduler.list_upcoming(&ctx, 3).unwrap();

    // Assert
    assert_starts(
        &upcoming,
        &[
            "2024-01-10T15:00:00Z",
            "2024-01-12T09:00:00Z",
            "2024-01-13T09:00:00Z",
        ],
    );
    assert_eq!(
        upcoming[0].original_start.timestamp(),
        ts("2024-01-09T09:00:00Z")
    );
    assert!(upcoming[0].modified);
}

#[test]
fn sub_second_anchor_is_addressed_by_whole_seconds() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let start = utc(2024, 1, 1, 9, 0)
        .with()
        .subsec_nanosecond(123_456_789)
        .build()
        .unwrap();
    let draft = test_series_draft("Focus", start, 30, Some(RuleDraft::new(Frequency::Daily)));
    let series = scheduler.create_series(&ctx, draft).unwrap();

    // Act
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-02T09:00:00Z"))
        .unwrap();
    let moved = scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-03T09:00:00Z"),
            OccurrencePatch {
                start: Some(
                    utc(2024, 1, 3, 11, 0)
                        .with()
                        .subsec_nanosecond(500_000_000)
                        .build()
                        .unwrap(),
                ),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();
    let text = scheduler.export_series(&ctx, series.id()).unwrap();
    let (other, other_ctx) = test_scheduler();
    let imported = other.import_text(&other_ctx, &text).unwrap();

    // Assert
    assert_eq!(moved.start, utc(2024, 1, 3, 11, 0));
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-03T23:59:59Z"))
        .unwrap();
    assert_starts(&occurrences, &["2024-01-01T09:00:00Z", "2024-01-03T11:00:00Z"]);
    let mut keys: Vec<_> = imported[0]
        .exceptions
        .iter()
        .map(|e| e.original_start)
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        [ts("2024-01-02T09:00:00Z"), ts("2024-01-03T09:00:00Z")]
    );
}
