// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Expansion scenarios over whole windows.

use jiff::civil::Weekday;
use recurcal_core::{Error, Frequency, RuleDraft, Series, generate, materialize};

use crate::common::{
    assert_ascending, assert_starts, assert_within, berlin, test_scheduler, test_series_draft, ts,
    utc, weekly_standup_draft,
};

#[test]
fn weekly_monday_wednesday_until_inclusive() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();

    // Act
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-31T23:59:59Z"))
        .unwrap();

    // Assert
    assert_starts(
        &occurrences,
        &[
            "2024-01-01T09:00:00Z",
            "2024-01-03T09:00:00Z",
            "2024-01-08T09:00:00Z",
            "2024-01-10T09:00:00Z",
            "2024-01-15T09:00:00Z",
        ],
    );
    for occurrence in &occurrences {
        assert_eq!(occurrence.end.time(), jiff::civil::time(9, 30, 0, 0));
        assert!(!occurrence.modified);
        assert_eq!(occurrence.title, "Standup");
    }
}

#[test]
fn monthly_day_31_clamps_in_leap_year() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let draft = test_series_draft(
        "Rent",
        utc(2024, 1, 31, 9, 0),
        60,
        Some(RuleDraft::new(Frequency::Monthly).day_of_month(31)),
    );
    scheduler.create_series(&ctx, draft).unwrap();

    // Act
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-04-30T23:59:59Z"))
        .unwrap();

    // Assert
    assert_starts(
        &occurrences,
        &[
            "2024-01-31T09:00:00Z",
            "2024-02-29T09:00:00Z",
            "2024-03-31T09:00:00Z",
            "2024-04-30T09:00:00Z",
        ],
    );
}

#[test]
fn monthly_day_31_clamps_in_common_year() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let draft = test_series_draft(
        "Rent",
        utc(2023, 1, 31, 9, 0),
        60,
        Some(RuleDraft::new(Frequency::Monthly).day_of_month(31)),
    );
    scheduler.create_series(&ctx, draft).unwrap();

    // Act
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2023-02-01T00:00:00Z"), ts("2023-03-01T00:00:00Z"))
        .unwrap();

    // Assert
    assert_starts(&occurrences, &["2023-02-28T09:00:00Z"]);
}

#[test]
fn last_friday_keeps_wall_clock_across_dst() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let draft = test_series_draft(
        "Retro",
        berlin(2024, 1, 26, 16, 0),
        60,
        Some(RuleDraft::new(Frequency::Monthly).nth_weekday(-1, Weekday::Friday)),
    );
    scheduler.create_series(&ctx, draft).unwrap();

    // Act
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-03-01T00:00:00Z"), ts("2024-04-30T23:59:59Z"))
        .unwrap();

    // Assert: CET in March, CEST in April
    assert_starts(
        &occurrences,
        &["2024-03-29T15:00:00Z", "2024-04-26T14:00:00Z"],
    );
    for occurrence in &occurrences {
        assert_eq!(occurrence.start.hour(), 16);
        assert_eq!(occurrence.start.weekday(), Weekday::Friday);
    }
}

#[test]
fn merged_listing_is_sorted_and_bounded() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    let daily = test_series_draft(
        "Lunch",
        utc(2024, 1, 1, 12, 0),
        45,
        Some(RuleDraft::new(Frequency::Daily).interval(2)),
    );
    scheduler.create_series(&ctx, daily).unwrap();
    let single = test_series_draft("Dentist", utc(2024, 1, 9, 8, 0), 30, None);
    scheduler.create_series(&ctx, single).unwrap();
    let (from, to) = (ts("2024-01-02T00:00:00Z"), ts("2024-01-10T23:59:59Z"));

    // Act
    let occurrences = scheduler.list_occurrences(&ctx, from, to).unwrap();

    // Assert
    assert_ascending(&occurrences);
    assert_within(&occurrences, from, to);
    let titles: Vec<&str> = occurrences.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Standup", "Lunch", "Lunch", "Lunch", "Standup", "Dentist", "Lunch", "Standup"
        ]
    );
}

#[test]
fn adjacent_windows_partition_the_expansion() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler
        .create_series(
            &ctx,
            test_series_draft(
                "Daily",
                utc(2024, 1, 1, 9, 0),
                15,
                Some(RuleDraft::new(Frequency::Daily)),
            ),
        )
        .unwrap();
    let whole = (ts("2024-01-01T00:00:00Z"), ts("2024-02-01T00:00:00Z"));
    // The boundary instant is an occurrence; it belongs to the first half only.
    let first = (whole.0, ts("2024-01-15T09:00:00Z"));
    let second = (ts("2024-01-15T09:00:01Z"), whole.1);

    // Act
    let all = materialize(&series, &[], whole.0, whole.1, 1000).unwrap();
    let mut halves = materialize(&series, &[], first.0, first.1, 1000).unwrap();
    halves.extend(materialize(&series, &[], second.0, second.1, 1000).unwrap());

    // Assert
    assert_eq!(all.len(), 31);
    assert_eq!(halves, all);
}

#[test]
fn windows_sharing_a_boundary_occurrence_union_without_duplicate() {
    // Arrange
    let series = Series::new(
        "s",
        test_series_draft(
            "Daily",
            utc(2024, 1, 1, 9, 0),
            15,
            Some(RuleDraft::new(Frequency::Daily)),
        ),
    )
    .unwrap();
    let (a, b, c) = (
        ts("2024-01-01T00:00:00Z"),
        ts("2024-01-15T09:00:00Z"),
        ts("2024-01-31T23:59:59Z"),
    );

    // Act
    let all = generate(&series, a, c, 1000).unwrap();
    let left = generate(&series, a, b, 1000).unwrap();
    let right = generate(&series, b, c, 1000).unwrap();
    let mut union: Vec<_> = left.iter().chain(&right).cloned().collect();
    union.sort_by_key(|slot| slot.timestamp());
    union.dedup();

    // Assert
    assert_eq!(left.last().map(|slot| slot.timestamp()), Some(b));
    assert_eq!(right.first().map(|slot| slot.timestamp()), Some(b));
    assert_eq!(union, all);
    assert_eq!(
        union.iter().filter(|slot| slot.timestamp() == b).count(),
        1
    );
}

#[test]
fn materialize_is_idempotent() {
    // Arrange
    let series = Series::new("s", weekly_standup_draft()).unwrap();
    let (from, to) = (ts("2023-12-01T00:00:00Z"), ts("2024-02-01T00:00:00Z"));

    // Act
    let first = materialize(&series, &[], from, to, 1000).unwrap();
    let second = materialize(&series, &[], from, to, 1000).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn far_window_is_cheap_and_overflow_is_reported() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    scheduler
        .create_series(
            &ctx,
            test_series_draft(
                "Daily",
                utc(2024, 1, 1, 9, 0),
                15,
                Some(RuleDraft::new(Frequency::Daily)),
            ),
        )
        .unwrap();

    // Act
    let far = scheduler
        .list_occurrences(&ctx, ts("2124-01-01T00:00:00Z"), ts("2124-01-03T23:59:59Z"))
        .unwrap();
    let huge = scheduler.list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2124-01-01T00:00:00Z"));

    // Assert
    assert_starts(
        &far,
        &[
            "2124-01-01T09:00:00Z",
            "2124-01-02T09:00:00Z",
            "2124-01-03T09:00:00Z",
        ],
    );
    assert!(matches!(huge, Err(Error::ExpansionOverflow { limit: 10_000 })));
}

#[test]
fn inverted_window_is_rejected() {
    let (scheduler, ctx) = test_scheduler();

    let result = scheduler.list_occurrences(&ctx, ts("2024-02-01T00:00:00Z"), ts("2024-01-01T00:00:00Z"));

    assert!(matches!(result, Err(Error::Validation(e)) if e.field == "window"));
}
