// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Series creation, lookup, edits and validation.

use jiff::civil::{Weekday, date};
use recurcal_core::{
    Context, DetailsPatch, Error, Frequency, OccurrencePatch, RuleDraft, SchedulePatch,
    UntilBound,
};

use crate::common::{test_scheduler, test_series_draft, ts, utc, weekly_standup_draft};

fn rejected_field(result: Result<impl std::fmt::Debug, Error>) -> &'static str {
    match result {
        Err(Error::Validation(e)) => e.field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn create_get_and_list_series() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();

    // Act
    let created = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();

    // Assert
    assert_eq!(created.recurrence_version(), 1);
    assert_eq!(
        created.recurrence().unwrap().to_string(),
        "FREQ=WEEKLY;UNTIL=20240115T235959Z;BYDAY=MO,WE"
    );
    assert_eq!(scheduler.get_series(&ctx, created.id()).unwrap(), created);
    assert_eq!(scheduler.list_series(&ctx).unwrap(), vec![created.clone()]);
    assert!(
        scheduler
            .list_series(&Context::new("someone-else"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn details_edit_keeps_version_and_exceptions() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    scheduler
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-03T09:00:00Z"),
            OccurrencePatch {
                start: Some(utc(2024, 1, 4, 9, 0)),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();

    // Act
    let updated = scheduler
        .update_details(
            &ctx,
            series.id(),
            DetailsPatch {
                title: Some("Daily sync".to_string()),
                description: Some("Room 4".to_string()),
            },
        )
        .unwrap();

    // Assert
    assert_eq!(updated.recurrence_version(), 1);
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-05T00:00:00Z"))
        .unwrap();
    assert_eq!(occurrences.len(), 2);
    assert!(occurrences.iter().all(|o| o.title == "Daily sync"));
    assert!(occurrences[1].modified);
    assert_eq!(occurrences[1].start, utc(2024, 1, 4, 9, 0));
}

#[test]
fn schedule_edit_can_replace_or_remove_the_rule() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();

    // Act
    let (daily, _) = scheduler
        .update_schedule(
            &ctx,
            series.id(),
            SchedulePatch {
                recurrence: Some(Some(RuleDraft::new(Frequency::Daily).interval(3))),
                ..SchedulePatch::default()
            },
        )
        .unwrap();
    let (single, _) = scheduler
        .update_schedule(
            &ctx,
            series.id(),
            SchedulePatch {
                recurrence: Some(None),
                end: Some(utc(2024, 1, 1, 11, 0)),
                ..SchedulePatch::default()
            },
        )
        .unwrap();

    // Assert
    assert_eq!(daily.recurrence().unwrap().to_string(), "FREQ=DAILY;INTERVAL=3");
    assert_eq!(daily.recurrence_version(), 2);
    assert!(single.recurrence().is_none());
    assert_eq!(single.recurrence_version(), 3);
    assert_eq!(single.anchor_end(), &utc(2024, 1, 1, 11, 0));
}

#[test]
fn invalid_drafts_name_the_offending_field() {
    let (scheduler, ctx) = test_scheduler();
    let start = || utc(2024, 1, 1, 9, 0);
    let with_rule = |rule: RuleDraft| test_series_draft("x", start(), 30, Some(rule));

    let cases = [
        (with_rule(RuleDraft::new(Frequency::Daily).interval(0)), "interval"),
        (
            with_rule(RuleDraft::new(Frequency::Daily).weekdays([Weekday::Monday])),
            "by_weekday",
        ),
        (with_rule(RuleDraft::new(Frequency::Monthly)), "monthly"),
        (
            with_rule(
                RuleDraft::new(Frequency::Monthly)
                    .day_of_month(1)
                    .nth_weekday(1, Weekday::Monday),
            ),
            "monthly",
        ),
        (
            with_rule(RuleDraft::new(Frequency::Weekly).day_of_month(1)),
            "monthly",
        ),
        (
            with_rule(RuleDraft::new(Frequency::Monthly).day_of_month(32)),
            "day_of_month",
        ),
        (
            with_rule(RuleDraft::new(Frequency::Monthly).nth_weekday(5, Weekday::Monday)),
            "ordinal",
        ),
        (
            with_rule(
                RuleDraft::new(Frequency::Daily).until(UntilBound::Date(date(2023, 12, 31))),
            ),
            "until",
        ),
        (test_series_draft("x", start(), -30, None), "end"),
    ];

    for (draft, field) in cases {
        assert_eq!(rejected_field(scheduler.create_series(&ctx, draft)), field);
    }
    assert!(scheduler.list_series(&ctx).unwrap().is_empty());
}

#[test]
fn invalid_schedule_edit_changes_nothing() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-08T09:00:00Z"))
        .unwrap();

    // Act
    let result = scheduler.update_schedule(
        &ctx,
        series.id(),
        SchedulePatch {
            start: Some(utc(2024, 2, 1, 9, 0)),
            ..SchedulePatch::default()
        },
    );

    // Assert: the kept rule ends before the new start
    assert_eq!(rejected_field(result), "until");
    assert_eq!(scheduler.get_series(&ctx, series.id()).unwrap(), series);
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-31T00:00:00Z"))
        .unwrap();
    assert_eq!(occurrences.len(), 4);
}
