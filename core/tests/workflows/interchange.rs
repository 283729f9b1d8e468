// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar export and import through the scheduler.

use jiff::Timestamp;
use jiff::civil::{Weekday, date};
use jiff::tz::TimeZone;
use recurcal_core::{
    CalendarSerializer, Error, Frequency, OccurrencePatch, RuleDraft, Series, UntilBound,
};

use crate::common::{berlin, test_scheduler, test_series_draft, ts, utc, weekly_standup_draft};

#[test]
fn export_then_import_reproduces_occurrences() {
    // Arrange
    let (source, ctx) = test_scheduler();
    let series = source.create_series(&ctx, weekly_standup_draft()).unwrap();
    source
        .delete_occurrence(&ctx, series.id(), ts("2024-01-03T09:00:00Z"))
        .unwrap();
    source
        .modify_occurrence(
            &ctx,
            series.id(),
            ts("2024-01-10T09:00:00Z"),
            OccurrencePatch {
                start: Some(utc(2024, 1, 11, 13, 0)),
                title: Some("Standup, moved; again".to_string()),
                ..OccurrencePatch::default()
            },
        )
        .unwrap();
    let (from, to) = (ts("2024-01-01T00:00:00Z"), ts("2024-01-31T00:00:00Z"));

    // Act
    let text = source.export_series(&ctx, series.id()).unwrap();
    let (target, _) = test_scheduler();
    let imported = target.import_text(&ctx, &text).unwrap();

    // Assert
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].series, series);
    assert_eq!(imported[0].exceptions.len(), 2);
    assert_eq!(
        target.list_occurrences(&ctx, from, to).unwrap(),
        source.list_occurrences(&ctx, from, to).unwrap()
    );
}

#[test]
fn every_representable_rule_round_trips() {
    let serializer = CalendarSerializer::new(TimeZone::UTC, Timestamp::UNIX_EPOCH);
    let rules = [
        RuleDraft::new(Frequency::Daily),
        RuleDraft::new(Frequency::Daily).interval(2),
        RuleDraft::new(Frequency::Weekly),
        RuleDraft::new(Frequency::Weekly)
            .interval(2)
            .weekdays([Weekday::Monday, Weekday::Wednesday, Weekday::Friday]),
        RuleDraft::new(Frequency::Monthly).day_of_month(31),
        RuleDraft::new(Frequency::Monthly).nth_weekday(2, Weekday::Tuesday),
        RuleDraft::new(Frequency::Monthly).nth_weekday(-1, Weekday::Friday),
        RuleDraft::new(Frequency::Yearly).interval(4),
        RuleDraft::new(Frequency::Daily).until(UntilBound::Date(date(2024, 6, 30))),
        RuleDraft::new(Frequency::Weekly)
            .until(UntilBound::Instant(ts("2024-03-01T12:34:56.789Z"))),
    ];

    for (i, rule) in rules.into_iter().enumerate() {
        for start in [utc(2024, 1, 31, 9, 0), berlin(2024, 1, 31, 9, 0)] {
            let draft = test_series_draft("Round trip", start, 45, Some(rule.clone()));
            let series = Series::new(format!("rule-{i}"), draft).unwrap();

            let text = serializer
                .serialize_series(&[(series.clone(), Vec::new())])
                .unwrap();
            let imported = serializer.parse(&text).unwrap();

            assert_eq!(imported.len(), 1);
            assert_eq!(imported[0].series, series, "rule {i}:\n{text}");
            assert!(imported[0].exceptions.is_empty());
        }
    }
}

#[test]
fn failed_import_stores_nothing() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let text = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        BEGIN:VEVENT\r\n\
        UID:good\r\n\
        DTSTART:20240101T090000Z\r\n\
        DTEND:20240101T100000Z\r\n\
        RRULE:FREQ=DAILY\r\n\
        END:VEVENT\r\n\
        BEGIN:VEVENT\r\n\
        UID:bad\r\n\
        DTSTART:20240101T090000Z\r\n\
        RRULE:FREQ=MONTHLY;BYDAY=1MO;BYSETPOS=1\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    // Act
    let result = scheduler.import_text(&ctx, text);

    // Assert
    assert!(matches!(
        result,
        Err(Error::UnsupportedRule { part, .. }) if part == "BYSETPOS"
    ));
    assert!(scheduler.list_series(&ctx).unwrap().is_empty());
}

#[test]
fn import_replaces_series_with_the_same_uid() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    scheduler
        .delete_occurrence(&ctx, series.id(), ts("2024-01-03T09:00:00Z"))
        .unwrap();
    let text = format!(
        "BEGIN:VCALENDAR\r\n\
        BEGIN:VEVENT\r\n\
        UID:{}\r\n\
        DTSTART:20240101T070000Z\r\n\
        DTEND:20240101T073000Z\r\n\
        SUMMARY:Early standup\r\n\
        RRULE:FREQ=DAILY;UNTIL=20240103T070000Z\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n",
        series.id()
    );

    // Act
    scheduler.import_text(&ctx, &text).unwrap();

    // Assert
    let occurrences = scheduler
        .list_occurrences(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-31T00:00:00Z"))
        .unwrap();
    assert_eq!(occurrences.len(), 3);
    assert!(occurrences.iter().all(|o| o.title == "Early standup"));
    assert_eq!(scheduler.list_series(&ctx).unwrap().len(), 1);
}

#[test]
fn window_export_lists_each_occurrence() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();

    // Act
    let text = scheduler
        .export_window(&ctx, ts("2024-01-01T00:00:00Z"), ts("2024-01-07T00:00:00Z"))
        .unwrap();

    // Assert
    assert_eq!(text.matches("BEGIN:VEVENT").count(), 2);
    assert!(text.contains(&format!("UID:{}-20240101T090000Z\r\n", series.id())));
    assert!(text.contains(&format!("UID:{}-20240103T090000Z\r\n", series.id())));
    assert!(!text.contains("RRULE"));
}

#[test]
fn export_all_contains_every_series() {
    // Arrange
    let (scheduler, ctx) = test_scheduler();
    scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
    scheduler
        .create_series(&ctx, test_series_draft("Once", utc(2024, 2, 1, 9, 0), 30, None))
        .unwrap();

    // Act
    let text = scheduler.export_all(&ctx).unwrap();
    let (target, _) = test_scheduler();
    let imported = target.import_text(&ctx, &text).unwrap();

    // Assert
    assert_eq!(imported.len(), 2);
    assert_eq!(
        target.list_series(&ctx).unwrap(),
        scheduler.list_series(&ctx).unwrap()
    );
}
