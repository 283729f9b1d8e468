// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.
//!
//! This module provides helper functions to create configurations,
//! schedulers and series drafts with fixed instants.

use std::sync::Arc;

use jiff::civil::{Weekday, date};
use jiff::{SignedDuration, Timestamp, Zoned};
use recurcal_core::{
    Config, Context, Frequency, MemoryStore, RuleDraft, Scheduler, SeriesDraft, UntilBound,
};

/// A wall-clock time in UTC.
#[must_use]
pub fn utc(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Zoned {
    date(year, month, day)
        .at(hour, minute, 0, 0)
        .in_tz("UTC")
        .unwrap()
}

/// A wall-clock time in Europe/Berlin.
#[must_use]
pub fn berlin(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Zoned {
    date(year, month, day)
        .at(hour, minute, 0, 0)
        .in_tz("Europe/Berlin")
        .unwrap()
}

/// Parses an RFC 3339 instant.
#[must_use]
pub fn ts(s: &str) -> Timestamp {
    s.parse().unwrap()
}

/// Creates a test configuration with UTC as the default zone.
#[must_use]
pub fn test_config() -> Config {
    Config {
        default_timezone: Some("UTC".to_string()),
        ..Config::default()
    }
}

/// Creates a scheduler over an empty memory store, pinned at
/// 2024-01-01T00:00:00Z.
///
/// # Example
///
/// ```ignore
/// let (scheduler, ctx) = test_scheduler();
/// let series = scheduler.create_series(&ctx, weekly_standup_draft()).unwrap();
/// ```
#[must_use]
pub fn test_scheduler() -> (Scheduler, Context) {
    let scheduler = Scheduler::with_memory_store(test_config(), Arc::new(MemoryStore::new()))
        .unwrap()
        .with_now(utc(2024, 1, 1, 0, 0));
    (scheduler, Context::new("local"))
}

/// Creates a series draft lasting `minutes` from `start`.
///
/// # Arguments
///
/// * `title` - Series title
/// * `start` - Anchor start
/// * `minutes` - Length of every occurrence
/// * `recurrence` - Optional rule
#[must_use]
pub fn test_series_draft(
    title: &str,
    start: Zoned,
    minutes: i64,
    recurrence: Option<RuleDraft>,
) -> SeriesDraft {
    SeriesDraft {
        title: title.to_string(),
        description: String::new(),
        end: start.checked_add(SignedDuration::from_mins(minutes)).unwrap(),
        start,
        recurrence,
    }
}

/// Monday and Wednesday 09:00 to 09:30 UTC from 2024-01-01 through
/// 2024-01-15.
#[must_use]
pub fn weekly_standup_draft() -> SeriesDraft {
    test_series_draft(
        "Standup",
        utc(2024, 1, 1, 9, 0),
        30,
        Some(
            RuleDraft::new(Frequency::Weekly)
                .weekdays([Weekday::Monday, Weekday::Wednesday])
                .until(UntilBound::Date(date(2024, 1, 15))),
        ),
    )
}
