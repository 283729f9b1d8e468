// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Recurrence rules and the validator that is the only way to build them.

use std::fmt;
use std::num::NonZeroU32;

use jiff::civil::{Date, Weekday};
use jiff::{Timestamp, Zoned};

use crate::error::ValidationError;
use crate::ics::rule_to_rrule;

/// Ordinals accepted by [`MonthlyRule::Weekday`]: first to fourth, or last.
pub const ORDINALS: [i8; 5] = [1, 2, 3, 4, -1];

/// How often a series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every n days
    Daily,
    /// Every n weeks, on one or more weekdays
    Weekly,
    /// Every n months, on a day of month or an ordinal weekday
    Monthly,
    /// Every n years, on the anchor's month and day
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

/// The day a monthly rule lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthlyRule {
    /// A fixed day, clamped to the month's length.
    DayOfMonth(u8),
    /// The nth (1 to 4) or last (-1) weekday of the month.
    Weekday {
        /// One of [`ORDINALS`]
        ordinal: i8,
        /// Day of the week
        weekday: Weekday,
    },
}

/// Inclusive end bound of a rule as given by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntilBound {
    /// Through the end of this day in the series' time zone.
    Date(Date),
    /// Up to and including this instant.
    Instant(Timestamp),
}

/// Unvalidated rule input.
///
/// Selectors that do not apply to the frequency are rejected by [`validate`]
/// rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    /// Repetition frequency
    pub frequency: Frequency,
    /// Periods between occurrences, at least 1
    pub interval: u32,
    /// Weekly only. Empty means the anchor's weekday.
    pub by_weekday: Vec<Weekday>,
    /// Monthly only, exclusive with `ordinal_weekday`
    pub day_of_month: Option<u8>,
    /// Monthly only, exclusive with `day_of_month`
    pub ordinal_weekday: Option<(i8, Weekday)>,
    /// Optional inclusive end
    pub until: Option<UntilBound>,
}

impl RuleDraft {
    /// A draft repeating every period, with no selectors and no end.
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_weekday: Vec::new(),
            day_of_month: None,
            ordinal_weekday: None,
            until: None,
        }
    }

    #[must_use]
    pub const fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.by_weekday = weekdays.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn day_of_month(mut self, day: u8) -> Self {
        self.day_of_month = Some(day);
        self
    }

    #[must_use]
    pub const fn nth_weekday(mut self, ordinal: i8, weekday: Weekday) -> Self {
        self.ordinal_weekday = Some((ordinal, weekday));
        self
    }

    #[must_use]
    pub const fn until(mut self, until: UntilBound) -> Self {
        self.until = Some(until);
        self
    }
}

impl From<&RecurrenceRule> for RuleDraft {
    fn from(rule: &RecurrenceRule) -> Self {
        let (day_of_month, ordinal_weekday) = match rule.monthly {
            Some(MonthlyRule::DayOfMonth(day)) => (Some(day), None),
            Some(MonthlyRule::Weekday { ordinal, weekday }) => (None, Some((ordinal, weekday))),
            None => (None, None),
        };
        Self {
            frequency: rule.frequency,
            interval: rule.interval.get(),
            by_weekday: rule.by_weekday.clone(),
            day_of_month,
            ordinal_weekday,
            until: rule.until.map(UntilBound::Instant),
        }
    }
}

/// A validated recurrence rule.
///
/// Only [`validate`] constructs one, so every rule held by a series
/// satisfies the invariants: interval at least 1, selectors matching the
/// frequency, and an end bound not before the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: NonZeroU32,
    by_weekday: Vec<Weekday>,
    monthly: Option<MonthlyRule>,
    until: Option<Timestamp>,
}

impl RecurrenceRule {
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub const fn interval(&self) -> NonZeroU32 {
        self.interval
    }

    /// Weekly selectors, Monday first and without duplicates.
    pub fn by_weekday(&self) -> &[Weekday] {
        &self.by_weekday
    }

    pub const fn monthly(&self) -> Option<MonthlyRule> {
        self.monthly
    }

    /// Inclusive end bound, second precision.
    pub const fn until(&self) -> Option<Timestamp> {
        self.until
    }
}

/// Formats as an RFC 5545 `RRULE` value.
impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        rule_to_rrule(self).fmt(f)
    }
}

/// Check a draft against the series anchor and build the rule.
///
/// # Errors
///
/// A [`ValidationError`] naming the first offending field.
pub fn validate(draft: RuleDraft, anchor_start: &Zoned) -> Result<RecurrenceRule, ValidationError> {
    let interval = NonZeroU32::new(draft.interval)
        .ok_or_else(|| ValidationError::new("interval", "must be at least 1"))?;

    if draft.frequency != Frequency::Weekly && !draft.by_weekday.is_empty() {
        return Err(ValidationError::new(
            "by_weekday",
            format!("only allowed with weekly frequency, not {}", draft.frequency),
        ));
    }

    let monthly = validate_monthly(&draft)?;

    let mut by_weekday = draft.by_weekday;
    by_weekday.sort_by_key(|wd| wd.to_monday_zero_offset());
    by_weekday.dedup();

    let until = draft
        .until
        .map(|bound| resolve_until(bound, anchor_start))
        .transpose()?;
    if let Some(until) = until
        && until < anchor_start.timestamp()
    {
        return Err(ValidationError::new(
            "until",
            format!("{until} is before the series start {anchor_start}"),
        ));
    }

    Ok(RecurrenceRule {
        frequency: draft.frequency,
        interval,
        by_weekday,
        monthly,
        until,
    })
}

fn validate_monthly(draft: &RuleDraft) -> Result<Option<MonthlyRule>, ValidationError> {
    if draft.frequency != Frequency::Monthly {
        if draft.day_of_month.is_some() || draft.ordinal_weekday.is_some() {
            return Err(ValidationError::new(
                "monthly",
                format!(
                    "day of month and ordinal weekday are only allowed with monthly frequency, not {}",
                    draft.frequency
                ),
            ));
        }
        return Ok(None);
    }

    match (draft.day_of_month, draft.ordinal_weekday) {
        (Some(_), Some(_)) => Err(ValidationError::new(
            "monthly",
            "give either a day of month or an ordinal weekday, not both",
        )),
        (None, None) => Err(ValidationError::new(
            "monthly",
            "a day of month or an ordinal weekday is required",
        )),
        (Some(day), None) if (1..=31).contains(&day) => Ok(Some(MonthlyRule::DayOfMonth(day))),
        (Some(day), None) => Err(ValidationError::new(
            "day_of_month",
            format!("{day} is outside 1..=31"),
        )),
        (None, Some((ordinal, weekday))) if ORDINALS.contains(&ordinal) => {
            Ok(Some(MonthlyRule::Weekday { ordinal, weekday }))
        }
        (None, Some((ordinal, _))) => Err(ValidationError::new(
            "ordinal",
            format!("{ordinal} is not one of 1, 2, 3, 4 or -1"),
        )),
    }
}

/// Date bounds cover the whole day in the anchor's zone; instants are
/// truncated to whole seconds.
fn resolve_until(bound: UntilBound, anchor_start: &Zoned) -> Result<Timestamp, ValidationError> {
    let ts = match bound {
        UntilBound::Instant(ts) => ts,
        UntilBound::Date(date) => date
            .tomorrow()
            .and_then(|next| next.to_zoned(anchor_start.time_zone().clone()))
            .map(|start_of_next| start_of_next.timestamp())
            .map_err(|e| ValidationError::new("until", e.to_string()))?
            .checked_sub(jiff::SignedDuration::from_secs(1))
            .map_err(|e| ValidationError::new("until", e.to_string()))?,
    };
    Timestamp::from_second(ts.as_second()).map_err(|e| ValidationError::new("until", e.to_string()))
}
