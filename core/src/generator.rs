// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Expansion of a series into the original start instants of its
//! occurrences inside a finite window.
//!
//! All calendar arithmetic happens in the anchor's time zone at the anchor's
//! wall-clock time. Wall-clock times skipped or repeated by a DST transition
//! resolve with jiff's compatible disambiguation. Iteration starts at the
//! first period that can reach the window instead of walking from the
//! anchor, so far-future windows cost the same as near ones.

use jiff::civil::{Date, Time};
use jiff::tz::TimeZone;
use jiff::{Span, Timestamp, Zoned};

use crate::error::{Error, ValidationError};
use crate::rule::{Frequency, MonthlyRule, RecurrenceRule};
use crate::series::Series;

/// Default ceiling on occurrences produced by a single expansion.
pub const DEFAULT_LIMIT: usize = 10_000;

/// Original starts of `series` within `[window_start, window_end]`,
/// ascending and without duplicates.
///
/// The anchor is always the first occurrence, even when it does not match
/// the rule's selectors.
///
/// # Errors
///
/// - [`Error::Validation`] if `window_start > window_end`.
/// - [`Error::ExpansionOverflow`] if more than `limit` occurrences fall in
///   the window.
pub fn generate(
    series: &Series,
    window_start: Timestamp,
    window_end: Timestamp,
    limit: usize,
) -> Result<Vec<Zoned>, Error> {
    check_window(window_start, window_end)?;

    let anchor = series.anchor_start();
    let end_bound = series
        .recurrence()
        .and_then(RecurrenceRule::until)
        .map_or(window_end, |until| until.min(window_end));
    let mut out = Collector {
        items: Vec::new(),
        window_start,
        limit,
    };

    if anchor.timestamp() <= end_bound {
        out.push(anchor.clone())?;
    }

    let Some(rule) = series.recurrence() else {
        return Ok(out.items);
    };

    let tz = anchor.time_zone();
    let expander = Expander {
        rule,
        anchor_date: anchor.date(),
        anchor_week_start: week_start(anchor.date()),
    };
    let first = expander.first_period(window_start.to_zoned(tz.clone()).date());

    'periods: for k in first.. {
        let Some(dates) = expander.period(k) else {
            break;
        };
        for date in dates {
            let Some(candidate) = at_anchor_time(date, anchor.time(), tz) else {
                break 'periods;
            };
            if candidate.timestamp() <= anchor.timestamp() {
                continue;
            }
            if candidate.timestamp() > end_bound {
                break 'periods;
            }
            out.push(candidate)?;
        }
    }

    tracing::trace!(series_id = series.id(), count = out.items.len(), "expanded series");
    Ok(out.items)
}

pub(crate) fn check_window(window_start: Timestamp, window_end: Timestamp) -> Result<(), Error> {
    if window_start > window_end {
        return Err(ValidationError::new(
            "window",
            format!("start {window_start} is after end {window_end}"),
        )
        .into());
    }
    Ok(())
}

struct Collector {
    items: Vec<Zoned>,
    window_start: Timestamp,
    limit: usize,
}

impl Collector {
    fn push(&mut self, candidate: Zoned) -> Result<(), Error> {
        if candidate.timestamp() < self.window_start {
            return Ok(());
        }
        if self.items.len() >= self.limit {
            return Err(Error::ExpansionOverflow { limit: self.limit });
        }
        self.items.push(candidate);
        Ok(())
    }
}

struct Expander<'a> {
    rule: &'a RecurrenceRule,
    anchor_date: Date,
    anchor_week_start: Date,
}

impl Expander<'_> {
    fn interval(&self) -> i64 {
        i64::from(self.rule.interval().get())
    }

    /// Index of the first period that may contain a date on or after
    /// `target`, one period early to absorb zone offsets.
    fn first_period(&self, target: Date) -> i64 {
        if target <= self.anchor_date {
            return 0;
        }
        let elapsed = match self.rule.frequency() {
            Frequency::Daily => days_between(self.anchor_date, target),
            Frequency::Weekly => days_between(self.anchor_week_start, target) / 7,
            Frequency::Monthly => month_index(target) - month_index(self.anchor_date),
            Frequency::Yearly => i64::from(target.year()) - i64::from(self.anchor_date.year()),
        };
        (elapsed / self.interval() - 1).max(0)
    }

    /// Candidate dates of period `k`, ascending; `None` past the end of the
    /// supported calendar range.
    fn period(&self, k: i64) -> Option<Vec<Date>> {
        let step = k.checked_mul(self.interval())?;
        match self.rule.frequency() {
            Frequency::Daily => Some(vec![add_days(self.anchor_date, step)?]),
            Frequency::Weekly => {
                let start = add_days(self.anchor_week_start, step.checked_mul(7)?)?;
                let weekdays = self.rule.by_weekday();
                if weekdays.is_empty() {
                    let offset = self.anchor_date.weekday().to_monday_zero_offset();
                    return Some(vec![add_days(start, offset.into())?]);
                }
                weekdays
                    .iter()
                    .map(|wd| add_days(start, wd.to_monday_zero_offset().into()))
                    .collect()
            }
            Frequency::Monthly => {
                let index = month_index(self.anchor_date).checked_add(step)?;
                let year = i16::try_from(index.div_euclid(12)).ok()?;
                let month = i8::try_from(index.rem_euclid(12) + 1).ok()?;
                let first = Date::new(year, month, 1).ok()?;
                let date = match self.rule.monthly() {
                    Some(MonthlyRule::Weekday { ordinal, weekday }) => {
                        first.nth_weekday_of_month(ordinal, weekday).ok()?
                    }
                    Some(MonthlyRule::DayOfMonth(day)) => clamp_day(first, day)?,
                    None => clamp_day(first, self.anchor_date.day().unsigned_abs())?,
                };
                Some(vec![date])
            }
            Frequency::Yearly => {
                let year = i64::from(self.anchor_date.year()).checked_add(step)?;
                let year = i16::try_from(year).ok()?;
                let first = Date::new(year, self.anchor_date.month(), 1).ok()?;
                Some(vec![clamp_day(first, self.anchor_date.day().unsigned_abs())?])
            }
        }
    }
}

/// Day `day` of `first`'s month, or the month's last day if it is shorter.
fn clamp_day(first: Date, day: u8) -> Option<Date> {
    let last = first.days_in_month();
    let day = i8::try_from(day).ok()?.min(last);
    Date::new(first.year(), first.month(), day).ok()
}

fn week_start(date: Date) -> Date {
    let offset = date.weekday().to_monday_zero_offset();
    add_days(date, -i64::from(offset)).unwrap_or(date)
}

fn add_days(date: Date, days: i64) -> Option<Date> {
    let span = Span::new().try_days(days).ok()?;
    date.checked_add(span).ok()
}

fn days_between(from: Date, to: Date) -> i64 {
    from.until(to).map_or(0, |span| i64::from(span.get_days()))
}

fn month_index(date: Date) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month()) - 1
}

fn at_anchor_time(date: Date, time: Time, tz: &TimeZone) -> Option<Zoned> {
    date.to_datetime(time).to_zoned(tz.clone()).ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::{Weekday, date};

    use super::*;
    use crate::rule::{RuleDraft, UntilBound};
    use crate::series::SeriesDraft;

    fn series(start: Zoned, rule: Option<RuleDraft>) -> Series {
        let draft = SeriesDraft {
            title: "t".into(),
            description: String::new(),
            end: start.clone(),
            start,
            recurrence: rule,
        };
        Series::new("s", draft).unwrap()
    }

    fn utc(y: i16, m: i8, d: i8, h: i8) -> Zoned {
        date(y, m, d).at(h, 0, 0, 0).in_tz("UTC").unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn dates(out: &[Zoned]) -> Vec<Date> {
        out.iter().map(Zoned::date).collect()
    }

    #[test]
    fn single_event_is_its_anchor() {
        let s = series(utc(2024, 1, 1, 9), None);
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-12-31T00:00Z"), 10).unwrap();
        assert_eq!(dates(&out), [date(2024, 1, 1)]);

        let out = generate(&s, ts("2024-01-02T00:00Z"), ts("2024-12-31T00:00Z"), 10).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn daily_with_interval() {
        let s = series(
            utc(2024, 1, 1, 9),
            Some(RuleDraft::new(Frequency::Daily).interval(3)),
        );
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-01-12T00:00Z"), 100).unwrap();
        assert_eq!(
            dates(&out),
            [
                date(2024, 1, 1),
                date(2024, 1, 4),
                date(2024, 1, 7),
                date(2024, 1, 10)
            ]
        );
    }

    #[test]
    fn far_window_skips_ahead_without_overflow() {
        let s = series(utc(2000, 1, 1, 9), Some(RuleDraft::new(Frequency::Daily)));
        let out = generate(&s, ts("2090-06-01T00:00Z"), ts("2090-06-03T23:00Z"), 5).unwrap();
        assert_eq!(
            dates(&out),
            [date(2090, 6, 1), date(2090, 6, 2), date(2090, 6, 3)]
        );
    }

    #[test]
    fn weekly_uses_anchor_weekday_by_default() {
        // 2024-01-03 is a Wednesday
        let s = series(
            utc(2024, 1, 3, 9),
            Some(RuleDraft::new(Frequency::Weekly).interval(2)),
        );
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-02-01T00:00Z"), 100).unwrap();
        assert_eq!(
            dates(&out),
            [date(2024, 1, 3), date(2024, 1, 17), date(2024, 1, 31)]
        );
    }

    #[test]
    fn weekly_anchor_is_first_even_off_selector() {
        // anchor on a Tuesday, rule on Mondays and Fridays
        let rule = RuleDraft::new(Frequency::Weekly).weekdays([Weekday::Monday, Weekday::Friday]);
        let s = series(utc(2024, 1, 2, 9), Some(rule));
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-01-09T00:00Z"), 100).unwrap();
        assert_eq!(
            dates(&out),
            [date(2024, 1, 2), date(2024, 1, 5), date(2024, 1, 8)]
        );
    }

    #[test]
    fn monthly_last_friday() {
        let rule = RuleDraft::new(Frequency::Monthly).nth_weekday(-1, Weekday::Friday);
        let s = series(utc(2024, 1, 26, 12), Some(rule));
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-04-30T00:00Z"), 100).unwrap();
        assert_eq!(
            dates(&out),
            [
                date(2024, 1, 26),
                date(2024, 2, 23),
                date(2024, 3, 29),
                date(2024, 4, 26)
            ]
        );
    }

    #[test]
    fn yearly_leap_day_clamps() {
        let s = series(utc(2024, 2, 29, 8), Some(RuleDraft::new(Frequency::Yearly)));
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2028-12-31T00:00Z"), 100).unwrap();
        assert_eq!(
            dates(&out),
            [
                date(2024, 2, 29),
                date(2025, 2, 28),
                date(2026, 2, 28),
                date(2027, 2, 28),
                date(2028, 2, 29)
            ]
        );
    }

    #[test]
    fn until_bound_is_inclusive() {
        let rule = RuleDraft::new(Frequency::Daily).until(UntilBound::Instant(ts("2024-01-03T09:00Z")));
        let s = series(utc(2024, 1, 1, 9), Some(rule));
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-02-01T00:00Z"), 100).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn until_equal_to_sub_second_anchor_keeps_the_anchor() {
        let anchor = date(2024, 1, 1).at(9, 0, 0, 123_456_789).in_tz("UTC").unwrap();
        let rule = RuleDraft::new(Frequency::Daily).until(UntilBound::Instant(anchor.timestamp()));
        let s = series(anchor, Some(rule));
        let out = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-02-01T00:00Z"), 100).unwrap();
        assert_eq!(out, [utc(2024, 1, 1, 9)]);
    }

    #[test]
    fn keeps_wall_clock_time_across_dst() {
        let start = date(2024, 3, 30)
            .at(9, 0, 0, 0)
            .in_tz("Europe/Berlin")
            .unwrap();
        let s = series(start, Some(RuleDraft::new(Frequency::Daily)));
        let out = generate(&s, ts("2024-03-30T00:00Z"), ts("2024-04-01T00:00Z"), 10).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|z| z.hour() == 9));
        assert_eq!(out[0].offset().seconds(), 3600);
        assert_eq!(out[1].offset().seconds(), 7200);
    }

    #[test]
    fn overflow_is_an_error_not_a_truncation() {
        let s = series(utc(2024, 1, 1, 9), Some(RuleDraft::new(Frequency::Daily)));
        let err = generate(&s, ts("2024-01-01T00:00Z"), ts("2024-12-31T00:00Z"), 10).unwrap_err();
        assert!(matches!(err, Error::ExpansionOverflow { limit: 10 }));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let s = series(utc(2024, 1, 1, 9), None);
        let err = generate(&s, ts("2024-02-01T00:00Z"), ts("2024-01-01T00:00Z"), 10).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError { field: "window", .. })));
    }
}
