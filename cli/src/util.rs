// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use jiff::civil::{self, Weekday};
use jiff::{SignedDuration, Timestamp, Zoned};

/// The output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

const DATETIME_HINT: &str = "Expected one of: now, today, tomorrow, HH:MM, YYYY-MM-DD, \
YYYY-MM-DD HH:MM, an RFC 3339 timestamp or 2024-01-01T09:00[Europe/Berlin]";

/// Parse a point in time, reading local forms in the zone of `now`.
pub fn parse_datetime(now: &Zoned, dt: &str) -> Result<Zoned, Box<dyn Error>> {
    let dt = dt.trim();
    let tz = now.time_zone().clone();
    match dt {
        "now" => return Ok(now.clone()),
        "today" => return Ok(now.start_of_day()?),
        "tomorrow" => return Ok(now.tomorrow()?.start_of_day()?),
        _ => {}
    }

    if let Ok(zoned) = dt.parse::<Zoned>() {
        Ok(zoned)
    } else if let Ok(ts) = dt.parse::<Timestamp>() {
        Ok(ts.to_zoned(tz))
    } else if let Ok(datetime) = civil::DateTime::strptime("%Y-%m-%d %H:%M", dt) {
        Ok(datetime.to_zoned(tz)?)
    } else if let Ok(datetime) = dt.parse::<civil::DateTime>() {
        Ok(datetime.to_zoned(tz)?)
    } else if let Ok(time) = civil::Time::strptime("%H:%M", dt) {
        // A bare time means today
        Ok(now.date().to_datetime(time).to_zoned(tz)?)
    } else if let Ok(date) = dt.parse::<civil::Date>() {
        Ok(date.to_zoned(tz)?)
    } else {
        Err(format!("Invalid date and time {dt:?}. {DATETIME_HINT}").into())
    }
}

/// Parse the two ends of a window, defaulting to the week starting today.
pub fn parse_window(
    now: &Zoned,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Zoned, Zoned), Box<dyn Error>> {
    let from = match from {
        Some(from) => parse_datetime(now, from)?,
        None => now.start_of_day()?,
    };
    let to = match to {
        Some(to) => parse_datetime(now, to)?,
        None => from.checked_add(SignedDuration::from_hours(7 * 24))?,
    };
    if to < from {
        return Err(format!(
            "The window ends at {} before it starts at {}",
            format_datetime(&to),
            format_datetime(&from)
        )
        .into());
    }
    Ok((from, to))
}

/// Parse a weekday such as `MO`, `mon` or `Monday`.
pub fn parse_weekday(s: &str) -> Result<Weekday, String> {
    let lower = s.trim().to_ascii_lowercase();
    let weekday = match lower.get(..2) {
        Some("mo") => Weekday::Monday,
        Some("tu") => Weekday::Tuesday,
        Some("we") => Weekday::Wednesday,
        Some("th") => Weekday::Thursday,
        Some("fr") => Weekday::Friday,
        Some("sa") => Weekday::Saturday,
        Some("su") => Weekday::Sunday,
        _ => return Err(format!("Invalid weekday {s:?}, expected MO, TU, WE, TH, FR, SA or SU")),
    };
    let full = weekday_name(weekday);
    if full.starts_with(&lower) {
        Ok(weekday)
    } else {
        Err(format!("Invalid weekday {s:?}"))
    }
}

/// Parse an ordinal weekday such as `2TU` or `-1FR`.
pub fn parse_ordinal_weekday(s: &str) -> Result<(i8, Weekday), String> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| format!("Invalid ordinal weekday {s:?}, expected e.g. 2TU or -1FR"))?;
    let (ordinal, weekday) = s.split_at(split);
    let ordinal = ordinal
        .trim_start_matches('+')
        .parse()
        .map_err(|e| format!("Invalid ordinal in {s:?}: {e}"))?;
    Ok((ordinal, parse_weekday(weekday)?))
}

pub fn format_datetime(dt: &Zoned) -> String {
    dt.strftime("%Y-%m-%d %H:%M").to_string()
}

/// Format a span, leaving out the end date when it matches the start date.
pub fn format_span(start: &Zoned, end: &Zoned) -> String {
    let end = end.with_time_zone(start.time_zone().clone());
    if start.date() == end.date() {
        format!("{} ~ {}", format_datetime(start), end.strftime("%H:%M"))
    } else {
        format!("{} ~ {}", format_datetime(start), format_datetime(&end))
    }
}

const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}
