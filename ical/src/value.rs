// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Value type parsing for iCalendar property values.
//!
//! Only the value types needed by recurring events are supported: DATE,
//! DATE-TIME, RECUR and TEXT, as defined in RFC 5545 Section 3.3.

mod datetime;
mod miscellaneous;
mod rrule;
mod text;

pub use datetime::{DateOrDateTime, ValueDate, ValueDateTime, ValueTime, days_in_month};
pub use miscellaneous::ValueExpected;
pub use rrule::{RecurrenceFrequency, ValueRecurrenceRule, WeekDay, WeekDayNum};
pub use text::escape_text;

use chumsky::extra;
use chumsky::prelude::*;

use crate::value::datetime::{
    value_date, value_date_or_date_time, value_date_time, values_date_or_date_time,
};
use crate::value::rrule::value_rrule;
use crate::value::text::value_text;

/// A property value that does not match its value type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value {value:?}: {reason}")]
pub struct ValueError {
    /// Value type name, e.g. `DATE-TIME`
    pub kind: &'static str,
    /// The offending raw value
    pub value: String,
    /// Parser diagnostics
    pub reason: String,
}

fn run<'src, O>(
    kind: &'static str,
    src: &'src str,
    parser: impl Parser<'src, &'src str, O, extra::Err<Rich<'src, char>>>,
) -> Result<O, ValueError> {
    parser.parse(src).into_result().map_err(|errs| ValueError {
        kind,
        value: src.to_owned(),
        reason: errs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    })
}

/// Parse a DATE value such as `20250101`.
///
/// # Errors
/// If the value is malformed or names a date that does not exist.
pub fn parse_date(src: &str) -> Result<ValueDate, ValueError> {
    run("DATE", src, value_date())
}

/// Parse a DATE-TIME value such as `20250101T090000Z`.
///
/// # Errors
/// If the value is malformed or out of range.
pub fn parse_date_time(src: &str) -> Result<ValueDateTime, ValueError> {
    run("DATE-TIME", src, value_date_time())
}

/// Parse a value that may be either a DATE or a DATE-TIME.
///
/// # Errors
/// If the value is neither.
pub fn parse_date_or_date_time(src: &str) -> Result<DateOrDateTime, ValueError> {
    run("DATE-TIME", src, value_date_or_date_time())
}

/// Parse a COMMA-separated list of DATE or DATE-TIME values, as carried by
/// `EXDATE`.
///
/// # Errors
/// If any item is invalid.
pub fn parse_date_or_date_time_list(src: &str) -> Result<Vec<DateOrDateTime>, ValueError> {
    run("DATE-TIME", src, values_date_or_date_time())
}

/// Parse a RECUR value such as `FREQ=WEEKLY;BYDAY=MO,WE`.
///
/// Part names and enumerated values are case-insensitive (RFC 5545
/// Section 3.1).
///
/// # Errors
/// If the rule is malformed, repeats a part, lacks `FREQ`, or carries both
/// `UNTIL` and `COUNT`.
pub fn parse_rrule(src: &str) -> Result<ValueRecurrenceRule, ValueError> {
    let src = src.to_ascii_uppercase();
    run("RECUR", &src, value_rrule())
}

/// Parse a TEXT value, resolving its escape sequences.
///
/// # Errors
/// If the value contains an unknown escape sequence.
pub fn parse_text(src: &str) -> Result<String, ValueError> {
    run("TEXT", src, value_text())
}
