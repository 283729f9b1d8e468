// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! DATE and DATE-TIME values as defined in RFC 5545 Section 3.3.4 and 3.3.5.

use chumsky::Parser;
use chumsky::extra::ParserExtra;
use chumsky::label::LabelError;
use chumsky::prelude::*;

use crate::value::miscellaneous::{ValueExpected, fixed_digits};

/// Date value in the iCalendar format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueDate {
    /// Year component.
    pub year: i16,

    /// Month component, 1-12.
    pub month: i8,

    /// Day component, 1-31 depending on the month.
    pub day: i8,
}

impl ValueDate {
    /// Creates a date, returning `None` when it does not exist.
    #[must_use]
    pub fn new(year: i16, month: i8, day: i8) -> Option<Self> {
        let valid = (1..=9999).contains(&year)
            && (1..=12).contains(&month)
            && day >= 1
            && day <= days_in_month(year, month);
        valid.then_some(Self { year, month, day })
    }

    /// Convert to `jiff::civil::Date`.
    #[cfg(feature = "jiff")]
    #[must_use]
    pub fn civil_date(self) -> jiff::civil::Date {
        self.into()
    }
}

#[cfg(feature = "jiff")]
impl From<ValueDate> for jiff::civil::Date {
    fn from(value: ValueDate) -> Self {
        jiff::civil::date(value.year, value.month, value.day)
    }
}

#[cfg(feature = "jiff")]
impl From<jiff::civil::Date> for ValueDate {
    fn from(value: jiff::civil::Date) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
        }
    }
}

/// Number of days in the given month of the proleptic Gregorian calendar.
#[must_use]
pub fn days_in_month(year: i16, month: i8) -> i8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

const fn is_leap_year(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Format Definition:  This value type is defined by the following notation:
///
/// ```txt
/// date               = date-value
///
/// date-value         = date-fullyear date-month date-mday
/// date-fullyear      = 4DIGIT
/// date-month         = 2DIGIT        ;01-12
/// date-mday          = 2DIGIT        ;01-28, 01-29, 01-30, 01-31
///                                    ;based on month/year
/// ```
pub(crate) fn value_date<'src, I, E>() -> impl Parser<'src, I, ValueDate, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    fixed_digits(4)
        .then(fixed_digits(2))
        .then(fixed_digits(2))
        .try_map(|((year, month), day), span| {
            let date = match (
                i16::try_from(year),
                i8::try_from(month),
                i8::try_from(day),
            ) {
                (Ok(year), Ok(month), Ok(day)) => ValueDate::new(year, month, day),
                _ => None,
            };
            date.ok_or_else(|| E::Error::expected_found([ValueExpected::Date], None, span))
        })
}

/// Time value defined in RFC 5545 Section 3.3.12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueTime {
    /// Hour component, 0-23.
    pub hour: u8,

    /// Minute component, 0-59.
    pub minute: u8,

    /// Second component, 0-60. The value 60 denotes a leap second.
    pub second: u8,

    /// Whether the time carries the UTC designator `Z`.
    pub utc: bool,
}

impl ValueTime {
    /// Midnight, floating.
    pub const MIDNIGHT: Self = Self {
        hour: 0,
        minute: 0,
        second: 0,
        utc: false,
    };
}

#[cfg(feature = "jiff")]
impl From<ValueTime> for jiff::civil::Time {
    fn from(value: ValueTime) -> Self {
        let narrow = |n: u8| i8::try_from(n).unwrap_or(0);
        // jiff has no leap seconds
        let second = value.second.min(59);
        jiff::civil::time(narrow(value.hour), narrow(value.minute), narrow(second), 0)
    }
}

/// Format Definition:  This value type is defined by the following notation:
///
/// ```txt
/// time         = time-hour time-minute time-second [time-utc]
///
/// time-hour    = 2DIGIT        ;00-23
/// time-minute  = 2DIGIT        ;00-59
/// time-second  = 2DIGIT        ;00-60
/// time-utc     = "Z"
/// ```
pub(crate) fn value_time<'src, I, E>() -> impl Parser<'src, I, ValueTime, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    fixed_digits(2)
        .then(fixed_digits(2))
        .then(fixed_digits(2))
        .then(just('Z').or_not().map(|z| z.is_some()))
        .try_map(|(((hour, minute), second), utc), span| {
            match (u8::try_from(hour), u8::try_from(minute), u8::try_from(second)) {
                (Ok(hour @ 0..=23), Ok(minute @ 0..=59), Ok(second @ 0..=60)) => Ok(ValueTime {
                    hour,
                    minute,
                    second,
                    utc,
                }),
                _ => Err(E::Error::expected_found([ValueExpected::Time], None, span)),
            }
        })
}

/// Date-Time value defined in the RFC 5545 Section 3.3.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueDateTime {
    /// Date component.
    pub date: ValueDate,

    /// Time component.
    pub time: ValueTime,
}

impl ValueDateTime {
    /// Whether this date-time is in UTC form.
    #[must_use]
    pub const fn is_utc(&self) -> bool {
        self.time.utc
    }

    /// Convert to `jiff::civil::DateTime`, dropping the UTC marker.
    #[cfg(feature = "jiff")]
    #[must_use]
    pub fn civil_date_time(&self) -> jiff::civil::DateTime {
        jiff::civil::DateTime::from_parts(self.date.into(), self.time.into())
    }
}

#[cfg(feature = "jiff")]
impl From<jiff::civil::DateTime> for ValueDateTime {
    fn from(value: jiff::civil::DateTime) -> Self {
        let time = ValueTime {
            hour: value.hour().unsigned_abs(),
            minute: value.minute().unsigned_abs(),
            second: value.second().unsigned_abs(),
            utc: false,
        };
        Self {
            date: value.date().into(),
            time,
        }
    }
}

#[cfg(feature = "jiff")]
impl From<jiff::Timestamp> for ValueDateTime {
    fn from(value: jiff::Timestamp) -> Self {
        let mut dt = Self::from(value.to_zoned(jiff::tz::TimeZone::UTC).datetime());
        dt.time.utc = true;
        dt
    }
}

/// Format Definition:  This value type is defined by the following notation:
///
/// ```txt
/// date-time  = date "T" time ;As specified in the DATE and TIME
/// ```
pub(crate) fn value_date_time<'src, I, E>() -> impl Parser<'src, I, ValueDateTime, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    value_date()
        .then_ignore(just('T'))
        .then(value_time())
        .map(|(date, time)| ValueDateTime { date, time })
}

/// Either a DATE or a DATE-TIME, as accepted by `DTSTART`, `EXDATE`,
/// `RECURRENCE-ID` and the `UNTIL` rule part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateOrDateTime {
    /// A whole day.
    Date(ValueDate),
    /// A specific instant, floating or UTC.
    DateTime(ValueDateTime),
}

impl DateOrDateTime {
    /// The calendar date portion.
    #[must_use]
    pub const fn date(&self) -> ValueDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(dt) => dt.date,
        }
    }
}

impl From<ValueDate> for DateOrDateTime {
    fn from(value: ValueDate) -> Self {
        Self::Date(value)
    }
}

impl From<ValueDateTime> for DateOrDateTime {
    fn from(value: ValueDateTime) -> Self {
        Self::DateTime(value)
    }
}

pub(crate) fn value_date_or_date_time<'src, I, E>()
-> impl Parser<'src, I, DateOrDateTime, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    value_date()
        .then(just('T').ignore_then(value_time()).or_not())
        .map(|(date, time)| match time {
            Some(time) => DateOrDateTime::DateTime(ValueDateTime { date, time }),
            None => DateOrDateTime::Date(date),
        })
}

/// Multiple values are specified as a COMMA-separated list.
pub(crate) fn values_date_or_date_time<'src, I, E>()
-> impl Parser<'src, I, Vec<DateOrDateTime>, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    value_date_or_date_time()
        .separated_by(just(','))
        .at_least(1)
        .collect()
}
