// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! RECUR value as defined in RFC 5545 Section 3.3.10.

use chumsky::extra::ParserExtra;
use chumsky::input::Input;
use chumsky::label::LabelError;
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::keyword::{
    KW_DAY_FR, KW_DAY_MO, KW_DAY_SA, KW_DAY_SU, KW_DAY_TH, KW_DAY_TU, KW_DAY_WE, KW_RRULE_BYDAY,
    KW_RRULE_BYHOUR, KW_RRULE_BYMINUTE, KW_RRULE_BYMONTH, KW_RRULE_BYMONTHDAY, KW_RRULE_BYSECOND,
    KW_RRULE_BYSETPOS, KW_RRULE_BYWEEKNO, KW_RRULE_BYYEARDAY, KW_RRULE_COUNT, KW_RRULE_FREQ,
    KW_RRULE_FREQ_DAILY, KW_RRULE_FREQ_HOURLY, KW_RRULE_FREQ_MINUTELY, KW_RRULE_FREQ_MONTHLY,
    KW_RRULE_FREQ_SECONDLY, KW_RRULE_FREQ_WEEKLY, KW_RRULE_FREQ_YEARLY, KW_RRULE_INTERVAL,
    KW_RRULE_UNTIL, KW_RRULE_WKST,
};
use crate::value::datetime::{DateOrDateTime, value_date_or_date_time};
use crate::value::miscellaneous::{ValueExpected, value_positive, value_ranged};

/// A parsed recurrence rule.
///
/// Every rule part of the grammar is kept, so consumers can reject the parts
/// they do not support instead of silently ignoring them. Numeric lists keep
/// their signs; ranges have already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecurrenceRule {
    /// Frequency of recurrence
    pub freq: RecurrenceFrequency,
    /// Inclusive end bound
    pub until: Option<DateOrDateTime>,
    /// Number of occurrences
    pub count: Option<u32>,
    /// Interval between recurrences
    pub interval: Option<u32>,
    /// 0 to 60
    pub by_second: Vec<i16>,
    /// 0 to 59
    pub by_minute: Vec<i16>,
    /// 0 to 23
    pub by_hour: Vec<i16>,
    /// Day of week with optional ordinal
    pub by_day: Vec<WeekDayNum>,
    /// -31 to -1 and 1 to 31
    pub by_month_day: Vec<i16>,
    /// -366 to -1 and 1 to 366
    pub by_year_day: Vec<i16>,
    /// -53 to -1 and 1 to 53
    pub by_week_no: Vec<i16>,
    /// 1 to 12
    pub by_month: Vec<i16>,
    /// -366 to -1 and 1 to 366
    pub by_set_pos: Vec<i16>,
    /// Start day of week
    pub wkst: Option<WeekDay>,
}

impl ValueRecurrenceRule {
    /// A rule with only the frequency set.
    #[must_use]
    pub const fn new(freq: RecurrenceFrequency) -> Self {
        Self {
            freq,
            until: None,
            count: None,
            interval: None,
            by_second: Vec::new(),
            by_minute: Vec::new(),
            by_hour: Vec::new(),
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            wkst: None,
        }
    }
}

/// Recurrence frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[expect(missing_docs)]
pub enum RecurrenceFrequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(ascii_case_insensitive)]
#[expect(missing_docs)]
pub enum WeekDay {
    #[strum(serialize = "SU")]
    Sunday,
    #[strum(serialize = "MO")]
    Monday,
    #[strum(serialize = "TU")]
    Tuesday,
    #[strum(serialize = "WE")]
    Wednesday,
    #[strum(serialize = "TH")]
    Thursday,
    #[strum(serialize = "FR")]
    Friday,
    #[strum(serialize = "SA")]
    Saturday,
}

#[cfg(feature = "jiff")]
impl From<WeekDay> for jiff::civil::Weekday {
    fn from(value: WeekDay) -> Self {
        match value {
            WeekDay::Sunday => Self::Sunday,
            WeekDay::Monday => Self::Monday,
            WeekDay::Tuesday => Self::Tuesday,
            WeekDay::Wednesday => Self::Wednesday,
            WeekDay::Thursday => Self::Thursday,
            WeekDay::Friday => Self::Friday,
            WeekDay::Saturday => Self::Saturday,
        }
    }
}

#[cfg(feature = "jiff")]
impl From<jiff::civil::Weekday> for WeekDay {
    fn from(value: jiff::civil::Weekday) -> Self {
        match value {
            jiff::civil::Weekday::Sunday => Self::Sunday,
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
        }
    }
}

/// Day of week with optional ordinal, e.g. `MO`, `2TU` or `-1FR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekDayNum {
    /// Day of the week
    pub day: WeekDay,
    /// Occurrence within the period, -53 to -1 and 1 to 53
    pub occurrence: Option<i8>,
}

impl From<WeekDay> for WeekDayNum {
    fn from(day: WeekDay) -> Self {
        Self {
            day,
            occurrence: None,
        }
    }
}

/// Format Definition:  This value type is defined by the following notation:
///
/// ```txt
/// recur           = recur-rule-part *( ";" recur-rule-part )
///                 ;
///                 ; The FREQ rule part is REQUIRED,
///                 ; but MUST NOT occur more than once.
///                 ;
///                 ; The UNTIL or COUNT rule parts are OPTIONAL,
///                 ; but they MUST NOT occur in the same 'recur'.
///                 ;
///                 ; The other rule parts are OPTIONAL,
///                 ; but MUST NOT occur more than once.
/// ```
pub(crate) fn value_rrule<'src, I, E>() -> impl Parser<'src, I, ValueRecurrenceRule, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    recur_rule_part()
        .separated_by(just(';'))
        .at_least(1)
        .collect::<Vec<_>>()
        .try_map(|parts, span| {
            build_from_parts(parts).map_err(|exp| E::Error::expected_found([exp], None, span))
        })
}

#[derive(Debug, Clone)]
enum Part {
    Freq(RecurrenceFrequency),
    Until(DateOrDateTime),
    Count(u32),
    Interval(u32),
    BySecond(Vec<i16>),
    ByMinute(Vec<i16>),
    ByHour(Vec<i16>),
    ByDay(Vec<WeekDayNum>),
    ByMonthDay(Vec<i16>),
    ByYearDay(Vec<i16>),
    ByWeekNo(Vec<i16>),
    ByMonth(Vec<i16>),
    BySetPos(Vec<i16>),
    Wkst(WeekDay),
}

#[derive(Default)]
struct PartsBuilder {
    freq: Option<RecurrenceFrequency>,
    until: Option<DateOrDateTime>,
    count: Option<u32>,
    interval: Option<u32>,
    by_second: Option<Vec<i16>>,
    by_minute: Option<Vec<i16>>,
    by_hour: Option<Vec<i16>>,
    by_day: Option<Vec<WeekDayNum>>,
    by_month_day: Option<Vec<i16>>,
    by_year_day: Option<Vec<i16>>,
    by_week_no: Option<Vec<i16>>,
    by_month: Option<Vec<i16>>,
    by_set_pos: Option<Vec<i16>>,
    wkst: Option<WeekDay>,
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), ValueExpected> {
    match slot.replace(value) {
        Some(_) => Err(ValueExpected::DuplicatePart),
        None => Ok(()),
    }
}

fn build_from_parts(parts: Vec<Part>) -> Result<ValueRecurrenceRule, ValueExpected> {
    let mut b = PartsBuilder::default();
    for part in parts {
        match part {
            Part::Freq(v) => set_once(&mut b.freq, v)?,
            Part::Until(v) => set_once(&mut b.until, v)?,
            Part::Count(v) => set_once(&mut b.count, v)?,
            Part::Interval(v) => set_once(&mut b.interval, v)?,
            Part::BySecond(v) => set_once(&mut b.by_second, v)?,
            Part::ByMinute(v) => set_once(&mut b.by_minute, v)?,
            Part::ByHour(v) => set_once(&mut b.by_hour, v)?,
            Part::ByDay(v) => set_once(&mut b.by_day, v)?,
            Part::ByMonthDay(v) => set_once(&mut b.by_month_day, v)?,
            Part::ByYearDay(v) => set_once(&mut b.by_year_day, v)?,
            Part::ByWeekNo(v) => set_once(&mut b.by_week_no, v)?,
            Part::ByMonth(v) => set_once(&mut b.by_month, v)?,
            Part::BySetPos(v) => set_once(&mut b.by_set_pos, v)?,
            Part::Wkst(v) => set_once(&mut b.wkst, v)?,
        }
    }

    let freq = b.freq.ok_or(ValueExpected::MissingFreq)?;
    if b.until.is_some() && b.count.is_some() {
        return Err(ValueExpected::UntilWithCount);
    }

    Ok(ValueRecurrenceRule {
        freq,
        until: b.until,
        count: b.count,
        interval: b.interval,
        by_second: b.by_second.unwrap_or_default(),
        by_minute: b.by_minute.unwrap_or_default(),
        by_hour: b.by_hour.unwrap_or_default(),
        by_day: b.by_day.unwrap_or_default(),
        by_month_day: b.by_month_day.unwrap_or_default(),
        by_year_day: b.by_year_day.unwrap_or_default(),
        by_week_no: b.by_week_no.unwrap_or_default(),
        by_month: b.by_month.unwrap_or_default(),
        by_set_pos: b.by_set_pos.unwrap_or_default(),
        wkst: b.wkst,
    })
}

/// ```txt
/// recur-rule-part = ( "FREQ" "=" freq )
///                 / ( "UNTIL" "=" enddate )
///                 / ( "COUNT" "=" 1*DIGIT )
///                 / ( "INTERVAL" "=" 1*DIGIT )
///                 / ( "BYSECOND" "=" byseclist )
///                 / ( "BYMINUTE" "=" byminlist )
///                 / ( "BYHOUR" "=" byhrlist )
///                 / ( "BYDAY" "=" bywdaylist )
///                 / ( "BYMONTHDAY" "=" bymodaylist )
///                 / ( "BYYEARDAY" "=" byyrdaylist )
///                 / ( "BYWEEKNO" "=" bywknolist )
///                 / ( "BYMONTH" "=" bymolist )
///                 / ( "BYSETPOS" "=" bysplist )
///                 / ( "WKST" "=" weekday )
/// ```
fn recur_rule_part<'src, I, E>() -> impl Parser<'src, I, Part, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    let kw = |kw| just(kw).ignore_then(just('='));
    let list = |min, max, signed| {
        value_ranged(min, max, signed)
            .separated_by(just(','))
            .at_least(1)
            .collect::<Vec<_>>()
    };

    choice((
        kw(KW_RRULE_FREQ).ignore_then(freq()).map(Part::Freq),
        kw(KW_RRULE_UNTIL)
            .ignore_then(value_date_or_date_time())
            .map(Part::Until),
        kw(KW_RRULE_COUNT)
            .ignore_then(value_positive())
            .map(Part::Count),
        kw(KW_RRULE_INTERVAL)
            .ignore_then(value_positive())
            .map(Part::Interval),
        kw(KW_RRULE_BYSECOND)
            .ignore_then(list(0, 60, false))
            .map(Part::BySecond),
        kw(KW_RRULE_BYMINUTE)
            .ignore_then(list(0, 59, false))
            .map(Part::ByMinute),
        kw(KW_RRULE_BYHOUR)
            .ignore_then(list(0, 23, false))
            .map(Part::ByHour),
        kw(KW_RRULE_BYDAY)
            .ignore_then(weekdaynum().separated_by(just(',')).at_least(1).collect())
            .map(Part::ByDay),
        kw(KW_RRULE_BYMONTHDAY)
            .ignore_then(list(1, 31, true))
            .map(Part::ByMonthDay),
        kw(KW_RRULE_BYYEARDAY)
            .ignore_then(list(1, 366, true))
            .map(Part::ByYearDay),
        kw(KW_RRULE_BYWEEKNO)
            .ignore_then(list(1, 53, true))
            .map(Part::ByWeekNo),
        kw(KW_RRULE_BYMONTH)
            .ignore_then(list(1, 12, false))
            .map(Part::ByMonth),
        kw(KW_RRULE_BYSETPOS)
            .ignore_then(list(1, 366, true))
            .map(Part::BySetPos),
        kw(KW_RRULE_WKST).ignore_then(weekday()).map(Part::Wkst),
    ))
}

/// ```txt
/// freq        = "SECONDLY" / "MINUTELY" / "HOURLY" / "DAILY"
///             / "WEEKLY" / "MONTHLY" / "YEARLY"
/// ```
fn freq<'src, I, E>() -> impl Parser<'src, I, RecurrenceFrequency, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
{
    choice((
        just(KW_RRULE_FREQ_SECONDLY).to(RecurrenceFrequency::Secondly),
        just(KW_RRULE_FREQ_MINUTELY).to(RecurrenceFrequency::Minutely),
        just(KW_RRULE_FREQ_HOURLY).to(RecurrenceFrequency::Hourly),
        just(KW_RRULE_FREQ_DAILY).to(RecurrenceFrequency::Daily),
        just(KW_RRULE_FREQ_WEEKLY).to(RecurrenceFrequency::Weekly),
        just(KW_RRULE_FREQ_MONTHLY).to(RecurrenceFrequency::Monthly),
        just(KW_RRULE_FREQ_YEARLY).to(RecurrenceFrequency::Yearly),
    ))
}

/// ```txt
/// weekdaynum  = [[plus / minus] ordwk] weekday
/// ordwk       = 1*2DIGIT       ;1 to 53
/// ```
fn weekdaynum<'src, I, E>() -> impl Parser<'src, I, WeekDayNum, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
    E::Error: LabelError<'src, I, ValueExpected>,
{
    value_ranged(1, 53, true)
        .or_not()
        .then(weekday())
        .map(|(occurrence, day)| WeekDayNum {
            day,
            occurrence: occurrence.and_then(|n| i8::try_from(n).ok()),
        })
}

/// ```txt
/// weekday     = "SU" / "MO" / "TU" / "WE" / "TH" / "FR" / "SA"
/// ```
fn weekday<'src, I, E>() -> impl Parser<'src, I, WeekDay, E> + Clone
where
    I: Input<'src, Token = char, Span = SimpleSpan>,
    E: ParserExtra<'src, I>,
{
    choice((
        just(KW_DAY_SU).to(WeekDay::Sunday),
        just(KW_DAY_MO).to(WeekDay::Monday),
        just(KW_DAY_TU).to(WeekDay::Tuesday),
        just(KW_DAY_WE).to(WeekDay::Wednesday),
        just(KW_DAY_TH).to(WeekDay::Thursday),
        just(KW_DAY_FR).to(WeekDay::Friday),
        just(KW_DAY_SA).to(WeekDay::Saturday),
    ))
}
