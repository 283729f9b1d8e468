// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Textual forms of the supported value types, as defined in RFC 5545
//! Section 3.3.

use std::fmt::{self, Display};

use crate::keyword::{
    KW_RRULE_BYDAY, KW_RRULE_BYHOUR, KW_RRULE_BYMINUTE, KW_RRULE_BYMONTH, KW_RRULE_BYMONTHDAY,
    KW_RRULE_BYSECOND, KW_RRULE_BYSETPOS, KW_RRULE_BYWEEKNO, KW_RRULE_BYYEARDAY, KW_RRULE_COUNT,
    KW_RRULE_FREQ, KW_RRULE_INTERVAL, KW_RRULE_UNTIL, KW_RRULE_WKST,
};
use crate::value::{
    DateOrDateTime, ValueDate, ValueDateTime, ValueRecurrenceRule, ValueTime, WeekDayNum,
};

impl Display for ValueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl Display for ValueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}", self.hour, self.minute, self.second)?;
        if self.utc {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

impl Display for ValueDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

impl Display for DateOrDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => date.fmt(f),
            Self::DateTime(dt) => dt.fmt(f),
        }
    }
}

impl Display for WeekDayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.occurrence {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.day)
    }
}

/// Rule parts are written in a fixed order so equal rules format equally.
impl Display for ValueRecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KW_RRULE_FREQ}={}", self.freq)?;
        if let Some(until) = &self.until {
            write!(f, ";{KW_RRULE_UNTIL}={until}")?;
        }
        if let Some(count) = self.count {
            write!(f, ";{KW_RRULE_COUNT}={count}")?;
        }
        if let Some(interval) = self.interval {
            write!(f, ";{KW_RRULE_INTERVAL}={interval}")?;
        }
        write_list(f, KW_RRULE_BYSECOND, &self.by_second)?;
        write_list(f, KW_RRULE_BYMINUTE, &self.by_minute)?;
        write_list(f, KW_RRULE_BYHOUR, &self.by_hour)?;
        write_list(f, KW_RRULE_BYDAY, &self.by_day)?;
        write_list(f, KW_RRULE_BYMONTHDAY, &self.by_month_day)?;
        write_list(f, KW_RRULE_BYYEARDAY, &self.by_year_day)?;
        write_list(f, KW_RRULE_BYWEEKNO, &self.by_week_no)?;
        write_list(f, KW_RRULE_BYMONTH, &self.by_month)?;
        write_list(f, KW_RRULE_BYSETPOS, &self.by_set_pos)?;
        if let Some(wkst) = self.wkst {
            write!(f, ";{KW_RRULE_WKST}={wkst}")?;
        }
        Ok(())
    }
}

fn write_list<T: Display>(f: &mut fmt::Formatter<'_>, name: &str, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i == 0 {
            write!(f, ";{name}={item}")?;
        } else {
            write!(f, ",{item}")?;
        }
    }
    Ok(())
}
