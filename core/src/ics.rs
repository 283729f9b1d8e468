// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar encoding of series, exceptions and occurrences.
//!
//! The codec is strict: it reads back exactly what it writes, and rejects
//! rule parts it cannot represent with [`Error::UnsupportedRule`] instead of
//! dropping them.

use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use recurcal_ical::keyword::{
    KW_CALSCALE, KW_CALSCALE_GREGORIAN, KW_DATE, KW_DESCRIPTION, KW_DTEND, KW_DTSTAMP, KW_DTSTART,
    KW_DURATION, KW_EXDATE, KW_PRODID, KW_RDATE, KW_RECURRENCE_ID, KW_RRULE, KW_SUMMARY, KW_TZID,
    KW_UID, KW_VALUE, KW_VCALENDAR, KW_VERSION, KW_VERSION_2_0, KW_VEVENT,
};
use recurcal_ical::value::{
    DateOrDateTime, RecurrenceFrequency, ValueDateTime, ValueRecurrenceRule, WeekDay, WeekDayNum,
    escape_text, parse_date_or_date_time, parse_date_or_date_time_list, parse_rrule, parse_text,
};
use recurcal_ical::{Component, Property};

use crate::error::Error;
use crate::rule::{Frequency, MonthlyRule, ORDINALS, RecurrenceRule, RuleDraft, UntilBound};
use crate::series::{Exception, ExceptionKind, Occurrence, Override, Series, SeriesDraft};

/// Product identifier written to every calendar.
pub const PRODID: &str = concat!("-//recurcal//recurcal ", env!("CARGO_PKG_VERSION"), "//EN");

/// Carries the series recurrence version across a round trip.
pub const X_RECURCAL_VERSION: &str = "X-RECURCAL-VERSION";

/// A series read from calendar text, with the exceptions attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSeries {
    pub series: Series,
    pub exceptions: Vec<Exception>,
}

/// Writes and reads this system's iCalendar encoding.
#[derive(Debug, Clone)]
pub struct CalendarSerializer {
    default_zone: TimeZone,
    stamp: Timestamp,
}

impl CalendarSerializer {
    /// Floating times read by [`parse`](Self::parse) are placed in
    /// `default_zone`; `stamp` becomes the `DTSTAMP` of every written event.
    pub const fn new(default_zone: TimeZone, stamp: Timestamp) -> Self {
        Self {
            default_zone,
            stamp,
        }
    }

    /// Encode series with their exceptions as one calendar.
    ///
    /// Deleted occurrences become `EXDATE` values, modified ones become
    /// extra `VEVENT`s sharing the series `UID` with a `RECURRENCE-ID`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the calendar text cannot be written.
    pub fn serialize_series(&self, entries: &[(Series, Vec<Exception>)]) -> Result<String, Error> {
        let mut events = Vec::new();
        for (series, exceptions) in entries {
            let mut exceptions: Vec<&Exception> = exceptions
                .iter()
                .filter(|e| e.series_id == series.id())
                .collect();
            exceptions.sort_by_key(|e| e.original_start);

            events.push(self.master_event(series, &exceptions));
            for exception in exceptions {
                if let ExceptionKind::Modified(o) = &exception.kind {
                    events.push(self.override_event(series, exception.original_start, o));
                }
            }
        }
        Ok(recurcal_ical::format(&[calendar(events)])?)
    }

    /// Encode concrete occurrences as standalone events without rules.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the calendar text cannot be written.
    pub fn serialize_occurrences(&self, occurrences: &[Occurrence]) -> Result<String, Error> {
        let events = occurrences
            .iter()
            .map(|occ| {
                let uid = format!(
                    "{}-{}",
                    occ.series_id,
                    ValueDateTime::from(occ.original_start.timestamp())
                );
                let mut event = Component::new(KW_VEVENT)
                    .with_property(Property::new(KW_UID, escape_text(&uid)))
                    .with_property(self.stamp_property())
                    .with_property(date_time_property(KW_DTSTART, &occ.start))
                    .with_property(date_time_property(KW_DTEND, &occ.end))
                    .with_property(Property::new(KW_SUMMARY, escape_text(&occ.title)));
                if !occ.description.is_empty() {
                    event = event
                        .with_property(Property::new(KW_DESCRIPTION, escape_text(&occ.description)));
                }
                event
            })
            .collect();
        Ok(recurcal_ical::format(&[calendar(events)])?)
    }

    /// Decode calendar text written by [`serialize_series`](Self::serialize_series).
    ///
    /// Events are grouped by `UID`; each group needs exactly one event without
    /// `RECURRENCE-ID`. Nothing is returned unless every event is valid.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`] for malformed text or missing properties.
    /// - [`Error::UnsupportedRule`] for valid iCalendar this engine cannot
    ///   represent.
    /// - [`Error::Validation`] if a decoded series breaks an invariant.
    pub fn parse(&self, text: &str) -> Result<Vec<ImportedSeries>, Error> {
        let roots = recurcal_ical::parse(text)?;
        if !roots.iter().any(|c| c.is(KW_VCALENDAR)) {
            return Err(Error::Parse("expected a VCALENDAR component".to_string()));
        }

        let mut groups: Vec<(String, Vec<&Component>)> = Vec::new();
        let events = roots
            .iter()
            .filter(|c| c.is(KW_VCALENDAR))
            .flat_map(|c| c.children_named(KW_VEVENT));
        for event in events {
            let uid = parse_text(&required(event, KW_UID)?.value)?;
            match groups.iter_mut().find(|(id, _)| *id == uid) {
                Some((_, events)) => events.push(event),
                None => groups.push((uid, vec![event])),
            }
        }

        groups
            .into_iter()
            .map(|(uid, events)| self.import_group(uid, &events))
            .collect()
    }

    fn master_event(&self, series: &Series, exceptions: &[&Exception]) -> Component {
        let mut event = Component::new(KW_VEVENT)
            .with_property(Property::new(KW_UID, escape_text(series.id())))
            .with_property(self.stamp_property())
            .with_property(date_time_property(KW_DTSTART, series.anchor_start()))
            .with_property(date_time_property(KW_DTEND, series.anchor_end()))
            .with_property(Property::new(KW_SUMMARY, escape_text(series.title())));
        if !series.description().is_empty() {
            event = event.with_property(Property::new(
                KW_DESCRIPTION,
                escape_text(series.description()),
            ));
        }
        if let Some(rule) = series.recurrence() {
            event = event.with_property(Property::new(KW_RRULE, rule.to_string()));
        }

        let deleted: Vec<Zoned> = exceptions
            .iter()
            .filter(|e| matches!(e.kind, ExceptionKind::Deleted))
            .map(|e| e.original_start.to_zoned(series.anchor_start().time_zone().clone()))
            .collect();
        if let Some(exdate) = date_time_list_property(KW_EXDATE, &deleted) {
            event = event.with_property(exdate);
        }

        event.with_property(Property::new(
            X_RECURCAL_VERSION,
            series.recurrence_version().to_string(),
        ))
    }

    fn override_event(&self, series: &Series, original_start: Timestamp, o: &Override) -> Component {
        let recurrence_id = original_start.to_zoned(series.anchor_start().time_zone().clone());
        let mut event = Component::new(KW_VEVENT)
            .with_property(Property::new(KW_UID, escape_text(series.id())))
            .with_property(self.stamp_property())
            .with_property(date_time_property(KW_RECURRENCE_ID, &recurrence_id))
            .with_property(date_time_property(KW_DTSTART, &o.start));
        if let Some(end) = &o.end {
            event = event.with_property(date_time_property(KW_DTEND, end));
        }
        if let Some(title) = &o.title {
            event = event.with_property(Property::new(KW_SUMMARY, escape_text(title)));
        }
        if let Some(description) = &o.description {
            event = event.with_property(Property::new(KW_DESCRIPTION, escape_text(description)));
        }
        event
    }

    fn stamp_property(&self) -> Property {
        Property::new(KW_DTSTAMP, ValueDateTime::from(self.stamp).to_string())
    }

    fn import_group(&self, uid: String, events: &[&Component]) -> Result<ImportedSeries, Error> {
        let (masters, overrides): (Vec<&Component>, Vec<&Component>) = events
            .iter()
            .copied()
            .partition(|e| e.property(KW_RECURRENCE_ID).is_none());
        let [master] = masters.as_slice() else {
            return Err(Error::Parse(format!(
                "event {uid} needs exactly one main VEVENT, found {}",
                masters.len()
            )));
        };

        let series = self.import_master(&uid, master)?;
        let zone = series.anchor_start().time_zone().clone();
        let version = series.recurrence_version();

        let mut exceptions = Vec::new();
        for exdate in master.properties_named(KW_EXDATE) {
            for value in parse_date_or_date_time_list(&exdate.value)? {
                let at = to_zoned(value, &property_zone(exdate, &zone)?)?;
                exceptions.push(Exception {
                    series_id: uid.clone(),
                    original_start: at.timestamp(),
                    recurrence_version: version,
                    kind: ExceptionKind::Deleted,
                });
            }
        }
        for event in overrides {
            let recurrence_id = zoned_property(required(event, KW_RECURRENCE_ID)?, &zone)?;
            let start = zoned_property(required(event, KW_DTSTART)?, &zone)?;
            let end = event
                .property(KW_DTEND)
                .map(|p| zoned_property(p, &zone))
                .transpose()?;
            let title = event
                .property(KW_SUMMARY)
                .map(|p| parse_text(&p.value))
                .transpose()?;
            let description = event
                .property(KW_DESCRIPTION)
                .map(|p| parse_text(&p.value))
                .transpose()?;
            exceptions.push(Exception {
                series_id: uid.clone(),
                original_start: recurrence_id.timestamp(),
                recurrence_version: version,
                kind: ExceptionKind::Modified(Override {
                    start,
                    end,
                    title,
                    description,
                }),
            });
        }

        exceptions.sort_by_key(|e| e.original_start);
        if let Some(pair) = exceptions
            .windows(2)
            .find(|pair| pair[0].original_start == pair[1].original_start)
        {
            return Err(Error::Parse(format!(
                "event {uid} has conflicting exceptions at {}",
                pair[0].original_start
            )));
        }

        Ok(ImportedSeries { series, exceptions })
    }

    fn import_master(&self, uid: &str, event: &Component) -> Result<Series, Error> {
        if event.property(KW_RDATE).is_some() {
            return Err(Error::unsupported(KW_RDATE, "additional dates are not supported"));
        }
        if event.property(KW_DURATION).is_some() {
            return Err(Error::unsupported(KW_DURATION, "use DTEND instead"));
        }

        let start = zoned_property(required(event, KW_DTSTART)?, &self.default_zone)?;
        let end = match event.property(KW_DTEND) {
            Some(prop) => zoned_property(prop, start.time_zone())?,
            None => start.clone(),
        };

        let mut rules = event.properties_named(KW_RRULE);
        let recurrence = match (rules.next(), rules.next()) {
            (None, _) => None,
            (Some(rule), None) => Some(draft_from_rrule(&parse_rrule(&rule.value)?, &start)?),
            (Some(_), Some(_)) => {
                return Err(Error::unsupported(
                    KW_RRULE,
                    "only one rule per event is supported",
                ));
            }
        };

        let title = event
            .property(KW_SUMMARY)
            .map(|p| parse_text(&p.value))
            .transpose()?
            .unwrap_or_default();
        let description = event
            .property(KW_DESCRIPTION)
            .map(|p| parse_text(&p.value))
            .transpose()?
            .unwrap_or_default();
        let version = match event.property(X_RECURCAL_VERSION) {
            Some(prop) => match prop.value.trim().parse::<u32>() {
                Ok(version) if version > 0 => version,
                _ => {
                    return Err(Error::Parse(format!(
                        "invalid {X_RECURCAL_VERSION} value {:?}",
                        prop.value
                    )));
                }
            },
            None => 1,
        };

        let draft = SeriesDraft {
            title,
            description,
            start,
            end,
            recurrence,
        };
        Ok(Series::new(uid, draft)?.with_version(version))
    }
}

/// Read a rule written as an `RRULE` value, e.g. `FREQ=WEEKLY;BYDAY=MO,WE`.
///
/// # Errors
///
/// [`Error::Parse`] for malformed text and [`Error::UnsupportedRule`] for
/// rule parts the engine cannot represent.
pub fn parse_rule(text: &str, anchor: &Zoned) -> Result<RuleDraft, Error> {
    draft_from_rrule(&parse_rrule(text.trim())?, anchor)
}

/// Map a validated rule to its `RRULE` value.
pub(crate) fn rule_to_rrule(rule: &RecurrenceRule) -> ValueRecurrenceRule {
    let mut value = ValueRecurrenceRule::new(match rule.frequency() {
        Frequency::Daily => RecurrenceFrequency::Daily,
        Frequency::Weekly => RecurrenceFrequency::Weekly,
        Frequency::Monthly => RecurrenceFrequency::Monthly,
        Frequency::Yearly => RecurrenceFrequency::Yearly,
    });
    if rule.interval().get() > 1 {
        value.interval = Some(rule.interval().get());
    }
    value.by_day = rule
        .by_weekday()
        .iter()
        .map(|&wd| WeekDay::from(wd).into())
        .collect();
    match rule.monthly() {
        Some(MonthlyRule::DayOfMonth(day)) => value.by_month_day = vec![i16::from(day)],
        Some(MonthlyRule::Weekday { ordinal, weekday }) => {
            value.by_day = vec![WeekDayNum {
                day: weekday.into(),
                occurrence: Some(ordinal),
            }];
        }
        None => {}
    }
    value.until = rule
        .until()
        .map(|until| DateOrDateTime::DateTime(until.into()));
    value
}

/// Map an `RRULE` value to a draft, rejecting what cannot be represented.
///
/// Floating `UNTIL` values are read in the anchor's zone.
pub(crate) fn draft_from_rrule(
    value: &ValueRecurrenceRule,
    anchor: &Zoned,
) -> Result<RuleDraft, Error> {
    let frequency = match value.freq {
        RecurrenceFrequency::Daily => Frequency::Daily,
        RecurrenceFrequency::Weekly => Frequency::Weekly,
        RecurrenceFrequency::Monthly => Frequency::Monthly,
        RecurrenceFrequency::Yearly => Frequency::Yearly,
        other => {
            return Err(Error::unsupported(
                "FREQ",
                format!("{other} is not supported, the smallest period is a day"),
            ));
        }
    };
    if value.count.is_some() {
        return Err(Error::unsupported("COUNT", "bound the series with UNTIL"));
    }
    let unsupported_lists = [
        ("BYSECOND", value.by_second.is_empty()),
        ("BYMINUTE", value.by_minute.is_empty()),
        ("BYHOUR", value.by_hour.is_empty()),
        ("BYYEARDAY", value.by_year_day.is_empty()),
        ("BYWEEKNO", value.by_week_no.is_empty()),
        ("BYMONTH", value.by_month.is_empty()),
        ("BYSETPOS", value.by_set_pos.is_empty()),
    ];
    if let Some((part, _)) = unsupported_lists.iter().find(|(_, empty)| !empty) {
        return Err(Error::unsupported(*part, "not supported"));
    }
    if let Some(wkst) = value.wkst
        && wkst != WeekDay::Monday
    {
        return Err(Error::unsupported(
            "WKST",
            format!("weeks always start on MO, not {wkst}"),
        ));
    }

    let mut draft = RuleDraft::new(frequency).interval(value.interval.unwrap_or(1));
    match frequency {
        Frequency::Weekly => {
            if !value.by_month_day.is_empty() {
                return Err(Error::unsupported(
                    "BYMONTHDAY",
                    "only supported with FREQ=MONTHLY",
                ));
            }
            if let Some(day) = value.by_day.iter().find(|d| d.occurrence.is_some()) {
                return Err(Error::unsupported(
                    "BYDAY",
                    format!("ordinal weekday {day} is only supported with FREQ=MONTHLY"),
                ));
            }
            draft = draft.weekdays(value.by_day.iter().map(|d| d.day.into()));
        }
        Frequency::Monthly => {
            draft = monthly_selector(draft, value, anchor)?;
        }
        Frequency::Daily | Frequency::Yearly => {
            if !value.by_day.is_empty() {
                return Err(Error::unsupported(
                    "BYDAY",
                    format!("not supported with FREQ={}", value.freq),
                ));
            }
            if !value.by_month_day.is_empty() {
                return Err(Error::unsupported(
                    "BYMONTHDAY",
                    format!("not supported with FREQ={}", value.freq),
                ));
            }
        }
    }

    if let Some(until) = value.until {
        let bound = match until {
            DateOrDateTime::Date(date) => UntilBound::Date(date.into()),
            DateOrDateTime::DateTime(dt) => {
                let zone = if dt.is_utc() {
                    TimeZone::UTC
                } else {
                    anchor.time_zone().clone()
                };
                let at = dt
                    .civil_date_time()
                    .to_zoned(zone)
                    .map_err(|e| Error::Parse(format!("invalid UNTIL {dt}: {e}")))?;
                UntilBound::Instant(at.timestamp())
            }
        };
        draft = draft.until(bound);
    }
    Ok(draft)
}

fn monthly_selector(
    draft: RuleDraft,
    value: &ValueRecurrenceRule,
    anchor: &Zoned,
) -> Result<RuleDraft, Error> {
    match (value.by_day.as_slice(), value.by_month_day.as_slice()) {
        ([], []) => {
            let day = u8::try_from(anchor.day())
                .map_err(|_| Error::Parse(format!("invalid anchor day in {anchor}")))?;
            Ok(draft.day_of_month(day))
        }
        ([_, ..], [_, ..]) => Err(Error::unsupported(
            "BYDAY",
            "BYDAY together with BYMONTHDAY is not supported",
        )),
        ([day], []) => match day.occurrence {
            Some(ordinal) if ORDINALS.contains(&ordinal) => {
                Ok(draft.nth_weekday(ordinal, day.day.into()))
            }
            Some(ordinal) => Err(Error::unsupported(
                "BYDAY",
                format!("ordinal {ordinal} is not one of 1, 2, 3, 4 or -1"),
            )),
            None => Err(Error::unsupported(
                "BYDAY",
                format!("monthly weekday {day} needs an ordinal"),
            )),
        },
        ([], [day]) => match u8::try_from(*day) {
            Ok(day) => Ok(draft.day_of_month(day)),
            Err(_) => Err(Error::unsupported(
                "BYMONTHDAY",
                format!("day {day} counted from the month's end is not supported"),
            )),
        },
        ([], _) => Err(Error::unsupported(
            "BYMONTHDAY",
            "only one day of month is supported",
        )),
        (_, _) => Err(Error::unsupported(
            "BYDAY",
            "only one monthly weekday is supported",
        )),
    }
}

fn calendar(events: Vec<Component>) -> Component {
    let mut calendar = Component::new(KW_VCALENDAR)
        .with_property(Property::new(KW_VERSION, KW_VERSION_2_0))
        .with_property(Property::new(KW_PRODID, PRODID))
        .with_property(Property::new(KW_CALSCALE, KW_CALSCALE_GREGORIAN));
    calendar.children = events;
    calendar
}

/// IANA name to write as `TZID`, or `None` for the `Z` form.
fn zone_name(tz: &TimeZone) -> Option<&str> {
    tz.iana_name()
        .filter(|name| !matches!(*name, "UTC" | "Etc/UTC"))
}

fn date_time_property(name: &str, at: &Zoned) -> Property {
    match zone_name(at.time_zone()) {
        Some(tzid) => Property::new(name, ValueDateTime::from(at.datetime()).to_string())
            .with_parameter(KW_TZID, tzid),
        None => Property::new(name, ValueDateTime::from(at.timestamp()).to_string()),
    }
}

/// All instants share the zone of the first one.
fn date_time_list_property(name: &str, instants: &[Zoned]) -> Option<Property> {
    let first = instants.first()?;
    let tzid = zone_name(first.time_zone());
    let values: Vec<String> = instants
        .iter()
        .map(|at| match tzid {
            Some(_) => ValueDateTime::from(at.datetime()).to_string(),
            None => ValueDateTime::from(at.timestamp()).to_string(),
        })
        .collect();
    let prop = Property::new(name, values.join(","));
    Some(match tzid {
        Some(tzid) => prop.with_parameter(KW_TZID, tzid),
        None => prop,
    })
}

fn required<'a>(event: &'a Component, name: &str) -> Result<&'a Property, Error> {
    event
        .property(name)
        .ok_or_else(|| Error::Parse(format!("VEVENT is missing {name}")))
}

fn property_zone(prop: &Property, fallback: &TimeZone) -> Result<TimeZone, Error> {
    match prop.parameter(KW_TZID) {
        Some(name) => TimeZone::get(name)
            .map_err(|e| Error::Parse(format!("unknown time zone {name:?}: {e}"))),
        None => Ok(fallback.clone()),
    }
}

fn zoned_property(prop: &Property, fallback: &TimeZone) -> Result<Zoned, Error> {
    let value = parse_date_or_date_time(&prop.value)?;
    if matches!(value, DateOrDateTime::DateTime(_))
        && prop
            .parameter(KW_VALUE)
            .is_some_and(|v| v.eq_ignore_ascii_case(KW_DATE))
    {
        return Err(Error::Parse(format!(
            "{} has VALUE=DATE but holds a date-time",
            prop.name
        )));
    }
    to_zoned(value, &property_zone(prop, fallback)?)
}

/// UTC date-times ignore `zone`; dates resolve to midnight in it.
fn to_zoned(value: DateOrDateTime, zone: &TimeZone) -> Result<Zoned, Error> {
    let zoned = match value {
        DateOrDateTime::DateTime(dt) if dt.is_utc() => dt.civil_date_time().to_zoned(TimeZone::UTC),
        DateOrDateTime::DateTime(dt) => dt.civil_date_time().to_zoned(zone.clone()),
        DateOrDateTime::Date(date) => jiff::civil::Date::from(date).to_zoned(zone.clone()),
    };
    zoned.map_err(|e| Error::Parse(format!("invalid time {value}: {e}")))
}
