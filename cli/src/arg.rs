// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{Arg, ArgAction, ArgMatches, arg, value_parser};
use jiff::civil::{self, Weekday};
use jiff::{SignedDuration, Zoned};
use recurcal_core::{Frequency, RuleDraft, UntilBound, parse_rule};

use crate::util::{OutputFormat, parse_datetime, parse_ordinal_weekday, parse_weekday};

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn verbose() -> Arg {
        arg!(-v --verbose "Show more detailed information")
    }

    pub fn get_verbose(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }

    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesArgs;

impl SeriesArgs {
    pub fn id() -> Arg {
        arg!(id: <ID> "The id of the series")
    }

    pub fn get_id(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("id")
            .expect("id is required")
            .clone()
    }

    pub fn title(positional: bool) -> Arg {
        if positional {
            arg!(title: <TITLE> "Title of the series")
        } else {
            arg!(title: -t --title <TITLE> "Title of the series")
        }
    }

    pub fn get_title(matches: &ArgMatches) -> Option<String> {
        matches.get_one("title").cloned()
    }

    pub fn description() -> Arg {
        arg!(--description <DESCRIPTION> "Description of the series")
    }

    pub fn get_description(matches: &ArgMatches) -> Option<String> {
        matches.get_one("description").cloned()
    }

    pub fn start(required: bool) -> Arg {
        arg!(--start <START> "Start date and time").required(required)
    }

    pub fn get_start(matches: &ArgMatches) -> Option<String> {
        matches.get_one("start").cloned()
    }

    pub fn end() -> Arg {
        arg!(--end <END> "End date and time").conflicts_with("duration")
    }

    pub fn get_end(matches: &ArgMatches) -> Option<String> {
        matches.get_one("end").cloned()
    }

    pub fn duration() -> Arg {
        arg!(--duration <DURATION> "Length of each occurrence, e.g. 30m or 1h 30m")
            .value_parser(value_parser!(SignedDuration))
    }

    pub fn get_duration(matches: &ArgMatches) -> Option<SignedDuration> {
        matches.get_one("duration").copied()
    }
}

/// Arguments describing how a series repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceArgs {
    pub rrule: Option<String>,
    pub freq: Option<Frequency>,
    pub interval: Option<u32>,
    pub by_weekday: Vec<Weekday>,
    pub day_of_month: Option<u8>,
    pub nth_weekday: Option<(i8, Weekday)>,
    pub until: Option<String>,
}

impl RecurrenceArgs {
    pub fn args() -> Vec<Arg> {
        const RULE_PARTS: [&str; 6] = ["freq", "interval", "byday", "monthday", "nth", "until"];
        vec![
            arg!(--rrule <RRULE> "Recurrence rule, e.g. FREQ=WEEKLY;BYDAY=MO,WE")
                .conflicts_with_all(RULE_PARTS),
            arg!(--freq <FREQ> "How often the series repeats")
                .value_parser(value_parser!(Frequency)),
            arg!(--interval <N> "Repeat every N periods")
                .value_parser(value_parser!(u32).range(1..)),
            arg!(--byday <WEEKDAYS> "Weekdays of a weekly series, e.g. MO,WE")
                .value_parser(parse_weekday)
                .value_delimiter(',')
                .action(ArgAction::Append),
            arg!(--monthday <DAY> "Day of month of a monthly series")
                .value_parser(value_parser!(u8).range(1..=31))
                .conflicts_with("nth"),
            arg!(--nth <WEEKDAY> "Ordinal weekday of a monthly series, e.g. 2TU or -1FR")
                .value_parser(parse_ordinal_weekday)
                .allow_hyphen_values(true),
            arg!(--until <UNTIL> "Last day or instant the series may start"),
        ]
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            rrule: matches.get_one("rrule").cloned(),
            freq: matches.get_one("freq").copied(),
            interval: matches.get_one("interval").copied(),
            by_weekday: matches
                .get_many::<Weekday>("byday")
                .map(|a| a.copied().collect())
                .unwrap_or_default(),
            day_of_month: matches.get_one("monthday").copied(),
            nth_weekday: matches.get_one("nth").copied(),
            until: matches.get_one("until").cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build the rule draft for a series anchored at `anchor`.
    pub fn to_draft(
        &self,
        now: &Zoned,
        anchor: &Zoned,
    ) -> Result<Option<RuleDraft>, Box<dyn Error>> {
        if let Some(rrule) = &self.rrule {
            return Ok(Some(parse_rule(rrule, anchor)?));
        }

        let Some(freq) = self.freq else {
            if self.is_empty() {
                return Ok(None);
            }
            return Err("--freq is required to describe a recurrence".into());
        };

        let mut draft = RuleDraft::new(freq)
            .interval(self.interval.unwrap_or(1))
            .weekdays(self.by_weekday.iter().copied());
        if let Some(day) = self.day_of_month {
            draft = draft.day_of_month(day);
        }
        if let Some((ordinal, weekday)) = self.nth_weekday {
            draft = draft.nth_weekday(ordinal, weekday);
        }
        if let Some(until) = &self.until {
            draft = draft.until(parse_until(now, anchor, until)?);
        }
        Ok(Some(draft))
    }
}

/// A bare date bounds the series through that day, anything else is an instant.
fn parse_until(now: &Zoned, anchor: &Zoned, until: &str) -> Result<UntilBound, Box<dyn Error>> {
    if let Ok(date) = civil::Date::strptime("%Y-%m-%d", until.trim()) {
        return Ok(UntilBound::Date(date));
    }
    let now = now.with_time_zone(anchor.time_zone().clone());
    Ok(UntilBound::Instant(parse_datetime(&now, until)?.timestamp()))
}

#[derive(Debug, Clone, Copy)]
pub struct OccurrenceArgs;

impl OccurrenceArgs {
    pub fn series_id() -> Arg {
        arg!(series_id: <SERIES_ID> "The id of the series")
    }

    pub fn get_series_id(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("series_id")
            .expect("series_id is required")
            .clone()
    }

    pub fn original_start() -> Arg {
        arg!(at: <ORIGINAL_START> "Original start of the occurrence")
    }

    pub fn get_original_start(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("at")
            .expect("original start is required")
            .clone()
    }

    pub fn from() -> Arg {
        arg!(--from <FROM> "Start of the window, defaults to today")
    }

    pub fn to() -> Arg {
        arg!(--to <TO> "End of the window, defaults to a week after the start")
    }

    pub fn get_window(matches: &ArgMatches) -> (Option<String>, Option<String>) {
        (
            matches.get_one("from").cloned(),
            matches.get_one("to").cloned(),
        )
    }
}
