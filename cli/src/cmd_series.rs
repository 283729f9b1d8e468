// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use jiff::{SignedDuration, Zoned};
use recurcal_core::{DetailsPatch, SchedulePatch, Series, SeriesDraft};

use crate::arg::{CommonArgs, RecurrenceArgs, SeriesArgs};
use crate::formatter::{Formatter, SeriesColumn};
use crate::state::Session;
use crate::util::{OutputFormat, parse_datetime};

/// Default length of a new series when neither an end nor a duration is given.
const DEFAULT_DURATION: SignedDuration = SignedDuration::from_hours(1);

#[derive(Debug, Clone)]
pub struct CmdSeriesNew {
    pub title: String,
    pub description: Option<String>,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<SignedDuration>,
    pub recurrence: RecurrenceArgs,

    pub output_format: OutputFormat,
}

impl CmdSeriesNew {
    pub const NAME: &str = "new";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("add")
            .about("Create a new series")
            .arg(SeriesArgs::title(true))
            .arg(SeriesArgs::start(true))
            .arg(SeriesArgs::end())
            .arg(SeriesArgs::duration())
            .arg(SeriesArgs::description())
            .args(RecurrenceArgs::args())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            title: SeriesArgs::get_title(matches).expect("title is required"),
            description: SeriesArgs::get_description(matches),
            start: SeriesArgs::get_start(matches).expect("start is required"),
            end: SeriesArgs::get_end(matches),
            duration: SeriesArgs::get_duration(matches),
            recurrence: RecurrenceArgs::from(matches),

            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "creating series...");
        let now = session.scheduler.now().clone();
        let start = parse_datetime(&now, &self.start)?;
        let end = resolve_end(&now, &start, self.end.as_deref(), self.duration)?
            .unwrap_or(start.checked_add(DEFAULT_DURATION)?);
        let draft = SeriesDraft {
            title: self.title,
            description: self.description.unwrap_or_default(),
            recurrence: self.recurrence.to_draft(&now, &start)?,
            start,
            end,
        };

        let series = session.scheduler.create_series(&session.ctx, draft)?;
        print_series(&[series], self.output_format, true);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdSeriesList {
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CmdSeriesList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List all series")
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing series...");
        let series = session.scheduler.list_series(&session.ctx)?;
        if series.is_empty() && self.output_format == OutputFormat::Table {
            println!("{}", "No series found".italic());
            return Ok(());
        }
        print_series(&series, self.output_format, self.verbose);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdSeriesShow {
    pub id: String,
    pub output_format: OutputFormat,
}

impl CmdSeriesShow {
    pub const NAME: &str = "show";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show a series")
            .arg(SeriesArgs::id())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: SeriesArgs::get_id(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "showing series...");
        let series = session.scheduler.get_series(&session.ctx, &self.id)?;
        let description = series.description().to_string();
        print_series(&[series], self.output_format, true);
        if self.output_format == OutputFormat::Table && !description.is_empty() {
            println!("{description}");
        }
        Ok(())
    }
}

/// Change the title or description, keeping every occurrence and exception.
#[derive(Debug, Clone)]
pub struct CmdSeriesEdit {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,

    pub output_format: OutputFormat,
}

impl CmdSeriesEdit {
    pub const NAME: &str = "edit";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Edit the title or description of a series")
            .arg(SeriesArgs::id())
            .arg(SeriesArgs::title(false))
            .arg(SeriesArgs::description())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: SeriesArgs::get_id(matches),
            title: SeriesArgs::get_title(matches),
            description: SeriesArgs::get_description(matches),

            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "editing series...");
        let patch = DetailsPatch {
            title: self.title,
            description: self.description,
        };
        let series = session
            .scheduler
            .update_details(&session.ctx, &self.id, patch)?;
        print_series(&[series], self.output_format, true);
        Ok(())
    }
}

/// Move a series or change its rule, which drops all of its exceptions.
#[derive(Debug, Clone)]
pub struct CmdSeriesReschedule {
    pub id: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<SignedDuration>,
    pub recurrence: RecurrenceArgs,
    pub once: bool,

    pub output_format: OutputFormat,
}

impl CmdSeriesReschedule {
    pub const NAME: &str = "reschedule";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Change when a series happens, dropping its occurrence exceptions")
            .arg(SeriesArgs::id())
            .arg(SeriesArgs::start(false))
            .arg(SeriesArgs::end())
            .arg(SeriesArgs::duration())
            .args(RecurrenceArgs::args())
            .arg(
                arg!(--once "Stop repeating, keeping only the first occurrence")
                    .conflicts_with_all(["rrule", "freq"]),
            )
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            id: SeriesArgs::get_id(matches),
            start: SeriesArgs::get_start(matches),
            end: SeriesArgs::get_end(matches),
            duration: SeriesArgs::get_duration(matches),
            recurrence: RecurrenceArgs::from(matches),
            once: matches.get_flag("once"),

            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "rescheduling series...");
        let current = session.scheduler.get_series(&session.ctx, &self.id)?;
        // Local times move the series within its own zone
        let now = session
            .scheduler
            .now()
            .with_time_zone(current.anchor_start().time_zone().clone());

        let start = self
            .start
            .as_deref()
            .map(|s| parse_datetime(&now, s))
            .transpose()?;
        let anchor = start.as_ref().unwrap_or(current.anchor_start());
        let end = resolve_end(&now, anchor, self.end.as_deref(), self.duration)?;
        let recurrence = if self.once {
            Some(None)
        } else if self.recurrence.is_empty() {
            None
        } else {
            Some(self.recurrence.to_draft(&now, anchor)?)
        };

        let patch = SchedulePatch {
            start,
            end,
            recurrence,
        };
        let (series, dropped) = session
            .scheduler
            .update_schedule(&session.ctx, &self.id, patch)?;
        if !dropped.is_empty() && self.output_format == OutputFormat::Table {
            let prompt = format!("Dropped {} occurrence exception(s)", dropped.len());
            println!("{}", prompt.yellow());
        }
        print_series(&[series], self.output_format, true);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdSeriesDelete {
    pub ids: Vec<String>,
}

impl CmdSeriesDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete series together with their exceptions")
            .arg(arg!(id: <ID> "The ids of the series").num_args(1..))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            ids: matches
                .get_many::<String>("id")
                .expect("id is required")
                .cloned()
                .collect(),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting series...");
        for id in &self.ids {
            session.scheduler.delete_series(&session.ctx, id)?;
            println!("{} {id}", "Deleted".green());
        }
        Ok(())
    }
}

/// The end from an explicit end or a duration from `start`, if either is given.
fn resolve_end(
    now: &Zoned,
    start: &Zoned,
    end: Option<&str>,
    duration: Option<SignedDuration>,
) -> Result<Option<Zoned>, Box<dyn Error>> {
    match (end, duration) {
        (Some(end), _) => {
            let now = now.with_time_zone(start.time_zone().clone());
            Ok(Some(parse_datetime(&now, end)?))
        }
        (None, Some(duration)) => Ok(Some(start.checked_add(duration)?)),
        (None, None) => Ok(None),
    }
}

fn print_series(series: &[Series], output_format: OutputFormat, verbose: bool) {
    let formatter =
        Formatter::new(SeriesColumn::columns(verbose)).with_output_format(output_format);
    println!("{}", formatter.format(series));
}
