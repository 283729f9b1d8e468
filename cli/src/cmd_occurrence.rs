// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;
use jiff::Zoned;
use recurcal_core::{Occurrence, OccurrencePatch};

use crate::arg::{CommonArgs, OccurrenceArgs, SeriesArgs};
use crate::formatter::{Formatter, OccurrenceColumn};
use crate::state::Session;
use crate::util::{OutputFormat, format_datetime, parse_datetime, parse_window};

#[derive(Debug, Clone)]
pub struct CmdOccurrenceList {
    pub from: Option<String>,
    pub to: Option<String>,

    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CmdOccurrenceList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List occurrences of all series in a window")
            .arg(OccurrenceArgs::from())
            .arg(OccurrenceArgs::to())
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        let (from, to) = OccurrenceArgs::get_window(matches);
        Self {
            from,
            to,
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing occurrences...");
        let (from, to) = parse_window(
            session.scheduler.now(),
            self.from.as_deref(),
            self.to.as_deref(),
        )?;
        let occurrences =
            session
                .scheduler
                .list_occurrences(&session.ctx, from.timestamp(), to.timestamp())?;
        if occurrences.is_empty() && self.output_format == OutputFormat::Table {
            let prompt = format!(
                "No occurrences between {} and {}",
                format_datetime(&from),
                format_datetime(&to)
            );
            println!("{}", prompt.italic());
            return Ok(());
        }
        print_occurrences(&occurrences, self.output_format, self.verbose);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdOccurrenceUpcoming {
    pub limit: Option<usize>,

    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CmdOccurrenceUpcoming {
    pub const NAME: &str = "upcoming";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("next")
            .about("List the next occurrences from now")
            .arg(
                arg!(-n --limit <N> "Number of occurrences to show")
                    .value_parser(value_parser!(usize)),
            )
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            limit: matches.get_one("limit").copied(),
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing upcoming occurrences...");
        let limit = self.limit.unwrap_or(session.config.upcoming_limit);
        let occurrences = session.scheduler.list_upcoming(&session.ctx, limit)?;
        if occurrences.is_empty() && self.output_format == OutputFormat::Table {
            println!("{}", "No upcoming occurrences".italic());
            return Ok(());
        }
        print_occurrences(&occurrences, self.output_format, self.verbose);
        Ok(())
    }
}

/// Cancel one occurrence of a series.
#[derive(Debug, Clone)]
pub struct CmdOccurrenceDelete {
    pub series_id: String,
    pub original_start: String,
}

impl CmdOccurrenceDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Cancel a single occurrence")
            .arg(OccurrenceArgs::series_id())
            .arg(OccurrenceArgs::original_start())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            series_id: OccurrenceArgs::get_series_id(matches),
            original_start: OccurrenceArgs::get_original_start(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting occurrence...");
        let slot = original_start(session, &self.series_id, &self.original_start)?;
        session
            .scheduler
            .delete_occurrence(&session.ctx, &self.series_id, slot.timestamp())?;
        println!("{} {}", "Cancelled".green(), format_datetime(&slot));
        Ok(())
    }
}

/// Move or rename one occurrence of a series.
#[derive(Debug, Clone)]
pub struct CmdOccurrenceModify {
    pub series_id: String,
    pub original_start: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,

    pub output_format: OutputFormat,
}

impl CmdOccurrenceModify {
    pub const NAME: &str = "modify";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("edit")
            .about("Change a single occurrence")
            .arg(OccurrenceArgs::series_id())
            .arg(OccurrenceArgs::original_start())
            .arg(SeriesArgs::start(false))
            .arg(SeriesArgs::end())
            .arg(SeriesArgs::title(false))
            .arg(SeriesArgs::description())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            series_id: OccurrenceArgs::get_series_id(matches),
            original_start: OccurrenceArgs::get_original_start(matches),
            start: SeriesArgs::get_start(matches),
            end: SeriesArgs::get_end(matches),
            title: SeriesArgs::get_title(matches),
            description: SeriesArgs::get_description(matches),

            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "modifying occurrence...");
        let slot = original_start(session, &self.series_id, &self.original_start)?;
        let now = session.scheduler.now().with_time_zone(slot.time_zone().clone());
        let parse = |s: Option<String>| -> Result<Option<Zoned>, Box<dyn Error>> {
            s.map(|s| parse_datetime(&now, &s)).transpose()
        };
        let patch = OccurrencePatch {
            start: parse(self.start)?,
            end: parse(self.end)?,
            title: self.title,
            description: self.description,
        };

        let occurrence = session.scheduler.modify_occurrence(
            &session.ctx,
            &self.series_id,
            slot.timestamp(),
            patch,
        )?;
        print_occurrences(&[occurrence], self.output_format, true);
        Ok(())
    }
}

/// Undo a cancellation or modification.
#[derive(Debug, Clone)]
pub struct CmdOccurrenceRestore {
    pub series_id: String,
    pub original_start: String,
}

impl CmdOccurrenceRestore {
    pub const NAME: &str = "restore";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Restore a cancelled or changed occurrence")
            .arg(OccurrenceArgs::series_id())
            .arg(OccurrenceArgs::original_start())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            series_id: OccurrenceArgs::get_series_id(matches),
            original_start: OccurrenceArgs::get_original_start(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "restoring occurrence...");
        let slot = original_start(session, &self.series_id, &self.original_start)?;
        session
            .scheduler
            .restore_occurrence(&session.ctx, &self.series_id, slot.timestamp())?;
        println!("{} {}", "Restored".green(), format_datetime(&slot));
        Ok(())
    }
}

/// Read an original start in the zone of its series.
fn original_start(session: &Session, series_id: &str, at: &str) -> Result<Zoned, Box<dyn Error>> {
    let series = session.scheduler.get_series(&session.ctx, series_id)?;
    let tz = series.anchor_start().time_zone().clone();
    let now = session.scheduler.now().with_time_zone(tz.clone());
    Ok(parse_datetime(&now, at)?.with_time_zone(tz))
}

fn print_occurrences(occurrences: &[Occurrence], output_format: OutputFormat, verbose: bool) {
    let formatter =
        Formatter::new(OccurrenceColumn::columns(verbose)).with_output_format(output_format);
    println!("{}", formatter.format(occurrences));
}

#[cfg(test)]
mod tests {
    use clap::Command;

    use super::*;

    #[test]
    fn test_parse_occurrence_list() {
        let cmd = Command::new("test")
            .subcommand_required(true)
            .subcommand(CmdOccurrenceList::command());

        let matches = cmd
            .try_get_matches_from([
                "test",
                "list",
                "--from",
                "2024-01-01",
                "--to",
                "2024-02-01",
                "--verbose",
            ])
            .unwrap();

        let sub_matches = matches.subcommand_matches("list").unwrap();
        let parsed = CmdOccurrenceList::from(sub_matches);
        assert_eq!(parsed.from, Some("2024-01-01".to_string()));
        assert_eq!(parsed.to, Some("2024-02-01".to_string()));
        assert_eq!(parsed.output_format, OutputFormat::Table);
        assert!(parsed.verbose);
    }

    #[test]
    fn test_parse_occurrence_upcoming() {
        let cmd = Command::new("test")
            .subcommand_required(true)
            .subcommand(CmdOccurrenceUpcoming::command());

        let matches = cmd
            .try_get_matches_from(["test", "next", "-n", "3", "--output-format", "json"])
            .unwrap();

        let sub_matches = matches.subcommand_matches("upcoming").unwrap();
        let parsed = CmdOccurrenceUpcoming::from(sub_matches);
        assert_eq!(parsed.limit, Some(3));
        assert_eq!(parsed.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_occurrence_modify() {
        let cmd = Command::new("test")
            .subcommand_required(true)
            .subcommand(CmdOccurrenceModify::command());

        let matches = cmd
            .try_get_matches_from([
                "test",
                "modify",
                "abc",
                "2024-01-03 09:00",
                "--start",
                "2024-01-05 09:00",
                "-t",
                "Moved standup",
            ])
            .unwrap();

        let sub_matches = matches.subcommand_matches("modify").unwrap();
        let parsed = CmdOccurrenceModify::from(sub_matches);
        assert_eq!(parsed.series_id, "abc");
        assert_eq!(parsed.original_start, "2024-01-03 09:00");
        assert_eq!(parsed.start, Some("2024-01-05 09:00".to_string()));
        assert_eq!(parsed.end, None);
        assert_eq!(parsed.title, Some("Moved standup".to_string()));
    }

    #[test]
    fn test_parse_occurrence_delete_and_restore() {
        let cmd = Command::new("test")
            .subcommand_required(true)
            .subcommand(CmdOccurrenceDelete::command())
            .subcommand(CmdOccurrenceRestore::command());

        let matches = cmd
            .clone()
            .try_get_matches_from(["test", "rm", "abc", "2024-01-03 09:00"])
            .unwrap();
        let parsed = CmdOccurrenceDelete::from(matches.subcommand_matches("delete").unwrap());
        assert_eq!(parsed.series_id, "abc");

        let matches = cmd
            .try_get_matches_from(["test", "restore", "abc", "2024-01-03 09:00"])
            .unwrap();
        let parsed = CmdOccurrenceRestore::from(matches.subcommand_matches("restore").unwrap());
        assert_eq!(parsed.original_start, "2024-01-03 09:00");
    }

    #[test]
    fn test_parse_occurrence_delete_requires_slot() {
        let cmd = Command::new("test").subcommand(CmdOccurrenceDelete::command());
        assert!(cmd.try_get_matches_from(["test", "delete", "abc"]).is_err());
    }
}
