// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgMatches, Command, ValueHint, arg, value_parser};
use colored::Colorize;
use tokio::fs;

use crate::arg::OccurrenceArgs;
use crate::state::Session;
use crate::util::parse_window;

/// What to write as iCalendar text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Every series with its rule and exceptions
    All,
    /// One series with its rule and exceptions
    Series(String),
    /// The occurrences of a window, as standalone events
    Window {
        from: Option<String>,
        to: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct CmdExport {
    pub target: ExportTarget,
    pub output: Option<PathBuf>,
}

impl CmdExport {
    pub const NAME: &str = "export";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Export series or occurrences as iCalendar")
            .long_about(
                "\
Export series as iCalendar. Without an id every series is exported. With --from or --to the \
occurrences of that window are exported as standalone events instead.",
            )
            .arg(arg!(id: [ID] "The id of the series to export").conflicts_with_all(["from", "to"]))
            .arg(OccurrenceArgs::from())
            .arg(OccurrenceArgs::to())
            .arg(
                arg!(-o --output <FILE> "Write to a file instead of standard output")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        let target = match (matches.get_one::<String>("id"), OccurrenceArgs::get_window(matches)) {
            (Some(id), _) => ExportTarget::Series(id.clone()),
            (None, (None, None)) => ExportTarget::All,
            (None, (from, to)) => ExportTarget::Window { from, to },
        };
        Self {
            target,
            output: matches.get_one("output").cloned(),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "exporting...");
        let scheduler = &session.scheduler;
        let text = match &self.target {
            ExportTarget::All => scheduler.export_all(&session.ctx)?,
            ExportTarget::Series(id) => scheduler.export_series(&session.ctx, id)?,
            ExportTarget::Window { from, to } => {
                let (from, to) = parse_window(scheduler.now(), from.as_deref(), to.as_deref())?;
                scheduler.export_window(&session.ctx, from.timestamp(), to.timestamp())?
            }
        };

        match self.output {
            Some(path) => {
                fs::write(&path, text)
                    .await
                    .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
                println!("{} {}", "Exported to".green(), path.display());
            }
            None => print!("{text}"),
        }
        Ok(())
    }
}
