// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use recurcal_core::APP_NAME;
use tracing_subscriber::EnvFilter;

use crate::cmd_export::CmdExport;
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_import::CmdImport;
use crate::cmd_occurrence::{
    CmdOccurrenceDelete, CmdOccurrenceList, CmdOccurrenceModify, CmdOccurrenceRestore,
    CmdOccurrenceUpcoming,
};
use crate::cmd_series::{
    CmdSeriesDelete, CmdSeriesEdit, CmdSeriesList, CmdSeriesNew, CmdSeriesReschedule,
    CmdSeriesShow,
};
use crate::config::parse_config;
use crate::state::Session;

const RECURCAL_LOG_ENV: &str = "RECURCAL_LOG";

/// Run the recurcal command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                eprintln!("{} {}", "Error:".red(), e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(2);
        }
    };
    Ok(())
}

/// Log to stderr, filtered by `RECURCAL_LOG`, then `RUST_LOG`, then warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(RECURCAL_LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Recurring events with per-occurrence exceptions, in and out of iCalendar.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $RECURCAL_CONFIG, then \
$XDG_CONFIG_HOME/recurcal/config.toml on Linux and MacOS, %LOCALAPPDATA%/recurcal/config.toml on \
Windows. Built-in defaults are used when no file exists.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(
                Command::new("series")
                    .alias("s")
                    .about("Manage recurring series")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdSeriesNew::command())
                    .subcommand(CmdSeriesList::command())
                    .subcommand(CmdSeriesShow::command())
                    .subcommand(CmdSeriesEdit::command())
                    .subcommand(CmdSeriesReschedule::command())
                    .subcommand(CmdSeriesDelete::command()),
            )
            .subcommand(
                Command::new("occurrence")
                    .alias("o")
                    .about("List and change single occurrences")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdOccurrenceList::command())
                    .subcommand(CmdOccurrenceUpcoming::command())
                    .subcommand(CmdOccurrenceDelete::command())
                    .subcommand(CmdOccurrenceModify::command())
                    .subcommand(CmdOccurrenceRestore::command()),
            )
            .subcommand(CmdOccurrenceUpcoming::command().about("Shortcut for `occurrence upcoming`"))
            .subcommand(CmdExport::command())
            .subcommand(CmdImport::command())
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some(("series", matches)) => match matches.subcommand() {
                Some((CmdSeriesNew::NAME, matches)) => SeriesNew(CmdSeriesNew::from(matches)),
                Some((CmdSeriesList::NAME, matches)) => SeriesList(CmdSeriesList::from(matches)),
                Some((CmdSeriesShow::NAME, matches)) => SeriesShow(CmdSeriesShow::from(matches)),
                Some((CmdSeriesEdit::NAME, matches)) => SeriesEdit(CmdSeriesEdit::from(matches)),
                Some((CmdSeriesReschedule::NAME, matches)) => {
                    SeriesReschedule(CmdSeriesReschedule::from(matches))
                }
                Some((CmdSeriesDelete::NAME, matches)) => {
                    SeriesDelete(CmdSeriesDelete::from(matches))
                }
                _ => unreachable!(),
            },
            Some(("occurrence", matches)) => match matches.subcommand() {
                Some((CmdOccurrenceList::NAME, matches)) => {
                    OccurrenceList(CmdOccurrenceList::from(matches))
                }
                Some((CmdOccurrenceUpcoming::NAME, matches)) => {
                    OccurrenceUpcoming(CmdOccurrenceUpcoming::from(matches))
                }
                Some((CmdOccurrenceDelete::NAME, matches)) => {
                    OccurrenceDelete(CmdOccurrenceDelete::from(matches))
                }
                Some((CmdOccurrenceModify::NAME, matches)) => {
                    OccurrenceModify(CmdOccurrenceModify::from(matches))
                }
                Some((CmdOccurrenceRestore::NAME, matches)) => {
                    OccurrenceRestore(CmdOccurrenceRestore::from(matches))
                }
                _ => unreachable!(),
            },
            Some((CmdOccurrenceUpcoming::NAME, matches)) => {
                OccurrenceUpcoming(CmdOccurrenceUpcoming::from(matches))
            }
            Some((CmdExport::NAME, matches)) => Export(CmdExport::from(matches)),
            Some((CmdImport::NAME, matches)) => Import(CmdImport::from(matches)),
            Some((CmdGenerateCompletion::NAME, matches)) => {
                GenerateCompletion(CmdGenerateCompletion::from(matches))
            }
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Create a series
    SeriesNew(CmdSeriesNew),

    /// List series
    SeriesList(CmdSeriesList),

    /// Show a series
    SeriesShow(CmdSeriesShow),

    /// Change title or description of a series
    SeriesEdit(CmdSeriesEdit),

    /// Change when a series happens
    SeriesReschedule(CmdSeriesReschedule),

    /// Delete series
    SeriesDelete(CmdSeriesDelete),

    /// List occurrences in a window
    OccurrenceList(CmdOccurrenceList),

    /// List the next occurrences
    OccurrenceUpcoming(CmdOccurrenceUpcoming),

    /// Cancel an occurrence
    OccurrenceDelete(CmdOccurrenceDelete),

    /// Change an occurrence
    OccurrenceModify(CmdOccurrenceModify),

    /// Undo an occurrence change
    OccurrenceRestore(CmdOccurrenceRestore),

    /// Export iCalendar
    Export(CmdExport),

    /// Import iCalendar
    Import(CmdImport),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            SeriesNew(a)          => Self::run_with(config, |x| a.run(x).boxed()).await,
            SeriesList(a)         => Self::run_with(config, |x| a.run(x).boxed()).await,
            SeriesShow(a)         => Self::run_with(config, |x| a.run(x).boxed()).await,
            SeriesEdit(a)         => Self::run_with(config, |x| a.run(x).boxed()).await,
            SeriesReschedule(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            SeriesDelete(a)       => Self::run_with(config, |x| a.run(x).boxed()).await,
            OccurrenceList(a)     => Self::run_with(config, |x| a.run(x).boxed()).await,
            OccurrenceUpcoming(a) => Self::run_with(config, |x| a.run(x).boxed()).await,
            OccurrenceDelete(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            OccurrenceModify(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            OccurrenceRestore(a)  => Self::run_with(config, |x| a.run(x).boxed()).await,
            Export(a)             => Self::run_with(config, |x| a.run(x).boxed()).await,
            Import(a)             => Self::run_with(config, |x| a.run(x).boxed()).await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a mut Session) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let (core_config, config) = parse_config(config).await?;
        let mut session = Session::open(core_config, config).await?;

        f(&mut session).await?;

        session.close().await?;
        Ok(())
    }
}
