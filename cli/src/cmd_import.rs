// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgMatches, Command, ValueHint, arg, value_parser};
use colored::Colorize;
use futures::future::try_join_all;
use recurcal_core::Series;
use tokio::fs;

use crate::arg::CommonArgs;
use crate::formatter::{Formatter, SeriesColumn};
use crate::state::Session;
use crate::util::OutputFormat;

/// Import iCalendar files; series with a known id are replaced.
#[derive(Debug, Clone)]
pub struct CmdImport {
    pub paths: Vec<PathBuf>,
    pub output_format: OutputFormat,
}

impl CmdImport {
    pub const NAME: &str = "import";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Import series from iCalendar files")
            .arg(
                arg!(path: <FILE> "iCalendar files to import")
                    .num_args(1..)
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            paths: matches
                .get_many::<PathBuf>("path")
                .expect("path is required")
                .cloned()
                .collect(),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, session: &mut Session) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "importing...");
        // Read everything first so an unreadable file stops the import early
        let texts = try_join_all(self.paths.iter().map(|path| async move {
            fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
        }))
        .await?;

        let mut imported: Vec<Series> = Vec::new();
        for (path, text) in self.paths.iter().zip(texts) {
            let items = session
                .scheduler
                .import_text(&session.ctx, &text)
                .map_err(|e| format!("Failed to import {}: {}", path.display(), e))?;
            tracing::info!(path = %path.display(), count = items.len(), "file imported");
            imported.extend(items.into_iter().map(|item| item.series));
        }

        if self.output_format == OutputFormat::Table {
            let prompt = format!("Imported {} series", imported.len());
            println!("{}", prompt.green());
        }
        let formatter =
            Formatter::new(SeriesColumn::columns(false)).with_output_format(self.output_format);
        println!("{}", formatter.format(&imported));
        Ok(())
    }
}
