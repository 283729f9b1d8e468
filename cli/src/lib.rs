// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod arg;
mod cli;
mod cmd_export;
mod cmd_generate_completion;
mod cmd_import;
mod cmd_occurrence;
mod cmd_series;
mod config;
mod formatter;
mod state;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
pub use crate::config::{Config, parse_config};
