// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use tokio::fs;

use recurcal_core::{APP_NAME, Config as CoreConfig, expand_path, get_config_dir};

const RECURCAL_CONFIG_ENV: &str = "RECURCAL_CONFIG";

/// Load the configuration from the CLI flag, `RECURCAL_CONFIG`, or the
/// default location, in that order.
///
/// A missing file at the default location yields the default configuration;
/// a missing file that was named explicitly is an error.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<(CoreConfig, Config), Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(RECURCAL_CONFIG_ENV) {
        expand_path(&PathBuf::from(env_path))?
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            tracing::debug!(path = %config.display(), "no config file, using defaults");
            let mut core = CoreConfig::default();
            core.normalize()?;
            return Ok((core, Config::default()));
        }
        config
    };

    let ConfigRaw { mut core, cli } = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()
        .map_err(|e| format!("Failed to parse config file at {}: {}", path.display(), e))?;
    core.normalize()?;
    Ok((core, cli))
}

/// Configuration of the command-line interface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of occurrences `occurrence upcoming` shows by default.
    pub upcoming_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { upcoming_limit: 10 }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigRaw {
    core: CoreConfig,
    cli: Config,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
