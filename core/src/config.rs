// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use jiff::tz::TimeZone;
use serde::de;

use crate::error::ValidationError;
use crate::generator::DEFAULT_LIMIT;

/// The name of the application.
pub const APP_NAME: &str = "recurcal";

/// Configuration for the scheduler service.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for storing application state.
    pub state_dir: Option<PathBuf>,

    /// IANA zone for floating times and new series, the system zone if unset.
    pub default_timezone: Option<String>,

    /// Ceiling on occurrences produced by one expansion.
    pub max_occurrences: usize,

    /// How far ahead upcoming occurrences are searched.
    pub upcoming_horizon: ConfigDuration,

    /// Owner used when the caller does not name one.
    pub owner: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: None,
            default_timezone: None,
            max_occurrences: DEFAULT_LIMIT,
            upcoming_horizon: ConfigDuration(SignedDuration::from_hours(365 * 24)),
            owner: "local".to_string(),
        }
    }
}

impl Config {
    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), Box<dyn Error>> {
        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(
                    expand_path(a)
                        .map_err(|e| format!("Failed to expand state directory path: {e}"))?,
                );
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        }

        self.time_zone()?;
        if self.max_occurrences == 0 {
            return Err(ValidationError::new("max_occurrences", "must be at least 1").into());
        }
        if self.upcoming_horizon.0.is_negative() {
            return Err(ValidationError::new("upcoming_horizon", "must not be negative").into());
        }
        Ok(())
    }

    /// The configured default zone.
    ///
    /// # Errors
    ///
    /// A [`ValidationError`] if the name is not a known IANA zone.
    pub fn time_zone(&self) -> Result<TimeZone, ValidationError> {
        match &self.default_timezone {
            Some(name) => TimeZone::get(name).map_err(|e| {
                ValidationError::new("default_timezone", format!("unknown zone {name:?}: {e}"))
            }),
            None => Ok(TimeZone::system()),
        }
    }
}

/// A duration written as "HH:MM", "1d", "24h", "60m" or "1800s".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDuration(pub SignedDuration);

impl<'de> serde::Deserialize<'de> for ConfigDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl de::Visitor<'_> for DurationVisitor {
            type Value = ConfigDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter
                    .write_str(r#"a duration string like "HH:MM", "1d", "24h", "60m", or "1800s""#)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse_duration(value)
                    .map(ConfigDuration)
                    .map_err(|e| de::Error::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(DurationVisitor)
    }
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or_else(|| "User-specific home directory not found".into())
}

/// User-specific configuration directory.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(not(unix))]
    let state_dir = dirs::data_dir();
    state_dir.ok_or_else(|| "User-specific state directory not found".into())
}

/// Parse a duration string in the format "HH:MM" / "1d" / "24h" / "60m" / "1800s".
fn parse_duration(s: &str) -> Result<SignedDuration, Box<dyn Error>> {
    if let Some((h, m)) = s.split_once(':') {
        let hours: i64 = h.trim().parse()?;
        let minutes: i64 = m.trim().parse()?;
        Ok(SignedDuration::from_mins(hours * 60 + minutes))
    } else if let Some(rest) = s.strip_suffix('d') {
        let days: i64 = rest.trim().parse()?;
        Ok(SignedDuration::from_hours(days * 24))
    } else if let Some(rest) = s.strip_suffix('h') {
        let hours: i64 = rest.trim().parse()?;
        Ok(SignedDuration::from_hours(hours))
    } else if let Some(rest) = s.strip_suffix('m') {
        let minutes: i64 = rest.trim().parse()?;
        Ok(SignedDuration::from_mins(minutes))
    } else if let Some(rest) = s.strip_suffix('s') {
        let seconds: i64 = rest.trim().parse()?;
        Ok(SignedDuration::from_secs(seconds))
    } else {
        Err(format!("Invalid duration format: {s}").into())
    }
}
