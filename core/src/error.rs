// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Errors returned by the recurrence engine and its service.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input rejected before anything was computed or stored
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A window would produce more occurrences than the configured ceiling
    #[error("expansion exceeds the limit of {limit} occurrences, narrow the window")]
    ExpansionOverflow {
        /// The ceiling that was hit
        limit: usize,
    },

    /// A well-formed recurrence rule that the engine cannot represent
    #[error("unsupported recurrence {part}: {reason}")]
    UnsupportedRule {
        /// Rule part or property name, e.g. `COUNT` or `RDATE`
        part: String,
        /// What exactly is not supported
        reason: String,
    },

    /// A referenced record does not exist for the calling owner
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Record kind, e.g. `series`
        kind: &'static str,
        /// Lookup key
        key: String,
    },

    /// Malformed iCalendar input
    #[error("failed to parse calendar: {0}")]
    Parse(String),

    /// Failure reported by a store collaborator
    #[error("store failure: {0}")]
    Store(String),

    /// Failure while writing calendar text
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unsupported(part: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedRule {
            part: part.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}

impl From<recurcal_ical::ParseError> for Error {
    fn from(err: recurcal_ical::ParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<recurcal_ical::ValueError> for Error {
    fn from(err: recurcal_ical::ValueError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// An input field that violates a rule, with the bound it broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field, e.g. `interval`
    pub field: &'static str,
    /// The violated bound
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
