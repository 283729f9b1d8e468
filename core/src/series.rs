// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::{RoundMode, SignedDuration, Timestamp, Unit, Zoned, ZonedRound};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};
use crate::ics::draft_from_rrule;
use crate::rule::{RecurrenceRule, RuleDraft, validate};

/// The caller on whose behalf a store is accessed.
///
/// Stores scope every record by owner; nothing is shared across owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    owner: String,
}

impl Context {
    /// Creates a context for the given owner.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    /// The owner name.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Input for a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDraft {
    /// The title of the series
    pub title: String,
    /// Free text description, possibly empty
    pub description: String,
    /// Start of the first occurrence
    pub start: Zoned,
    /// End of the first occurrence, not before `start`
    pub end: Zoned,
    /// Repetition rule, `None` for a single event
    pub recurrence: Option<RuleDraft>,
}

/// A stored event definition that may repeat.
///
/// Every occurrence lasts `anchor_end - anchor_start` and starts at the
/// anchor's wall-clock time in the anchor's time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRecord", into = "SeriesRecord")]
pub struct Series {
    id: String,
    title: String,
    description: String,
    anchor_start: Zoned,
    anchor_end: Zoned,
    recurrence: Option<RecurrenceRule>,
    recurrence_version: u32,
}

impl Series {
    /// Validate a draft and build a series at recurrence version 1.
    ///
    /// Start and end are truncated to whole seconds.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the end precedes the start or the rule is
    /// invalid.
    pub fn new(id: impl Into<String>, draft: SeriesDraft) -> Result<Self, Error> {
        let start = whole_seconds("start", &draft.start)?;
        let end = whole_seconds("end", &draft.end)?;
        let recurrence = validate_schedule(&start, &end, draft.recurrence)?;
        Ok(Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            anchor_start: start,
            anchor_end: end,
            recurrence,
            recurrence_version: 1,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn anchor_start(&self) -> &Zoned {
        &self.anchor_start
    }

    pub fn anchor_end(&self) -> &Zoned {
        &self.anchor_end
    }

    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref()
    }

    /// Bumped whenever the anchor or the rule changes.
    pub const fn recurrence_version(&self) -> u32 {
        self.recurrence_version
    }

    /// Length of every occurrence.
    pub fn duration(&self) -> SignedDuration {
        self.anchor_end
            .timestamp()
            .duration_since(self.anchor_start.timestamp())
    }

    pub(crate) fn set_details(&mut self, title: Option<String>, description: Option<String>) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
    }

    /// Replace the schedule and bump the recurrence version.
    pub(crate) fn reschedule(
        &mut self,
        start: Zoned,
        end: Zoned,
        recurrence: Option<RuleDraft>,
    ) -> Result<(), Error> {
        let start = whole_seconds("start", &start)?;
        let end = whole_seconds("end", &end)?;
        let recurrence = validate_schedule(&start, &end, recurrence)?;
        self.anchor_start = start;
        self.anchor_end = end;
        self.recurrence = recurrence;
        self.recurrence_version += 1;
        Ok(())
    }

    pub(crate) fn with_version(mut self, version: u32) -> Self {
        self.recurrence_version = version;
        self
    }
}

/// Drop sub-second precision, which iCalendar cannot carry.
pub(crate) fn whole_seconds(field: &'static str, zdt: &Zoned) -> Result<Zoned, ValidationError> {
    zdt.round(
        ZonedRound::new()
            .smallest(Unit::Second)
            .mode(RoundMode::Trunc),
    )
    .map_err(|e| ValidationError::new(field, e.to_string()))
}

fn validate_schedule(
    start: &Zoned,
    end: &Zoned,
    recurrence: Option<RuleDraft>,
) -> Result<Option<RecurrenceRule>, ValidationError> {
    if end < start {
        return Err(ValidationError::new(
            "end",
            format!("{end} is before the start {start}"),
        ));
    }
    recurrence.map(|draft| validate(draft, start)).transpose()
}

/// Stored form of a series; the rule is kept as `RRULE` text and validated
/// again on load.
#[derive(Serialize, Deserialize)]
struct SeriesRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    anchor_start: Zoned,
    anchor_end: Zoned,
    #[serde(default)]
    recurrence: Option<String>,
    recurrence_version: u32,
}

impl From<Series> for SeriesRecord {
    fn from(series: Series) -> Self {
        Self {
            recurrence: series.recurrence.as_ref().map(ToString::to_string),
            id: series.id,
            title: series.title,
            description: series.description,
            anchor_start: series.anchor_start,
            anchor_end: series.anchor_end,
            recurrence_version: series.recurrence_version,
        }
    }
}

impl TryFrom<SeriesRecord> for Series {
    type Error = Error;

    fn try_from(record: SeriesRecord) -> Result<Self, Self::Error> {
        let recurrence = record
            .recurrence
            .map(|text| {
                let value = recurcal_ical::value::parse_rrule(&text)?;
                draft_from_rrule(&value, &record.anchor_start)
            })
            .transpose()?;
        let draft = SeriesDraft {
            title: record.title,
            description: record.description,
            start: record.anchor_start,
            end: record.anchor_end,
            recurrence,
        };
        Ok(Self::new(record.id, draft)?.with_version(record.recurrence_version))
    }
}

/// One concrete instance of a series inside a query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Owning series
    pub series_id: String,
    /// Slot computed from the rule, stable across modifications
    pub original_start: Zoned,
    /// Effective start
    pub start: Zoned,
    /// Effective end
    pub end: Zoned,
    /// Effective title
    pub title: String,
    /// Effective description
    pub description: String,
    /// Whether an override changed this instance
    pub modified: bool,
}

/// A per-occurrence deviation from the series, keyed by the original start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    /// Owning series
    pub series_id: String,
    /// Slot the exception applies to
    pub original_start: Timestamp,
    /// Series recurrence version the exception was made against
    pub recurrence_version: u32,
    /// What happens to the slot
    pub kind: ExceptionKind,
}

impl Exception {
    /// Whether the exception applies to this slot of this series.
    pub fn matches(&self, series_id: &str, original_start: Timestamp) -> bool {
        self.series_id == series_id && self.original_start == original_start
    }
}

/// What an exception does to its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExceptionKind {
    /// The occurrence does not happen.
    Deleted,
    /// The occurrence happens with changed fields.
    Modified(Override),
}

/// Replacement fields for a modified occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// New start
    pub start: Zoned,
    /// New end, `None` keeps the series duration from the new start
    #[serde(default)]
    pub end: Option<Zoned>,
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
}

/// Changes to a series that keep its occurrences where they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Changes to when a series happens.
///
/// A changed start without an end keeps the current duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    pub start: Option<Zoned>,
    pub end: Option<Zoned>,
    /// `Some(None)` removes the rule, leaving a single event.
    pub recurrence: Option<Option<RuleDraft>>,
}

/// Changes to a single occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrencePatch {
    pub start: Option<Zoned>,
    pub end: Option<Zoned>,
    pub title: Option<String>,
    pub description: Option<String>,
}
