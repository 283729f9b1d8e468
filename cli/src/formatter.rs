// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;
use std::fmt;

use colored::Color;
use recurcal_core::{Occurrence, Series};

use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::{OutputFormat, format_datetime, format_span};

/// Renders rows of `T` through a set of columns in one output format.
#[derive(Debug)]
pub struct Formatter<C> {
    columns: Vec<C>,
    format: OutputFormat,
}

impl<C> Formatter<C> {
    pub fn new(columns: Vec<C>) -> Self {
        Self {
            columns,
            format: OutputFormat::Table,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format<'a, T>(&'a self, data: &'a [T]) -> Display<'a, C, T>
    where
        C: TableColumn<T>,
    {
        Display {
            data,
            formatter: self,
        }
    }
}

#[derive(Debug)]
pub struct Display<'a, C, T> {
    data: &'a [T],
    formatter: &'a Formatter<C>,
}

impl<C: TableColumn<T>, T> fmt::Display for Display<'_, C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = &self.formatter.columns;
        match self.formatter.format {
            OutputFormat::Json => write!(
                f,
                "{}",
                Table::new(TableStyleJson::new(), columns, self.data)
            ),
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(TableStyleBasic::new(), columns, self.data)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceColumn {
    SeriesId,
    OriginalStart,
    TimeRange,
    Title,
    Modified,
}

impl OccurrenceColumn {
    pub fn columns(verbose: bool) -> Vec<Self> {
        if verbose {
            vec![
                Self::SeriesId,
                Self::OriginalStart,
                Self::TimeRange,
                Self::Title,
                Self::Modified,
            ]
        } else {
            vec![Self::TimeRange, Self::Title]
        }
    }
}

impl TableColumn<Occurrence> for OccurrenceColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            Self::SeriesId => "Series ID",
            Self::OriginalStart => "Original Start",
            Self::TimeRange => "Time Range",
            Self::Title => "Title",
            Self::Modified => "Modified",
        }
        .into()
    }

    fn format<'a>(&self, data: &'a Occurrence) -> Cow<'a, str> {
        match self {
            Self::SeriesId => data.series_id.as_str().into(),
            Self::OriginalStart => format_datetime(&data.original_start).into(),
            Self::TimeRange => format_span(&data.start, &data.end).into(),
            Self::Title => data.title.as_str().into(),
            Self::Modified => if data.modified { "yes" } else { "no" }.into(),
        }
    }

    fn color(&self, data: &Occurrence) -> Option<Color> {
        match self {
            Self::TimeRange if data.modified => Some(Color::Yellow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesColumn {
    Id,
    TimeRange,
    TimeZone,
    Recurrence,
    Version,
    Title,
}

impl SeriesColumn {
    pub fn columns(verbose: bool) -> Vec<Self> {
        if verbose {
            vec![
                Self::Id,
                Self::TimeRange,
                Self::TimeZone,
                Self::Recurrence,
                Self::Version,
                Self::Title,
            ]
        } else {
            vec![Self::Id, Self::TimeRange, Self::Recurrence, Self::Title]
        }
    }
}

impl TableColumn<Series> for SeriesColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Id => "ID",
            Self::TimeRange => "Time Range",
            Self::TimeZone => "Time Zone",
            Self::Recurrence => "Recurrence",
            Self::Version => "Version",
            Self::Title => "Title",
        }
        .into()
    }

    fn format<'a>(&self, data: &'a Series) -> Cow<'a, str> {
        match self {
            Self::Id => data.id().into(),
            Self::TimeRange => format_span(data.anchor_start(), data.anchor_end()).into(),
            Self::TimeZone => data
                .anchor_start()
                .time_zone()
                .iana_name()
                .unwrap_or("fixed offset")
                .to_string()
                .into(),
            Self::Recurrence => match data.recurrence() {
                Some(rule) => rule.to_string().into(),
                None => "once".into(),
            },
            Self::Version => data.recurrence_version().to_string().into(),
            Self::Title => data.title().into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            Self::Version => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn color(&self, data: &Series) -> Option<Color> {
        match self {
            Self::Recurrence if data.recurrence().is_none() => Some(Color::BrightBlack),
            _ => None,
        }
    }
}
