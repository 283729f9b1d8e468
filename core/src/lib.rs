// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Recurrence expansion and occurrence exceptions for calendar series.
//!
//! A [`Series`] is a stored event that may repeat on a [`RecurrenceRule`].
//! [`generate`] expands it into original start instants inside a finite
//! window, [`materialize`] applies per-occurrence [`Exception`]s, and
//! [`CalendarSerializer`] reads and writes iCalendar text. [`Scheduler`]
//! ties these to the [`SeriesStore`] and [`ExceptionStore`] collaborators.

mod cache;
mod config;
mod error;
mod generator;
mod ics;
mod materializer;
mod rule;
mod scheduler;
mod series;
mod store;

pub use crate::cache::{DEFAULT_CACHE_CAPACITY, ExpansionCache};
pub use crate::config::{APP_NAME, Config, ConfigDuration, expand_path, get_config_dir};
pub use crate::error::{Error, ValidationError};
pub use crate::generator::{DEFAULT_LIMIT, generate};
pub use crate::ics::{
    CalendarSerializer, ImportedSeries, PRODID, X_RECURCAL_VERSION, parse_rule,
};
pub use crate::materializer::materialize;
pub use crate::rule::{
    Frequency, MonthlyRule, ORDINALS, RecurrenceRule, RuleDraft, UntilBound, validate,
};
pub use crate::scheduler::Scheduler;
pub use crate::series::{
    Context, DetailsPatch, Exception, ExceptionKind, Occurrence, OccurrencePatch, Override,
    SchedulePatch, Series, SeriesDraft,
};
pub use crate::store::{ExceptionStore, MemoryStore, OwnerSnapshot, Snapshot, SeriesStore};
