// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::slice;
use std::sync::Arc;

use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use uuid::Uuid;

use crate::cache::ExpansionCache;
use crate::config::Config;
use crate::error::{Error, ValidationError};
use crate::generator::{check_window, generate};
use crate::ics::{CalendarSerializer, ImportedSeries};
use crate::materializer::materialize;
use crate::rule::RuleDraft;
use crate::series::{
    Context, DetailsPatch, Exception, ExceptionKind, Occurrence, OccurrencePatch, Override,
    SchedulePatch, Series, SeriesDraft, whole_seconds,
};
use crate::store::{ExceptionStore, MemoryStore, SeriesStore};

/// Recurring event service over a pair of stores.
pub struct Scheduler {
    now: Zoned,
    config: Config,
    tz: TimeZone,
    series: Arc<dyn SeriesStore>,
    exceptions: Arc<dyn ExceptionStore>,
    cache: ExpansionCache,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler with the given configuration and stores.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the configured default zone is unknown.
    pub fn new(
        config: Config,
        series: Arc<dyn SeriesStore>,
        exceptions: Arc<dyn ExceptionStore>,
    ) -> Result<Self, Error> {
        let tz = config.time_zone()?;
        Ok(Self {
            now: Zoned::now().with_time_zone(tz.clone()),
            config,
            tz,
            series,
            exceptions,
            cache: ExpansionCache::new(),
        })
    }

    /// Creates a scheduler backed by one [`MemoryStore`].
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::new`].
    pub fn with_memory_store(config: Config, store: Arc<MemoryStore>) -> Result<Self, Error> {
        Self::new(config, store.clone(), store)
    }

    /// Pin the current time.
    #[must_use]
    pub fn with_now(mut self, now: Zoned) -> Self {
        self.now = now;
        self
    }

    /// The current time in the default zone.
    pub fn now(&self) -> &Zoned {
        &self.now
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Zone used for floating times and new series.
    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }

    /// Create a series with a fresh id.
    #[tracing::instrument(skip(self))]
    pub fn create_series(&self, ctx: &Context, draft: SeriesDraft) -> Result<Series, Error> {
        let series = Series::new(Uuid::new_v4().to_string(), draft)?;
        self.series.put(ctx, series.clone())?;
        tracing::debug!(series_id = series.id(), "series created");
        Ok(series)
    }

    pub fn get_series(&self, ctx: &Context, id: &str) -> Result<Series, Error> {
        self.series.get(ctx, id)
    }

    pub fn list_series(&self, ctx: &Context) -> Result<Vec<Series>, Error> {
        self.series.list(ctx)
    }

    /// Change title or description; occurrences and exceptions stay.
    #[tracing::instrument(skip(self))]
    pub fn update_details(
        &self,
        ctx: &Context,
        id: &str,
        patch: DetailsPatch,
    ) -> Result<Series, Error> {
        let mut series = self.series.get(ctx, id)?;
        series.set_details(patch.title, patch.description);
        self.series.put(ctx, series.clone())?;
        self.cache.invalidate(ctx.owner(), id);
        Ok(series)
    }

    /// Change the anchor or the rule of a series.
    ///
    /// The recurrence version is bumped and every exception of the series is
    /// dropped, since its slot may no longer exist. The dropped exceptions
    /// are returned. An empty patch changes nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the new schedule is invalid, in which case
    /// nothing is changed.
    #[tracing::instrument(skip(self))]
    pub fn update_schedule(
        &self,
        ctx: &Context,
        id: &str,
        patch: SchedulePatch,
    ) -> Result<(Series, Vec<Exception>), Error> {
        let mut series = self.series.get(ctx, id)?;
        if patch.start.is_none() && patch.end.is_none() && patch.recurrence.is_none() {
            return Ok((series, Vec::new()));
        }

        let end = match (&patch.end, &patch.start) {
            (Some(end), _) => end.clone(),
            (None, Some(start)) => start
                .checked_add(series.duration())
                .map_err(|e| ValidationError::new("end", e.to_string()))?,
            (None, None) => series.anchor_end().clone(),
        };
        let start = patch
            .start
            .unwrap_or_else(|| series.anchor_start().clone());
        let recurrence = match patch.recurrence {
            Some(recurrence) => recurrence,
            None => series.recurrence().map(RuleDraft::from),
        };
        series.reschedule(start, end, recurrence)?;

        self.series.put(ctx, series.clone())?;
        let dropped = self.exceptions.delete_all(ctx, id)?;
        self.cache.invalidate(ctx.owner(), id);
        if !dropped.is_empty() {
            tracing::info!(
                series_id = id,
                version = series.recurrence_version(),
                dropped = dropped.len(),
                "dropped exceptions orphaned by a schedule change"
            );
        }
        Ok((series, dropped))
    }

    /// Delete a series together with its exceptions.
    #[tracing::instrument(skip(self))]
    pub fn delete_series(&self, ctx: &Context, id: &str) -> Result<(), Error> {
        self.series.delete(ctx, id)?;
        let dropped = self.exceptions.delete_all(ctx, id)?;
        self.cache.invalidate(ctx.owner(), id);
        tracing::debug!(series_id = id, exceptions = dropped.len(), "series deleted");
        Ok(())
    }

    /// Cancel one occurrence.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the series does not exist or produces no
    /// occurrence at `original_start`.
    #[tracing::instrument(skip(self))]
    pub fn delete_occurrence(
        &self,
        ctx: &Context,
        series_id: &str,
        original_start: Timestamp,
    ) -> Result<Exception, Error> {
        let series = self.series.get(ctx, series_id)?;
        self.slot(&series, original_start)?;

        let exception = Exception {
            series_id: series_id.to_string(),
            original_start,
            recurrence_version: series.recurrence_version(),
            kind: ExceptionKind::Deleted,
        };
        self.exceptions.put(ctx, exception.clone())?;
        self.cache.invalidate(ctx.owner(), series_id);
        Ok(exception)
    }

    /// Change one occurrence, merging with an earlier modification of the
    /// same slot. A cancelled occurrence comes back with the patch applied.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] as for [`delete_occurrence`](Self::delete_occurrence).
    /// - [`Error::Validation`] if the occurrence would end before it starts.
    #[tracing::instrument(skip(self))]
    pub fn modify_occurrence(
        &self,
        ctx: &Context,
        series_id: &str,
        original_start: Timestamp,
        patch: OccurrencePatch,
    ) -> Result<Occurrence, Error> {
        let series = self.series.get(ctx, series_id)?;
        let slot = self.slot(&series, original_start)?;

        let previous = self
            .exceptions
            .exceptions(ctx, series_id)?
            .into_iter()
            .find(|e| {
                e.matches(series_id, original_start)
                    && e.recurrence_version == series.recurrence_version()
            });
        let mut o = match previous.map(|e| e.kind) {
            Some(ExceptionKind::Modified(o)) => o,
            _ => Override {
                start: slot,
                end: None,
                title: None,
                description: None,
            },
        };
        if let Some(start) = patch.start {
            o.start = whole_seconds("start", &start)?;
        }
        if let Some(end) = patch.end {
            o.end = Some(whole_seconds("end", &end)?);
        }
        if patch.title.is_some() {
            o.title = patch.title;
        }
        if patch.description.is_some() {
            o.description = patch.description;
        }
        if let Some(end) = &o.end
            && *end < o.start
        {
            return Err(ValidationError::new(
                "end",
                format!("{end} is before the start {}", o.start),
            )
            .into());
        }

        let exception = Exception {
            series_id: series_id.to_string(),
            original_start,
            recurrence_version: series.recurrence_version(),
            kind: ExceptionKind::Modified(o),
        };
        let occurrence = materialize(
            &series,
            slice::from_ref(&exception),
            original_start,
            original_start,
            self.config.max_occurrences,
        )?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("occurrence", slot_key(series_id, original_start)))?;

        self.exceptions.put(ctx, exception)?;
        self.cache.invalidate(ctx.owner(), series_id);
        Ok(occurrence)
    }

    /// Undo a cancellation or modification.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the series or the exception does not exist.
    #[tracing::instrument(skip(self))]
    pub fn restore_occurrence(
        &self,
        ctx: &Context,
        series_id: &str,
        original_start: Timestamp,
    ) -> Result<(), Error> {
        self.series.get(ctx, series_id)?;
        if !self.exceptions.delete(ctx, series_id, original_start)? {
            return Err(Error::not_found(
                "exception",
                slot_key(series_id, original_start),
            ));
        }
        self.cache.invalidate(ctx.owner(), series_id);
        Ok(())
    }

    /// Occurrences of every series of the owner whose original start lies
    /// in `[window_start, window_end]`, ascending by start, then series id,
    /// then original start.
    #[tracing::instrument(skip(self))]
    pub fn list_occurrences(
        &self,
        ctx: &Context,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Result<Vec<Occurrence>, Error> {
        self.collect(ctx, window_start, window_end, true)
    }

    /// The next `limit` occurrences starting at or after now, within the
    /// configured horizon.
    ///
    /// Slots are expanded as far back as ahead, so a slot that an override
    /// moved across now is judged by its effective start.
    #[tracing::instrument(skip(self))]
    pub fn list_upcoming(&self, ctx: &Context, limit: usize) -> Result<Vec<Occurrence>, Error> {
        let now = self.now.timestamp();
        let horizon = self.config.upcoming_horizon.0;
        let window_start = now.checked_sub(horizon).unwrap_or(Timestamp::MIN);
        let window_end = now.checked_add(horizon).unwrap_or(Timestamp::MAX);
        let mut occurrences = self.collect(ctx, window_start, window_end, false)?;
        occurrences.retain(|o| {
            let start = o.start.timestamp();
            now <= start && start <= window_end
        });
        occurrences.truncate(limit);
        Ok(occurrences)
    }

    /// One series with its exceptions as an iCalendar document.
    #[tracing::instrument(skip(self))]
    pub fn export_series(&self, ctx: &Context, id: &str) -> Result<String, Error> {
        let series = self.series.get(ctx, id)?;
        let exceptions = self.exceptions.exceptions(ctx, id)?;
        self.serializer().serialize_series(&[(series, exceptions)])
    }

    /// Every series of the owner as one iCalendar document.
    #[tracing::instrument(skip(self))]
    pub fn export_all(&self, ctx: &Context) -> Result<String, Error> {
        let entries = self
            .series
            .list(ctx)?
            .into_iter()
            .map(|series| {
                let exceptions = self.exceptions.exceptions(ctx, series.id())?;
                Ok((series, exceptions))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        self.serializer().serialize_series(&entries)
    }

    /// The occurrences of a window as standalone events.
    #[tracing::instrument(skip(self))]
    pub fn export_window(
        &self,
        ctx: &Context,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Result<String, Error> {
        let occurrences = self.list_occurrences(ctx, window_start, window_end)?;
        self.serializer().serialize_occurrences(&occurrences)
    }

    /// Import calendar text written by [`export_series`](Self::export_series).
    ///
    /// Everything is parsed and validated before the first write. Existing
    /// series with the same id are replaced together with their exceptions.
    /// If a store write fails, earlier writes of this import are undone.
    #[tracing::instrument(skip(self, text))]
    pub fn import_text(&self, ctx: &Context, text: &str) -> Result<Vec<ImportedSeries>, Error> {
        let imported = self.serializer().parse(text)?;

        let mut previous = Vec::with_capacity(imported.len());
        for item in &imported {
            let id = item.series.id();
            let series = match self.series.get(ctx, id) {
                Ok(series) => Some(series),
                Err(Error::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
            previous.push((id.to_string(), series, self.exceptions.exceptions(ctx, id)?));
        }

        for (done, item) in imported.iter().enumerate() {
            if let Err(e) = self.replace(ctx, item) {
                tracing::error!(err = %e, "import failed, rolling back");
                for (id, series, exceptions) in previous.into_iter().take(done + 1) {
                    if let Err(e) = self.restore(ctx, &id, series, exceptions) {
                        tracing::error!(series_id = id, err = %e, "failed to roll back series");
                    }
                }
                return Err(e);
            }
        }

        tracing::info!(count = imported.len(), "series imported");
        Ok(imported)
    }

    fn replace(&self, ctx: &Context, item: &ImportedSeries) -> Result<(), Error> {
        let id = item.series.id();
        self.series.put(ctx, item.series.clone())?;
        self.exceptions.delete_all(ctx, id)?;
        for exception in &item.exceptions {
            self.exceptions.put(ctx, exception.clone())?;
        }
        self.cache.invalidate(ctx.owner(), id);
        Ok(())
    }

    fn restore(
        &self,
        ctx: &Context,
        id: &str,
        series: Option<Series>,
        exceptions: Vec<Exception>,
    ) -> Result<(), Error> {
        self.cache.invalidate(ctx.owner(), id);
        match series {
            Some(series) => self.series.put(ctx, series)?,
            None => match self.series.delete(ctx, id) {
                Ok(()) | Err(Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            },
        }
        self.exceptions.delete_all(ctx, id)?;
        for exception in exceptions {
            self.exceptions.put(ctx, exception)?;
        }
        Ok(())
    }

    fn collect(
        &self,
        ctx: &Context,
        window_start: Timestamp,
        window_end: Timestamp,
        cached: bool,
    ) -> Result<Vec<Occurrence>, Error> {
        check_window(window_start, window_end)?;

        let mut occurrences = Vec::new();
        for series in self.series.list(ctx)? {
            let key = (ctx.owner(), series.id(), series.recurrence_version());
            if cached
                && let Some(hit) = self.cache.get(key.0, key.1, key.2, window_start, window_end)
            {
                occurrences.extend(hit.iter().cloned());
                continue;
            }

            let exceptions = self.exceptions.exceptions(ctx, series.id())?;
            let expanded = materialize(
                &series,
                &exceptions,
                window_start,
                window_end,
                self.config.max_occurrences,
            )?;
            if cached {
                self.cache.insert(
                    key.0,
                    key.1,
                    key.2,
                    window_start,
                    window_end,
                    Arc::from(expanded.as_slice()),
                );
            }
            occurrences.extend(expanded);
        }

        occurrences.sort_by(|a, b| {
            a.start
                .timestamp()
                .cmp(&b.start.timestamp())
                .then_with(|| a.series_id.cmp(&b.series_id))
                .then_with(|| a.original_start.timestamp().cmp(&b.original_start.timestamp()))
        });
        Ok(occurrences)
    }

    /// The generated slot at `original_start`.
    fn slot(&self, series: &Series, original_start: Timestamp) -> Result<Zoned, Error> {
        generate(
            series,
            original_start,
            original_start,
            self.config.max_occurrences,
        )?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("occurrence", slot_key(series.id(), original_start)))
    }

    fn serializer(&self) -> CalendarSerializer {
        CalendarSerializer::new(self.tz.clone(), self.now.timestamp())
    }
}

fn slot_key(series_id: &str, original_start: Timestamp) -> String {
    format!("{series_id} at {original_start}")
}
