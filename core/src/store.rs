// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Storage collaborators and the in-memory store.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::series::{Context, Exception, Series};

/// Persistence of series, scoped by the calling owner.
pub trait SeriesStore: Send + Sync {
    /// # Errors
    ///
    /// [`Error::NotFound`] if the owner has no series with this id.
    fn get(&self, ctx: &Context, id: &str) -> Result<Series, Error>;

    /// All series of the owner, ordered by id.
    fn list(&self, ctx: &Context) -> Result<Vec<Series>, Error>;

    /// Insert or replace a series.
    fn put(&self, ctx: &Context, series: Series) -> Result<(), Error>;

    /// # Errors
    ///
    /// [`Error::NotFound`] if the owner has no series with this id.
    fn delete(&self, ctx: &Context, id: &str) -> Result<(), Error>;
}

/// Persistence of exceptions, keyed by series and original start.
pub trait ExceptionStore: Send + Sync {
    /// Exceptions of one series, ordered by original start.
    fn exceptions(&self, ctx: &Context, series_id: &str) -> Result<Vec<Exception>, Error>;

    /// Insert or replace the exception for its slot.
    fn put(&self, ctx: &Context, exception: Exception) -> Result<(), Error>;

    /// Remove the exception for a slot, returning whether one existed.
    fn delete(&self, ctx: &Context, series_id: &str, original_start: Timestamp)
    -> Result<bool, Error>;

    /// Remove every exception of a series, returning what was removed.
    fn delete_all(&self, ctx: &Context, series_id: &str) -> Result<Vec<Exception>, Error>;
}

/// Everything one owner has stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    #[serde(default)]
    pub series: BTreeMap<String, Series>,
    #[serde(default)]
    pub exceptions: Vec<Exception>,
}

/// Serializable contents of a [`MemoryStore`], keyed by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub owners: BTreeMap<String, OwnerSnapshot>,
}

/// Both stores over maps behind a [`RwLock`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Copy the current contents.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the lock was poisoned.
    pub fn snapshot(&self) -> Result<Snapshot, Error> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, Error> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, Error> {
        self.inner.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::Store("store lock poisoned".to_string())
}

impl SeriesStore for MemoryStore {
    fn get(&self, ctx: &Context, id: &str) -> Result<Series, Error> {
        self.read()?
            .owners
            .get(ctx.owner())
            .and_then(|owner| owner.series.get(id))
            .cloned()
            .ok_or_else(|| Error::not_found("series", id))
    }

    fn list(&self, ctx: &Context) -> Result<Vec<Series>, Error> {
        Ok(self
            .read()?
            .owners
            .get(ctx.owner())
            .map(|owner| owner.series.values().cloned().collect())
            .unwrap_or_default())
    }

    fn put(&self, ctx: &Context, series: Series) -> Result<(), Error> {
        let mut inner = self.write()?;
        let owner = inner.owners.entry(ctx.owner().to_string()).or_default();
        owner.series.insert(series.id().to_string(), series);
        Ok(())
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<(), Error> {
        self.write()?
            .owners
            .get_mut(ctx.owner())
            .and_then(|owner| owner.series.remove(id))
            .map(|_| ())
            .ok_or_else(|| Error::not_found("series", id))
    }
}

impl ExceptionStore for MemoryStore {
    fn exceptions(&self, ctx: &Context, series_id: &str) -> Result<Vec<Exception>, Error> {
        let inner = self.read()?;
        let mut out: Vec<Exception> = inner
            .owners
            .get(ctx.owner())
            .map(|owner| {
                owner
                    .exceptions
                    .iter()
                    .filter(|e| e.series_id == series_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by_key(|e| e.original_start);
        Ok(out)
    }

    fn put(&self, ctx: &Context, exception: Exception) -> Result<(), Error> {
        let mut inner = self.write()?;
        let owner = inner.owners.entry(ctx.owner().to_string()).or_default();
        match owner
            .exceptions
            .iter_mut()
            .find(|e| e.matches(&exception.series_id, exception.original_start))
        {
            Some(slot) => *slot = exception,
            None => owner.exceptions.push(exception),
        }
        Ok(())
    }

    fn delete(
        &self,
        ctx: &Context,
        series_id: &str,
        original_start: Timestamp,
    ) -> Result<bool, Error> {
        let mut inner = self.write()?;
        let Some(owner) = inner.owners.get_mut(ctx.owner()) else {
            return Ok(false);
        };
        let before = owner.exceptions.len();
        owner
            .exceptions
            .retain(|e| !e.matches(series_id, original_start));
        Ok(owner.exceptions.len() != before)
    }

    fn delete_all(&self, ctx: &Context, series_id: &str) -> Result<Vec<Exception>, Error> {
        let mut inner = self.write()?;
        let Some(owner) = inner.owners.get_mut(ctx.owner()) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<Exception>, Vec<Exception>) = std::mem::take(&mut owner.exceptions)
            .into_iter()
            .partition(|e| e.series_id == series_id);
        owner.exceptions = kept;
        Ok(removed)
    }
}
