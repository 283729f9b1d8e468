// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use jiff::Timestamp;

use crate::series::Occurrence;

/// Windows kept by [`ExpansionCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    owner: String,
    series_id: String,
    recurrence_version: u32,
    window_start: Timestamp,
    window_end: Timestamp,
}

#[derive(Debug)]
struct Entry {
    occurrences: Arc<[Occurrence]>,
    last_used: AtomicU64,
}

/// Memoized materialized windows, bounded to a fixed number of entries.
///
/// Entries are keyed by series and recurrence version, so a rescheduled
/// series never hits a stale window. Exception edits keep the version and
/// must call [`invalidate`](Self::invalidate). When full, the least recently
/// used window is evicted.
#[derive(Debug)]
pub struct ExpansionCache {
    entries: RwLock<HashMap<Key, Entry>>,
    capacity: usize,
    clock: AtomicU64,
}

impl Default for ExpansionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` windows; zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            clock: AtomicU64::new(0),
        }
    }

    pub fn get(
        &self,
        owner: &str,
        series_id: &str,
        recurrence_version: u32,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Option<Arc<[Occurrence]>> {
        let key = Key {
            owner: owner.to_string(),
            series_id: series_id.to_string(),
            recurrence_version,
            window_start,
            window_end,
        };
        // A poisoned cache only costs a recomputation.
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&key)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(entry.occurrences.clone())
    }

    pub fn insert(
        &self,
        owner: &str,
        series_id: &str,
        recurrence_version: u32,
        window_start: Timestamp,
        window_end: Timestamp,
        occurrences: Arc<[Occurrence]>,
    ) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        entries.retain(|key, _| {
            !(key.owner == owner
                && key.series_id == series_id
                && key.recurrence_version < recurrence_version)
        });

        let key = Key {
            owner: owner.to_string(),
            series_id: series_id.to_string(),
            recurrence_version,
            window_start,
            window_end,
        };
        while entries.len() >= self.capacity && !entries.contains_key(&key) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }

        let entry = Entry {
            occurrences,
            last_used: AtomicU64::new(self.tick()),
        };
        entries.insert(key, entry);
    }

    /// Drop every window of a series.
    pub fn invalidate(&self, owner: &str, series_id: &str) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.retain(|key, _| !(key.owner == owner && key.series_id == series_id));
            }
            Err(poisoned) => {
                tracing::warn!("expansion cache lock poisoned, clearing it");
                poisoned.into_inner().clear();
                self.entries.clear_poison();
            }
        }
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => {
                poisoned.into_inner().clear();
                self.entries.clear_poison();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}
