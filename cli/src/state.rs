// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use recurcal_core::{Config as CoreConfig, Context, MemoryStore, Scheduler, Snapshot};
use tokio::fs;

use crate::config::Config;

const STATE_FILE: &str = "state.json";

/// A scheduler loaded from the state file, written back on [`close`](Self::close).
#[derive(Debug)]
pub struct Session {
    pub scheduler: Scheduler,
    pub ctx: Context,
    pub config: Config,
    store: Arc<MemoryStore>,
    path: Option<PathBuf>,
    loaded: Snapshot,
}

impl Session {
    #[tracing::instrument(skip_all)]
    pub async fn open(core: CoreConfig, config: Config) -> Result<Self, Box<dyn Error>> {
        let path = core.state_dir.as_ref().map(|dir| dir.join(STATE_FILE));
        let loaded = match &path {
            Some(path) => load_snapshot(path).await?,
            None => {
                tracing::warn!("no state directory, changes will not be saved");
                Snapshot::default()
            }
        };

        let store = Arc::new(MemoryStore::from_snapshot(loaded.clone()));
        let ctx = Context::new(core.owner.clone());
        let scheduler = Scheduler::with_memory_store(core, store.clone())?;
        Ok(Self {
            scheduler,
            ctx,
            config,
            store,
            path,
            loaded,
        })
    }

    /// Persist the store if anything changed.
    #[tracing::instrument(skip_all)]
    pub async fn close(self) -> Result<(), Box<dyn Error>> {
        let snapshot = self.store.snapshot()?;
        if snapshot == self.loaded {
            tracing::debug!("state unchanged");
            return Ok(());
        }
        match &self.path {
            Some(path) => save_snapshot(path, &snapshot).await,
            None => Ok(()),
        }
    }
}

async fn load_snapshot(path: &Path) -> Result<Snapshot, Box<dyn Error>> {
    match fs::read_to_string(path).await {
        Ok(text) => serde_json::from_str(&text).map_err(|e| {
            format!("Failed to parse state file at {}: {}", path.display(), e).into()
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no state file yet");
            Ok(Snapshot::default())
        }
        Err(e) => Err(format!("Failed to read state file at {}: {}", path.display(), e).into()),
    }
}

async fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Replace the file in one step so an interrupted write keeps the old state
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(snapshot)?).await?;
    fs::rename(&tmp, path).await?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}
