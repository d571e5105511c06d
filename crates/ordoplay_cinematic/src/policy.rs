// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay policy backed by save-game flags.
//!
//! Seen cinematics are recorded as `CINEMATIC_SEEN:<id>` strings inside the
//! game's wider flag collection, which other systems also write to. The
//! collection is flushed through a [`SaveTrigger`] after each new flag.

use crate::error::Result;
use crate::services::PlaybackPolicyStore;
use indexmap::IndexSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of seen-cinematic flags
pub const SEEN_FLAG_PREFIX: &str = "CINEMATIC_SEEN:";

/// Save-game flag collection shared with the rest of the game
pub type FlagCollection = Arc<RwLock<IndexSet<String>>>;

/// Build the flag string for a cinematic id
pub fn seen_flag(id: &str) -> String {
    format!("{SEEN_FLAG_PREFIX}{id}")
}

/// Flushes the flag collection to persistent storage
pub trait SaveTrigger {
    /// Persist the current flags
    fn save(&mut self, flags: &IndexSet<String>) -> Result<()>;
}

/// Persisted save payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SavePayload {
    /// All save-game flags, in insertion order
    #[serde(default)]
    pub flags: IndexSet<String>,
}

/// JSON save file holding the flag collection
#[derive(Debug, Clone)]
pub struct JsonSaveFile {
    path: PathBuf,
}

impl JsonSaveFile {
    /// Create a save file handle
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the save file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the payload; a missing file yields an empty payload
    pub fn load(&self) -> Result<SavePayload> {
        if !self.path.exists() {
            return Ok(SavePayload::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl SaveTrigger for JsonSaveFile {
    fn save(&mut self, flags: &IndexSet<String>) -> Result<()> {
        let payload = SavePayload {
            flags: flags.clone(),
        };
        let data = serde_json::to_string_pretty(&payload)?;
        std::fs::write(&self.path, data)?;
        tracing::debug!(path = %self.path.display(), "Saved flag collection");
        Ok(())
    }
}

/// Policy store over a shared flag collection
pub struct SeenFlagStore {
    flags: FlagCollection,
    save_trigger: Option<Box<dyn SaveTrigger>>,
}

impl SeenFlagStore {
    /// Create a store with an empty, unsaved flag collection
    pub fn new() -> Self {
        Self::with_flags(FlagCollection::default())
    }

    /// Create a store over an existing flag collection
    pub fn with_flags(flags: FlagCollection) -> Self {
        Self {
            flags,
            save_trigger: None,
        }
    }

    /// Set the save trigger
    pub fn with_save_trigger(mut self, trigger: impl SaveTrigger + 'static) -> Self {
        self.save_trigger = Some(Box::new(trigger));
        self
    }

    /// Load flags from a JSON save file and save back to it
    pub fn from_save_file(file: JsonSaveFile) -> Result<Self> {
        let payload = file.load()?;
        Ok(Self::with_flags(Arc::new(RwLock::new(payload.flags))).with_save_trigger(file))
    }

    /// Shared flag collection
    pub fn flags(&self) -> FlagCollection {
        self.flags.clone()
    }

    /// Ids of all seen cinematics
    pub fn seen_ids(&self) -> Vec<String> {
        self.flags
            .read()
            .iter()
            .filter_map(|flag| flag.strip_prefix(SEEN_FLAG_PREFIX))
            .map(str::to_string)
            .collect()
    }
}

impl Default for SeenFlagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackPolicyStore for SeenFlagStore {
    fn is_seen(&self, id: &str) -> bool {
        self.flags.read().contains(&seen_flag(id))
    }

    fn mark_seen(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            tracing::warn!("Ignoring seen flag for cinematic without an id");
            return Ok(());
        }

        let inserted = self.flags.write().insert(seen_flag(id));
        if !inserted {
            return Ok(());
        }

        tracing::info!(id, "Marked cinematic as seen");
        match &mut self.save_trigger {
            Some(trigger) => trigger.save(&self.flags.read()),
            None => Ok(()),
        }
    }
}
