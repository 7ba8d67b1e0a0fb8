//! Durable snapshots of a session's value store.
//!
//! The wire form is a JSON array of `{state, action, value}` triples, one per
//! `(state, action)` pair in canonical order. Restoring is all-or-nothing: a
//! snapshot missing any pair, repeating a pair, or carrying a non-finite
//! value is rejected and the target store is left as it was.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adaptive::decision::ValueStore;
use crate::adaptive::error::{AdaptiveError, Result};
use crate::adaptive::types::{Action, EmotionState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub state: EmotionState,
    pub action: Action,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl ValueSnapshot {
    pub fn from_store(store: &ValueStore) -> Self {
        Self {
            entries: store
                .iter()
                .map(|(state, action, value)| SnapshotEntry {
                    state,
                    action,
                    value,
                })
                .collect(),
        }
    }

    pub fn from_entries(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a fresh store holding exactly the snapshot's values.
    pub fn to_store(&self) -> Result<ValueStore> {
        let mut store = ValueStore::new();
        self.restore_into(&mut store)?;
        Ok(store)
    }

    /// Replaces every value in `store`; on error `store` is untouched.
    pub fn restore_into(&self, store: &mut ValueStore) -> Result<()> {
        let mut values = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !entry.value.is_finite() {
                return Err(AdaptiveError::NonFiniteSnapshotValue {
                    state: entry.state,
                    action: entry.action,
                });
            }
            if values
                .insert((entry.state, entry.action), entry.value)
                .is_some()
            {
                return Err(AdaptiveError::DuplicateSnapshotEntry {
                    state: entry.state,
                    action: entry.action,
                });
            }
        }

        let expected = EmotionState::COUNT * Action::COUNT;
        if values.len() != expected {
            return Err(AdaptiveError::IncompleteSnapshot {
                missing: expected - values.len(),
            });
        }

        store.replace_all(values);
        Ok(())
    }
}

pub async fn save_snapshot(path: impl AsRef<Path>, snapshot: &ValueSnapshot) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = snapshot.to_json()?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    info!(path = %path.display(), entries = snapshot.len(), "value snapshot saved");
    Ok(())
}

/// Reads and validates a snapshot file.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<ValueSnapshot> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await?;
    let snapshot = ValueSnapshot::from_json(&json)?;
    snapshot.to_store()?;
    info!(path = %path.display(), entries = snapshot.len(), "value snapshot loaded");
    Ok(snapshot)
}
