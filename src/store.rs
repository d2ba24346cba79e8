//! Saved per-layout Dock preferences.
//!
//! The collection is ordered (insertion order is what users see) and keyed by
//! fingerprint. Every mutation is written through immediately; a failed write
//! is logged and the in-memory copy stays authoritative until the next
//! successful one.

use serde::{Deserialize, Serialize};

use crate::display::Fingerprint;
use crate::dock::DockPosition;
use crate::persist::{ByteStore, StoreError};

/// Key the preference list is stored under.
pub const PREFERENCES_KEY: &str = "layouts";

/// Name given to preferences saved without one.
pub const DEFAULT_NAME: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPreference {
    #[serde(rename = "id")]
    pub fingerprint: Fingerprint,
    pub name: String,
    #[serde(rename = "dockPosition")]
    pub position: DockPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

pub struct PreferenceStore {
    backend: Box<dyn ByteStore>,
    entries: Vec<LayoutPreference>,
}

impl PreferenceStore {
    /// Opens the store, loading whatever the backend currently holds.
    pub fn open(backend: Box<dyn ByteStore>) -> Self {
        let entries = Self::load(backend.as_ref());
        log::info!("Loaded {} saved layout(s)", entries.len());
        Self { backend, entries }
    }

    /// Missing or unreadable data yields an empty list.
    pub fn load(backend: &dyn ByteStore) -> Vec<LayoutPreference> {
        match backend.read_bytes(PREFERENCES_KEY) {
            Ok(Some(bytes)) => decode(&bytes).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable saved layouts: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read saved layouts: {}", e);
                Vec::new()
            }
        }
    }

    pub fn entries(&self) -> &[LayoutPreference] {
        &self.entries
    }

    pub fn find(&self, fingerprint: &Fingerprint) -> Option<&LayoutPreference> {
        self.entries.iter().find(|p| &p.fingerprint == fingerprint)
    }

    /// Replaces the entry for `fingerprint` in place, or appends a new one.
    pub fn upsert(
        &mut self,
        fingerprint: Fingerprint,
        name: &str,
        position: DockPosition,
    ) -> Upserted {
        let name = if name.is_empty() { DEFAULT_NAME } else { name };
        let preference = LayoutPreference {
            fingerprint,
            name: name.to_string(),
            position,
        };

        let outcome = match self
            .entries
            .iter_mut()
            .find(|p| p.fingerprint == preference.fingerprint)
        {
            Some(existing) => {
                *existing = preference;
                Upserted::Updated
            }
            None => {
                self.entries.push(preference);
                Upserted::Inserted
            }
        };

        self.persist();
        outcome
    }

    /// Removes the entry at `index`. Out-of-range indices are ignored.
    pub fn delete(&mut self, index: usize) -> Option<LayoutPreference> {
        if index >= self.entries.len() {
            log::warn!(
                "Ignoring delete of layout #{} ({} saved)",
                index,
                self.entries.len()
            );
            return None;
        }
        let removed = self.entries.remove(index);
        self.persist();
        Some(removed)
    }

    fn persist(&self) {
        let result = encode(&self.entries)
            .and_then(|bytes| self.backend.write_bytes(PREFERENCES_KEY, &bytes));
        if let Err(e) = result {
            log::error!("Failed to save layouts: {}", e);
        }
    }
}

pub fn encode(entries: &[LayoutPreference]) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec_pretty(entries)?)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<LayoutPreference>, serde_json::Error> {
    serde_json::from_slice(bytes)
}
