//! Tab-scoped mirror of the filter state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::model::FilterValues;

/// Key/value storage that lives as long as the hosting tab.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

/// In-process session storage, used by the binary host and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        self.items.lock().insert(key.to_string(), value);
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }
}

/// Write-through mirror of [`FilterValues`] under one fixed key.
pub struct SessionMirror {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl SessionMirror {
    pub fn new(storage: Arc<dyn SessionStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialization failures are logged; the mirror is best-effort.
    pub fn write(&self, values: &FilterValues) {
        match serde_json::to_string(values) {
            Ok(payload) => self.storage.set_item(&self.key, payload),
            Err(err) => log::warn!("Unable to mirror filter values to session: {err}"),
        }
    }

    /// Returns the mirrored state, or `None` when absent or unreadable.
    pub fn read(&self) -> Option<FilterValues> {
        let payload = self.storage.get_item(&self.key)?;
        match Self::decode(&payload) {
            Ok(values) => Some(values),
            Err(err) => {
                log::warn!("Discarding unreadable session filter values: {err}");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.storage.remove_item(&self.key);
    }

    /// Picks the initial filter state at mount.
    ///
    /// The URL wins unless it decoded to nothing but defaults, in which case
    /// a mirrored state from earlier in this tab is restored. The chosen
    /// state is written back so the mirror is populated from the start.
    pub fn hydrate(&self, from_url: FilterValues, defaults: &FilterValues) -> FilterValues {
        let hydrated = if &from_url == defaults {
            self.read().unwrap_or(from_url)
        } else {
            from_url
        };
        self.write(&hydrated);
        hydrated
    }

    fn decode(payload: &str) -> Result<FilterValues> {
        Ok(serde_json::from_str(payload)?)
    }
}
