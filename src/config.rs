use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::pagination::STUDIES_LIMIT;

pub const DEFAULT_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_SESSION_KEY: &str = "queryFilterValues";

/// Host-tunable knobs for the worklist engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorklistConfig {
    /// Ceiling on addressable results; also the client-side sort guard.
    pub studies_limit: usize,
    /// Quiet interval before filter state is published to the location.
    pub debounce_ms: u64,
    pub session_key: String,
    /// Location the publisher replaces with the encoded query string.
    pub pathname: String,
    /// Appended to each mode route when building viewer links.
    pub data_path: String,
    pub group_enabled_modes_first: bool,
}

impl Default for WorklistConfig {
    fn default() -> Self {
        Self {
            studies_limit: STUDIES_LIMIT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            pathname: "/".to_string(),
            data_path: String::new(),
            group_enabled_modes_first: false,
        }
    }
}

impl WorklistConfig {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading worklist config: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
