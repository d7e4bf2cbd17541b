use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::recorder::DEFAULT_DEBOUNCE;

/// Engine tunables, loadable from TOML
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo entries kept
    pub history_limit: usize,
    /// Quiet period before a burst of edits is committed
    pub debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), String> {
        if self.history_limit == 0 {
            return Err("history_limit must be at least 1".to_string());
        }
        if self.debounce_ms == 0 {
            return Err("debounce_ms must be at least 1".to_string());
        }
        Ok(())
    }
}
