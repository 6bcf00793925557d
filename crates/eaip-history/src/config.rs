use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, HistoryResult};

/// Tuning for the history engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Attempts per operation when the head moves underneath it.
    pub max_attempts: u32,
    /// Keep computed snapshot-to-snapshot change sets.
    pub cache_diffs: bool,
    /// Page size for history listings when the caller gives none.
    pub history_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cache_diffs: true,
            history_limit: 50,
        }
    }
}

impl HistoryConfig {
    pub fn from_toml_str(source: &str) -> HistoryResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| HistoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> HistoryResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| HistoryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> HistoryResult<()> {
        if self.max_attempts == 0 {
            return Err(HistoryError::Config("max_attempts must be at least 1".into()));
        }
        if self.history_limit == 0 {
            return Err(HistoryError::Config("history_limit must be at least 1".into()));
        }
        Ok(())
    }
}
