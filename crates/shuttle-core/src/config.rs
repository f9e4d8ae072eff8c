//! Queue configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Construction parameters for a `Queue`.
///
/// ```json
/// { "retry_delay_ms": 500, "id": "reconciler" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Delay before a failed task is pushed again, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Diagnostic label. A random one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            id: None,
        }
    }
}

impl QueueConfig {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            retry_delay_ms: u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Rejects an explicitly empty id; `None` is fine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.id {
            Some(id) if id.trim().is_empty() => Err(ConfigError::EmptyId),
            _ => Ok(()),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
