use std::time::Duration;

use crate::types::{Result, ViewerError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest quiescence window accepted for resize coalescing
pub const MAX_RESIZE_DEBOUNCE_MS: u64 = 5_000;

/// Viewer configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerOptions {
    /// Coalesce size reports arriving within this window; 0 renders on every change
    pub resize_debounce_ms: u64,

    /// Number of log entries kept by front-ends
    pub log_capacity: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 0,
            log_capacity: 200,
        }
    }
}

impl ViewerOptions {
    pub fn resize_debounce(&self) -> Option<Duration> {
        (self.resize_debounce_ms > 0).then(|| Duration::from_millis(self.resize_debounce_ms))
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ViewerError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ViewerError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            return Err(ViewerError::Config(
                "log_capacity must be at least 1".to_string(),
            ));
        }

        if self.resize_debounce_ms > MAX_RESIZE_DEBOUNCE_MS {
            return Err(ViewerError::Config(format!(
                "resize_debounce_ms must not exceed {} (got {})",
                MAX_RESIZE_DEBOUNCE_MS, self.resize_debounce_ms
            )));
        }

        Ok(())
    }
}
