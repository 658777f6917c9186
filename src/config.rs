use crate::analytics::Timeframe;
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration settings for the analytics engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Maximum age of a cached snapshot in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Timeframe used when a caller does not name one
    #[serde(default)]
    pub default_timeframe: Timeframe,

    /// Number of recommendations carried into a performance report
    #[serde(default = "default_report_recommendation_limit")]
    pub report_recommendation_limit: usize,

    /// Interval between scheduled refreshes in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            default_timeframe: Timeframe::default(),
            report_recommendation_limit: default_report_recommendation_limit(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from file, with fallback to defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            // Create default config file
            let config = Self::default();
            config.save_to_file(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig = toml::from_str(&content).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            AnalyticsError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_ms == 0 {
            return Err(AnalyticsError::configuration(
                "cache_ttl_ms must be greater than zero",
            ));
        }
        if i64::try_from(self.cache_ttl_ms).is_err() {
            return Err(AnalyticsError::configuration(format!(
                "cache_ttl_ms must be at most {}",
                i64::MAX
            )));
        }
        if self.refresh_interval_secs == 0 {
            return Err(AnalyticsError::configuration(
                "refresh_interval_secs must be greater than zero",
            ));
        }
        if self.report_recommendation_limit == 0 {
            return Err(AnalyticsError::configuration(
                "report_recommendation_limit must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        // Saturate rather than wrap for configs that skipped `validate`
        chrono::Duration::milliseconds(i64::try_from(self.cache_ttl_ms).unwrap_or(i64::MAX))
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }
}

// Helper functions for default values
fn default_cache_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_report_recommendation_limit() -> usize {
    5
}

fn default_refresh_interval_secs() -> u64 {
    30
}
