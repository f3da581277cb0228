//! Autosave timing and retention settings.

use std::time::Duration;

use application::services::AutosavePolicy;
use serde::{Deserialize, Serialize};

/// Autosave configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Debounce window for scheduled saves in milliseconds (default: 2000)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Maximum number of drafts kept (default: 10)
    #[serde(default = "default_max_drafts")]
    pub max_drafts: usize,

    /// Drafts older than this many days are removed by cleanup (default: 7)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Interval of the background cleanup task in seconds (default: 1 hour)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

const fn default_delay_ms() -> u64 {
    2000
}

const fn default_max_drafts() -> usize {
    domain::DEFAULT_MAX_DRAFTS
}

const fn default_max_age_days() -> u32 {
    domain::DEFAULT_MAX_AGE_DAYS
}

const fn default_cleanup_interval() -> u64 {
    60 * 60 // 1 hour
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_drafts: default_max_drafts(),
            max_age_days: default_max_age_days(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl AutosaveConfig {
    /// Debounce window as a Duration
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Cleanup interval as a Duration
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Per-call parameters for the autosave service
    #[must_use]
    pub const fn policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            delay: self.delay(),
            max_drafts: self.max_drafts,
            max_age_days: self.max_age_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_policy() {
        assert_eq!(AutosaveConfig::default().policy(), AutosavePolicy::default());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: AutosaveConfig = serde_json::from_str(r#"{"max_drafts": 3}"#).unwrap();
        assert_eq!(config.max_drafts, 3);
        assert_eq!(config.delay_ms, 2000);
        assert_eq!(config.max_age_days, 7);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(3600));
    }
}
