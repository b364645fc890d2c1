//! Centralized configuration for Voltlearn.
//!
//! All tunable parameters live here to avoid hard-coded values scattered
//! throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Voltlearn components.
///
/// Groups related settings into logical sections and supports environment
/// variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct VoltlearnConfig {
    pub playback: PlaybackConfig,
    pub device: DeviceConfig,
    pub analytics: AnalyticsConfig,
}

/// Video probing and playback configuration.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Deadline for a single media probe.
    pub probe_timeout: Duration,
    /// Interval between position-observation callbacks.
    pub position_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(15),
            position_interval: Duration::from_millis(500),
        }
    }
}

/// Device identity persistence configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Key under which the identifier is stored.
    pub storage_key: &'static str,
    /// Path of the JSON store file.
    pub store_path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            storage_key: "device_id",
            store_path: PathBuf::from("voltlearn-device.json"),
        }
    }
}

/// Analytics forwarding configuration.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Master switch; disabled means the null sink is used.
    pub enabled: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl VoltlearnConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via `VOLTLEARN_*` variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("VOLTLEARN_PROBE_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.playback.probe_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(interval) = std::env::var("VOLTLEARN_POSITION_INTERVAL_MS") {
            if let Ok(millis) = interval.parse::<u64>() {
                config.playback.position_interval = Duration::from_millis(millis);
            }
        }

        if let Ok(path) = std::env::var("VOLTLEARN_DEVICE_STORE") {
            config.device.store_path = PathBuf::from(path);
        }

        if let Ok(enabled) = std::env::var("VOLTLEARN_ANALYTICS") {
            config.analytics.enabled = enabled.parse().unwrap_or(true);
        }

        config
    }

    /// Creates a configuration optimized for testing: tight intervals, no
    /// analytics forwarding.
    pub fn for_testing() -> Self {
        Self {
            playback: PlaybackConfig {
                probe_timeout: Duration::from_secs(1),
                position_interval: Duration::from_millis(10),
            },
            analytics: AnalyticsConfig { enabled: false },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = VoltlearnConfig::default();

        assert_eq!(config.playback.probe_timeout, Duration::from_secs(15));
        assert_eq!(
            config.playback.position_interval,
            Duration::from_millis(500)
        );
        assert_eq!(config.device.storage_key, "device_id");
        assert!(config.analytics.enabled);
    }

    #[test]
    fn test_testing_preset() {
        let config = VoltlearnConfig::for_testing();

        assert!(!config.analytics.enabled);
        assert!(config.playback.position_interval < Duration::from_millis(100));
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("VOLTLEARN_PROBE_TIMEOUT", "60");
            std::env::set_var("VOLTLEARN_POSITION_INTERVAL_MS", "250");
            std::env::set_var("VOLTLEARN_ANALYTICS", "false");
        }

        let config = VoltlearnConfig::from_env();

        assert_eq!(config.playback.probe_timeout, Duration::from_secs(60));
        assert_eq!(
            config.playback.position_interval,
            Duration::from_millis(250)
        );
        assert!(!config.analytics.enabled);

        // Cleanup
        unsafe {
            std::env::remove_var("VOLTLEARN_PROBE_TIMEOUT");
            std::env::remove_var("VOLTLEARN_POSITION_INTERVAL_MS");
            std::env::remove_var("VOLTLEARN_ANALYTICS");
        }
    }
}
