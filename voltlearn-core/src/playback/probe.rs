//! Media probing abstraction for both production and simulation modes.
//!
//! A probe answers one question about a locator: is there a playable asset
//! there, and how long is it. The production implementation shells out to the
//! `ffprobe` binary; simulation returns scripted answers for tests and demos.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::locator::ResourceLocator;

/// What a probe reports about a media asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaProperties {
    /// Whether the asset decodes as playable media.
    pub playable: bool,
    /// Reported duration. Zero when the container carries no usable timeline.
    pub duration: Duration,
}

/// Errors surfaced by probing or player construction.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe backend is not installed or not runnable.
    #[error("probe backend unavailable: {reason}")]
    BackendUnavailable {
        /// Why the backend could not be used.
        reason: String,
    },

    /// The probe ran but its output could not be interpreted.
    #[error("unreadable probe output: {0}")]
    UnreadableOutput(String),

    /// The probe did not complete within the configured timeout.
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    /// Underlying I/O failure while running the probe.
    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reports playability and duration for a media locator.
///
/// Implementations must not panic on malformed media; every failure mode is
/// an error value the loader converts into a `Failed` state.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Probes the asset behind `locator`.
    ///
    /// # Errors
    ///
    /// - `ProbeError::BackendUnavailable` - Probe tooling missing or broken
    /// - `ProbeError::UnreadableOutput` - Probe ran but output was garbage
    /// - `ProbeError::Timeout` - Probe exceeded the configured deadline
    /// - `ProbeError::Io` - Process or file I/O failed
    async fn probe(&self, locator: &ResourceLocator) -> Result<MediaProperties, ProbeError>;
}

/// Production probe backed by the `ffprobe` binary.
///
/// Runs `ffprobe -print_format json -show_format` against the locator and
/// parses the reported format section. An asset that ffprobe rejects outright
/// is reported as not playable rather than as an error, so the loader can
/// classify it.
pub struct FfprobeMediaProbe {
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl FfprobeMediaProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Checks that the ffprobe binary is present and runnable.
    pub fn is_available() -> bool {
        std::process::Command::new("ffprobe")
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn parse_output(stdout: &[u8]) -> Result<MediaProperties, ProbeError> {
        let parsed: FfprobeOutput = serde_json::from_slice(stdout)
            .map_err(|e| ProbeError::UnreadableOutput(e.to_string()))?;

        let duration = parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);

        Ok(MediaProperties {
            playable: true,
            duration,
        })
    }
}

#[async_trait]
impl MediaProbe for FfprobeMediaProbe {
    async fn probe(&self, locator: &ResourceLocator) -> Result<MediaProperties, ProbeError> {
        let target = locator.to_string();
        let command = async {
            tokio::process::Command::new("ffprobe")
                .args(["-v", "error", "-print_format", "json", "-show_format"])
                .arg(&target)
                .output()
                .await
        };

        let output = tokio::time::timeout(self.timeout, command)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::BackendUnavailable {
                        reason: "ffprobe binary not found in PATH".to_string(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            // ffprobe rejects unreadable media with a nonzero exit; that is a
            // verdict about the asset, not a probe failure.
            tracing::debug!(locator = %target, "ffprobe rejected asset");
            return Ok(MediaProperties {
                playable: false,
                duration: Duration::ZERO,
            });
        }

        Self::parse_output(&output.stdout)
    }
}
