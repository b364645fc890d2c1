//! Voltlearn Core - Course catalog and video playback essentials
//!
//! This crate provides the building blocks for the Voltlearn training
//! product: the lesson catalog mapping legacy identifiers to hosted playback
//! ids, the video load state machine, device identity, analytics hooks, and
//! configuration management.

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod device;
pub mod locator;
pub mod playback;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use catalog::{Catalog, CatalogCounts};
pub use config::VoltlearnConfig;
pub use device::{DeviceIdentity, KeyValueStore, StoreError};
pub use locator::ResourceLocator;
pub use playback::{VideoLoadError, VideoLoadState, VideoLoader};

use playback::ProbeError;

/// Core errors that can bubble up from any Voltlearn subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VoltlearnError {
    #[error("Load error: {0}")]
    Load(#[from] VideoLoadError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoltlearnError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            VoltlearnError::Load(e) => match e {
                VideoLoadError::ResourceNotFound { locator } => {
                    format!("Video not found: {locator}")
                }
                VideoLoadError::NotPlayable => "This video cannot be played".to_string(),
                VideoLoadError::ZeroDuration => "This video appears to be empty".to_string(),
                VideoLoadError::Underlying(_) => "Video playback error occurred".to_string(),
            },
            VoltlearnError::Probe(_) => "Could not inspect the video".to_string(),
            VoltlearnError::Store(_) => "Storage error occurred".to_string(),
            VoltlearnError::Configuration { .. } => "Configuration error occurred".to_string(),
            VoltlearnError::Io(_) => "File system error occurred".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VoltlearnError>;
