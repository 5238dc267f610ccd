//! Recording channel trait
//!
//! Defines the interface shared by the capture channels (display sampler, keyboard listener).

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Trait for recording channels
///
/// Each channel represents one concurrent activity of a run.
/// Channels are driven by the `TeleopSession`.
#[async_trait]
pub trait RecordingChannel: Send {
    /// Get the channel identifier (e.g., "display", "keyboard")
    fn id(&self) -> &str;

    /// Get the channel type
    fn channel_type(&self) -> ChannelType;

    /// Initialize the channel with the run directory
    async fn initialize(&mut self, run_dir: &Path) -> RecordingResult<()>;

    /// Start recording
    async fn start(&mut self) -> RecordingResult<()>;

    /// Stop recording
    async fn stop(&mut self) -> RecordingResult<()>;

    /// Check if the channel is currently recording
    fn is_recording(&self) -> bool;

    /// Get output files created by this channel
    fn output_files(&self) -> Vec<String>;
}

/// Types of recording channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// Screen region sampling
    Display,
    /// Held-key tracking
    Input,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Display => write!(f, "display"),
            ChannelType::Input => write!(f, "input"),
        }
    }
}
