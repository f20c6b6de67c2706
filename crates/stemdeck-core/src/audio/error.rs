//! Audio output error types

use thiserror::Error;

/// Errors that can occur while starting or running an output
#[derive(Error, Debug)]
pub enum AudioError {
    /// Backend was not compiled in
    #[error("Audio backend '{0}' is not available in this build")]
    BackendUnavailable(&'static str),

    /// No audio devices available
    #[error("No audio output devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Failed to spawn the render thread
    #[error("Failed to start render thread: {0}")]
    ThreadError(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
