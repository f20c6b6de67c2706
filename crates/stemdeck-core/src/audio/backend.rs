//! Output backend selection
//!
//! Both backends share the same lock-free layout: the control side hands
//! voices over through a [`VoiceSender`], the output thread owns the
//! [`StemMixer`](super::mixer::StemMixer) exclusively, and playback state is
//! read back through the voices' atomics.

use super::config::{AudioConfig, OutputBackend};
use super::error::AudioResult;
use super::mixer::VoiceSender;
use super::null_backend::NullAudioHandle;

/// Result of starting an output
pub struct AudioSystemResult {
    /// Keeps the output alive (drop to stop)
    pub handle: AudioHandle,
    /// Hands stem voices to the output thread
    pub voice_sender: VoiceSender,
    /// Negotiated sample rate; stems must be decoded to it
    pub sample_rate: u32,
    /// Render block in frames
    pub buffer_size: u32,
    /// One-way output latency in milliseconds
    pub latency_ms: f32,
}

/// Handle to the running output. Drop this to stop audio.
pub enum AudioHandle {
    Null(NullAudioHandle),
    #[cfg(feature = "cpal-output")]
    Cpal(super::cpal_backend::CpalAudioHandle),
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioHandle::Null(h) => h.sample_rate(),
            #[cfg(feature = "cpal-output")]
            AudioHandle::Cpal(h) => h.sample_rate(),
        }
    }

    pub fn buffer_size(&self) -> u32 {
        match self {
            AudioHandle::Null(h) => h.buffer_size(),
            #[cfg(feature = "cpal-output")]
            AudioHandle::Cpal(h) => h.buffer_size(),
        }
    }

    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size() as f32 / self.sample_rate().max(1) as f32) * 1000.0
    }

    /// Backend name for logs
    pub fn name(&self) -> &'static str {
        match self {
            AudioHandle::Null(_) => "null",
            #[cfg(feature = "cpal-output")]
            AudioHandle::Cpal(_) => "cpal",
        }
    }
}

/// Start the output selected in `config`
pub fn start_audio_system(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    match config.backend {
        OutputBackend::Null => super::null_backend::start_audio_system(config),
        OutputBackend::Cpal => start_cpal(config),
    }
}

#[cfg(feature = "cpal-output")]
fn start_cpal(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    super::cpal_backend::start_audio_system(config)
}

#[cfg(not(feature = "cpal-output"))]
fn start_cpal(_config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    Err(super::error::AudioError::BackendUnavailable("cpal"))
}
