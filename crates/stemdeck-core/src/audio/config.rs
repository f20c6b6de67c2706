//! Audio output configuration

use serde::{Deserialize, Serialize};

/// Largest render block pre-allocated by the mixer (frames)
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Default render block (frames). ~10.7ms at 48kHz.
pub const DEFAULT_BUFFER_SIZE: u32 = 512;

/// Default output sample rate. Stems are resampled to the negotiated rate.
pub const DEFAULT_SAMPLE_RATE: u32 = crate::types::DEFAULT_SAMPLE_RATE;

/// Which output renders the stems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    /// No device: a paced thread renders and discards the mix. Keeps stems
    /// advancing in real time on machines without audio hardware.
    #[default]
    Null,
    /// Sound card through CPAL (requires the `cpal-output` feature)
    Cpal,
}

/// Audio device identifier
///
/// Device name plus the host it belongs to (ALSA, JACK, CoreAudio...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Label including the host, e.g. `[ALSA] hw:0,0`
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Configuration for the audio output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: OutputBackend,
    /// Output device (None = system default). CPAL only.
    pub device: Option<DeviceId>,
    /// Preferred sample rate
    pub sample_rate: u32,
    /// Preferred render block in frames
    pub buffer_frames: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: OutputBackend::default(),
            device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_frames: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl AudioConfig {
    /// Render block clamped to what the mixer pre-allocates
    pub fn clamped_buffer_frames(&self) -> u32 {
        self.buffer_frames.clamp(64, MAX_BUFFER_SIZE as u32)
    }

    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.clamped_buffer_frames() as f32 / self.sample_rate.max(1) as f32) * 1000.0
    }

    pub fn with_backend(mut self, backend: OutputBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_frames = frames;
        self
    }
}
