//! Common types for Stemdeck
//!
//! Sample and buffer primitives shared by the decoder, the stem voices and
//! the output mixer, plus the identity of a channel (one separated stem).

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Default output sample rate (48kHz). Stems are resampled to the actual
/// device rate when they are loaded.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Number of stems produced by the separation job (Vocals, Drums, Bass, Other)
pub const DEFAULT_CHANNEL_COUNT: usize = 4;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// Stable identifier of a channel, e.g. `"vocals"`.
///
/// Also the suffix of the stem file name: `{track}_{id}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Bring a gain into [0, 1]. Non-finite input is treated as silence.
pub fn clamp_gain(gain: f32) -> f32 {
    if gain.is_finite() {
        gain.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Static description of one configured channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Stable id, used in file names
    pub id: ChannelId,
    /// Display name
    pub name: String,
    /// Gain applied when a session starts without a remembered mix
    pub default_gain: f32,
}

impl ChannelSpec {
    pub fn new(id: &str, name: &str, default_gain: f32) -> Self {
        Self {
            id: ChannelId::new(id),
            name: name.to_string(),
            default_gain: clamp_gain(default_gain),
        }
    }

    /// The four stems written by the separation job, in display order
    pub fn default_set() -> Vec<ChannelSpec> {
        vec![
            ChannelSpec::new("vocals", "Vocals", 0.8),
            ChannelSpec::new("drums", "Drums", 0.7),
            ChannelSpec::new("bass", "Bass", 0.75),
            ChannelSpec::new("other", "Other", 0.65),
        ]
    }
}

/// A single stereo sample (left and right channels)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Linear interpolation towards `other` (t in [0, 1])
    #[inline]
    pub fn lerp(&self, other: &Self, t: Sample) -> Self {
        Self {
            left: self.left + (other.left - self.left) * t,
            right: self.right + (other.right - self.right) * t,
        }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// A buffer of stereo samples
///
/// Decoded stems are stored in this form; the mixer reads them frame by frame.
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a new buffer with the specified capacity (in stereo samples)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Create a buffer from interleaved frames with any channel count.
    ///
    /// Mono is duplicated to both sides; more than two channels keep the
    /// first two.
    pub fn from_interleaved(interleaved: &[Sample], channels: usize) -> Self {
        let channels = channels.max(1);
        let samples = interleaved
            .chunks_exact(channels)
            .map(|frame| match frame {
                [mono] => StereoSample::mono(*mono),
                [left, right, ..] => StereoSample::new(*left, *right),
                [] => StereoSample::silence(),
            })
            .collect();
        Self { samples }
    }

    /// Create a buffer from an existing Vec of StereoSamples
    pub fn from_vec(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    /// Get the number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Fills any newly exposed elements with silence. Never allocates as long
    /// as `new_len` stays within capacity.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        let current_len = self.samples.len();
        if new_len > current_len {
            debug_assert!(new_len <= self.samples.capacity(), "set_len_from_capacity called with len > capacity");
            self.samples.resize(new_len, StereoSample::silence());
        } else {
            self.samples.truncate(new_len);
        }
    }

    /// Fill the buffer with silence
    pub fn fill_silence(&mut self) {
        self.samples.fill(StereoSample::silence());
    }

    /// Get a slice of the samples
    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    /// Get a mutable slice of the samples
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Push a sample to the buffer
    #[inline]
    pub fn push(&mut self, sample: StereoSample) {
        self.samples.push(sample);
    }

    /// Get an iterator over the samples
    pub fn iter(&self) -> impl Iterator<Item = &StereoSample> {
        self.samples.iter()
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}

/// Format seconds as `m:ss` for transport displays
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
