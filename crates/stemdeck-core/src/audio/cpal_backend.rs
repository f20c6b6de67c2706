//! CPAL output backend
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Control thread  │───attach()─────────►│   Mixer Queue       │
//! │ (tokio runtime)  │                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         │                                           │ pop()
//!         │ voice atomics                             ▼
//!         │ (play/seek/gain)               ┌─────────────────────┐
//!         └───────────────────────────────►│  CPAL Audio Thread  │
//!                                          │  (owns StemMixer)   │
//!                                          └─────────────────────┘
//! ```

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::backend::{AudioHandle, AudioSystemResult};
use super::config::AudioConfig;
use super::device::{find_device_by_id, get_cpal_default_device};
use super::error::{AudioError, AudioResult};
use super::mixer::{mixer_channel, StemMixer};

/// CPAL-specific audio handle. Keeps the stream alive.
pub struct CpalAudioHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl CpalAudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }
}

/// Open the configured device and start rendering stems to it
pub fn start_audio_system(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    let device = match &config.device {
        Some(id) => find_device_by_id(id)?,
        None => get_cpal_default_device()?,
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let (supported_config, buffer_size) = get_output_config(&device, config)?;
    let sample_rate = supported_config.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate: supported_config.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    let latency_ms = (buffer_size as f32 / sample_rate as f32) * 1000.0;
    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency_ms
    );

    let (voice_sender, mixer) = mixer_channel();

    let stream = build_output_stream(&device, &stream_config, mixer)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystemResult {
        handle: AudioHandle::Cpal(CpalAudioHandle {
            _stream: stream,
            sample_rate,
            buffer_size,
        }),
        voice_sender,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// Pick a stereo f32 config at the requested rate, falling back to the
/// device's maximum rate
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<(cpal::SupportedStreamConfig, u32)> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let target_sample_rate = config.sample_rate;

    let best_config = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(|c| {
            target_sample_rate >= c.min_sample_rate().0
                && target_sample_rate <= c.max_sample_rate().0
        })
        .or_else(|| {
            supported_configs
                .iter()
                .find(|c| c.sample_format() == SampleFormat::F32 && c.channels() >= 2)
        })
        .or_else(|| {
            supported_configs
                .iter()
                .find(|c| c.sample_format() == SampleFormat::F32)
        })
        .ok_or_else(|| AudioError::ConfigError("No f32 output configuration found".to_string()))?;

    let sample_rate = if target_sample_rate >= best_config.min_sample_rate().0
        && target_sample_rate <= best_config.max_sample_rate().0
    {
        cpal::SampleRate(target_sample_rate)
    } else {
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz (stems will be resampled)",
            target_sample_rate,
            fallback.0
        );
        fallback
    };

    let buffer_size = config.clamped_buffer_frames();
    log::debug!("Selected buffer size: {} frames", buffer_size);

    Ok((best_config.clone().with_sample_rate(sample_rate), buffer_size))
}

/// Build the output stream. The callback owns the mixer outright.
fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut mixer: StemMixer,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let n_frames = data.len() / channels;
                let samples = mixer.process(n_frames);

                for (i, frame) in data.chunks_mut(channels).enumerate() {
                    match samples.get(i) {
                        Some(sample) => {
                            frame[0] = sample.left;
                            if channels > 1 {
                                frame[1] = sample.right;
                            }
                            for ch in frame.iter_mut().skip(2) {
                                *ch = 0.0;
                            }
                        }
                        None => frame.fill(0.0),
                    }
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}
