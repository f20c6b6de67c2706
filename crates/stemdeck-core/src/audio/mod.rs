//! Audio output for stem voices
//!
//! - **null**: paced render thread without a device (default)
//! - **cpal**: sound card output, behind the `cpal-output` feature
//!
//! The output thread owns a [`StemMixer`] exclusively. The control side
//! attaches voices through a [`VoiceSender`] and then drives them through
//! their atomics; it never locks anything the output thread touches.
//!
//! ```ignore
//! use stemdeck_core::audio::{start_audio_system, AudioConfig};
//!
//! let mut audio = start_audio_system(&AudioConfig::default())?;
//! for (_, voice) in transport.session().handles() {
//!     audio.voice_sender.attach(voice.clone())?;
//! }
//! ```

mod backend;
mod config;
mod error;
mod mixer;
mod null_backend;

#[cfg(feature = "cpal-output")]
mod cpal_backend;
#[cfg(feature = "cpal-output")]
mod device;

pub use backend::{start_audio_system, AudioHandle, AudioSystemResult};
pub use config::{
    AudioConfig, DeviceId, OutputBackend, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE,
};
pub use error::{AudioError, AudioResult};
pub use mixer::{mixer_channel, MixerCommand, StemMixer, VoiceSender, MAX_VOICES};
pub use null_backend::NullAudioHandle;

#[cfg(feature = "cpal-output")]
pub use device::{get_output_devices, OutputDevice};
