//! Output start-up for the player
//!
//! Opens the configured backend and hands loaded stem voices to it. When
//! the sound card cannot be opened the player keeps running on the null
//! backend, so the transport still works (silently).

use anyhow::Result;
use stemdeck_core::audio::{self, AudioConfig, AudioSystemResult, OutputBackend, VoiceSender};
use stemdeck_core::engine::{Session, StemVoice};

/// Start the configured output, falling back to the null backend
pub fn start_output(config: &AudioConfig) -> Result<AudioSystemResult> {
    match audio::start_audio_system(config) {
        Ok(output) => {
            log::info!(
                "Audio output: {} ({} Hz, {} frames, ~{:.1} ms)",
                output.handle.name(),
                output.sample_rate,
                output.buffer_size,
                output.latency_ms
            );
            Ok(output)
        }
        Err(e) if config.backend != OutputBackend::Null => {
            log::warn!("Could not start {:?} output: {}", config.backend, e);
            eprintln!("Warning: no audio device, playing silently");
            let fallback = config.clone().with_backend(OutputBackend::Null);
            Ok(audio::start_audio_system(&fallback)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Hand every loaded voice of `session` to the output.
///
/// Returns how many were attached.
pub fn attach_voices(sender: &mut VoiceSender, session: &Session<StemVoice>) -> usize {
    let mut attached = 0;
    for (id, voice) in session.handles() {
        match sender.attach(voice.clone()) {
            Ok(()) => attached += 1,
            Err(_) => log::warn!("Output queue full, channel {} stays silent", id),
        }
    }
    attached
}

/// Print output devices for `--list-devices`
#[cfg(feature = "cpal-output")]
pub fn print_devices() -> Result<()> {
    for device in audio::get_output_devices()? {
        println!("{}", device);
    }
    Ok(())
}

#[cfg(not(feature = "cpal-output"))]
pub fn print_devices() -> Result<()> {
    println!("Built without sound card support (enable the cpal-output feature)");
    Ok(())
}
