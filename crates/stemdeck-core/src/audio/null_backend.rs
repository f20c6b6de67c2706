//! Device-less output
//!
//! Renders the mix on a dedicated thread paced to the configured block
//! period and discards it. Voices advance exactly as they would on a sound
//! card, which keeps the transport's drift checks meaningful on headless
//! machines and in CI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::backend::{AudioHandle, AudioSystemResult};
use super::config::AudioConfig;
use super::error::{AudioError, AudioResult};
use super::mixer::{mixer_channel, StemMixer};

/// Null output handle. Stops and joins the render thread on drop.
pub struct NullAudioHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    sample_rate: u32,
    buffer_size: u32,
}

impl NullAudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }
}

impl Drop for NullAudioHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Null render thread panicked");
            }
        }
    }
}

pub fn start_audio_system(config: &AudioConfig) -> AudioResult<AudioSystemResult> {
    let sample_rate = config.sample_rate.max(1);
    let buffer_size = config.clamped_buffer_frames();
    let period = Duration::from_secs_f64(buffer_size as f64 / sample_rate as f64);

    let (voice_sender, mixer) = mixer_channel();
    let running = Arc::new(AtomicBool::new(true));

    let thread = {
        let running = running.clone();
        thread::Builder::new()
            .name("stem-render".to_string())
            .spawn(move || render_loop(mixer, running, buffer_size as usize, period))
            .map_err(|e| AudioError::ThreadError(e.to_string()))?
    };

    let latency_ms = period.as_secs_f32() * 1000.0;
    log::info!(
        "Null audio output started: {}Hz, {} frames (~{:.1}ms blocks)",
        sample_rate,
        buffer_size,
        latency_ms
    );

    Ok(AudioSystemResult {
        handle: AudioHandle::Null(NullAudioHandle {
            running,
            thread: Some(thread),
            sample_rate,
            buffer_size,
        }),
        voice_sender,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

fn render_loop(mut mixer: StemMixer, running: Arc<AtomicBool>, frames: usize, period: Duration) {
    let mut deadline = Instant::now();
    while running.load(Ordering::Acquire) {
        mixer.process(frames);

        // Absolute deadlines so sleep overshoot does not accumulate
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else if now - deadline > period * 8 {
            // Fell far behind (suspended process); resume from now
            deadline = now;
        }
    }
}
