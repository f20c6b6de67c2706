//! Render-side stem mixer
//!
//! The mixer is owned exclusively by the output thread. Voices reach it
//! through a lock-free SPSC queue; after that, the control side talks to
//! them only through their atomics. Released voices are dropped here, which
//! is cheap because their buffers are `basedrop::Shared`.
//!
//! ```text
//! control thread                          output thread
//! ──────────────                          ─────────────
//! VoiceSender::attach(voice) ──rtrb──►    StemMixer::process(n)
//! transport / mix controller              ├─ drain commands
//!   └─ voice atomics (play, seek, gain) ─►├─ render_add() each voice
//!                                         └─ drop released voices
//! ```

use super::config::MAX_BUFFER_SIZE;
use crate::engine::StemVoice;
use crate::types::{StereoBuffer, StereoSample};

/// Queue depth for mixer commands
pub const COMMAND_QUEUE_SIZE: usize = 64;

/// Voices the mixer can hold without allocating on the output thread
pub const MAX_VOICES: usize = 32;

/// Commands from the control side
#[derive(Debug)]
pub enum MixerCommand {
    /// Start rendering a voice
    Attach(StemVoice),
    /// Drop every voice
    Clear,
}

/// Control-side end of the mixer queue
pub struct VoiceSender {
    producer: rtrb::Producer<MixerCommand>,
}

impl VoiceSender {
    /// Queue a command (non-blocking). Returns it back if the queue is full.
    pub fn send(&mut self, command: MixerCommand) -> Result<(), MixerCommand> {
        self.producer.push(command).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }

    /// Hand a voice to the output
    pub fn attach(&mut self, voice: StemVoice) -> Result<(), MixerCommand> {
        self.send(MixerCommand::Attach(voice))
    }

    /// Ask the output to drop every voice
    pub fn clear(&mut self) -> bool {
        self.send(MixerCommand::Clear).is_ok()
    }

    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}

/// Create a connected sender/mixer pair
pub fn mixer_channel() -> (VoiceSender, StemMixer) {
    let (producer, consumer) = rtrb::RingBuffer::new(COMMAND_QUEUE_SIZE);
    (VoiceSender { producer }, StemMixer::new(consumer))
}

/// Sums every attached voice into one stereo block
pub struct StemMixer {
    commands: rtrb::Consumer<MixerCommand>,
    voices: Vec<StemVoice>,
    output: StereoBuffer,
}

impl StemMixer {
    fn new(commands: rtrb::Consumer<MixerCommand>) -> Self {
        Self {
            commands,
            voices: Vec::with_capacity(MAX_VOICES),
            output: StereoBuffer::silence(MAX_BUFFER_SIZE),
        }
    }

    /// Number of voices currently rendered
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                MixerCommand::Attach(voice) => {
                    voice.set_attached(true);
                    self.voices.push(voice);
                }
                MixerCommand::Clear => {
                    for voice in self.voices.drain(..) {
                        voice.set_attached(false);
                    }
                }
            }
        }
    }

    /// Render `n_frames` and return them. Real-time safe: no locks, no
    /// logging, no allocation while under `MAX_VOICES`.
    pub fn process(&mut self, n_frames: usize) -> &[StereoSample] {
        let n_frames = n_frames.min(MAX_BUFFER_SIZE);
        self.output.set_len_from_capacity(n_frames);
        self.output.fill_silence();

        self.drain_commands();

        let out = self.output.as_mut_slice();
        self.voices.retain(|voice| voice.render_add(out));

        self.output.as_slice()
    }
}

impl Drop for StemMixer {
    fn drop(&mut self) {
        for voice in &self.voices {
            voice.set_attached(false);
        }
    }
}
