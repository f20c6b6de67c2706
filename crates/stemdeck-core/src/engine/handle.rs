//! The playable-handle seam between the transport and an audio source
//!
//! A `ChannelHandle` is one autonomous playback source. The transport drives
//! every handle of a session together; the mix controller only touches
//! volume and mute. All methods take `&self` so a handle can be shared with
//! a render thread that advances it independently.

use super::error::PlaybackError;

/// An independently playing audio source for one channel
pub trait ChannelHandle: Send + Sync {
    /// Length in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Request a new playback position. Out-of-range values are clamped.
    fn seek(&self, seconds: f64);

    /// Current (or requested) playback position in seconds
    fn position(&self) -> f64;

    /// True once the handle can start at its position without stalling
    fn is_ready(&self) -> bool;

    /// Start playback from the current position
    fn play(&self) -> Result<(), PlaybackError>;

    /// Stop advancing, keeping the position
    fn pause(&self);

    /// Apply a gain in [0, 1]
    fn set_volume(&self, gain: f32);

    /// Silence or restore output without touching the gain
    fn set_muted(&self, muted: bool);

    /// Free playback resources. Called exactly once per handle.
    fn release(&self);
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scriptable handle for transport and mix tests

    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct MockState {
        pub duration: Option<f64>,
        pub position: f64,
        pub playing: bool,
        pub gain: f32,
        pub muted: bool,
        pub ready: bool,
        pub fail_play: bool,
        pub seeks: Vec<f64>,
        pub play_calls: u32,
        pub pause_calls: u32,
    }

    /// Handle whose behaviour is set by the test; clones share state
    #[derive(Debug, Clone)]
    pub(crate) struct MockHandle {
        pub state: Arc<Mutex<MockState>>,
        pub releases: Arc<AtomicU32>,
        pub released: Arc<AtomicBool>,
    }

    impl MockHandle {
        pub fn new(duration: f64) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState {
                    duration: Some(duration),
                    gain: 1.0,
                    ready: true,
                    ..Default::default()
                })),
                releases: Arc::new(AtomicU32::new(0)),
                released: Arc::new(AtomicBool::new(false)),
            }
        }

        pub fn failing(duration: f64) -> Self {
            let handle = Self::new(duration);
            handle.state.lock().unwrap().fail_play = true;
            handle
        }

        pub fn never_ready(duration: f64) -> Self {
            let handle = Self::new(duration);
            handle.state.lock().unwrap().ready = false;
            handle
        }

        pub fn is_playing(&self) -> bool {
            self.state.lock().unwrap().playing
        }

        pub fn gain(&self) -> f32 {
            self.state.lock().unwrap().gain
        }

        pub fn is_muted(&self) -> bool {
            self.state.lock().unwrap().muted
        }

        pub fn release_count(&self) -> u32 {
            self.releases.load(Ordering::SeqCst)
        }

        /// Move the position as if the source had drifted
        pub fn force_position(&self, seconds: f64) {
            self.state.lock().unwrap().position = seconds;
        }
    }

    impl ChannelHandle for MockHandle {
        fn duration(&self) -> Option<f64> {
            self.state.lock().unwrap().duration
        }

        fn seek(&self, seconds: f64) {
            let mut state = self.state.lock().unwrap();
            let max = state.duration.unwrap_or(f64::MAX);
            state.position = seconds.clamp(0.0, max);
            state.seeks.push(seconds);
        }

        fn position(&self) -> f64 {
            self.state.lock().unwrap().position
        }

        fn is_ready(&self) -> bool {
            self.state.lock().unwrap().ready
        }

        fn play(&self) -> Result<(), PlaybackError> {
            if self.released.load(Ordering::SeqCst) {
                return Err(PlaybackError::Released);
            }
            let mut state = self.state.lock().unwrap();
            state.play_calls += 1;
            if state.fail_play {
                return Err(PlaybackError::Backend("mock refused to play".to_string()));
            }
            state.playing = true;
            Ok(())
        }

        fn pause(&self) {
            let mut state = self.state.lock().unwrap();
            state.pause_calls += 1;
            state.playing = false;
        }

        fn set_volume(&self, gain: f32) {
            self.state.lock().unwrap().gain = gain;
        }

        fn set_muted(&self, muted: bool) {
            self.state.lock().unwrap().muted = muted;
        }

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
            self.releases.fetch_add(1, Ordering::SeqCst);
            self.state.lock().unwrap().playing = false;
        }
    }
}
