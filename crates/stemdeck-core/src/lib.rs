//! StemDeck Core - synchronized multi-stem playback
//!
//! Plays the stems of one separated track (vocals, drums, bass, other) as
//! if they were a single track: one transport, one clock, per-channel gain
//! and mute, and a cursor that follows the playback position.

pub mod audio;
pub mod audio_file;
pub mod config;
pub mod engine;
pub mod loader;
pub mod mix;
pub mod recent;
pub mod separation;
pub mod sync;
pub mod types;

pub use types::*;
