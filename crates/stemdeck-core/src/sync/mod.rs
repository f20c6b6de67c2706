//! Visual sync bridge
//!
//! Aligns an external cursor (the waveform playhead) with the playback
//! clock without ever driving playback.

mod tracker;
mod visual;

pub use tracker::{CursorTracker, VisualConfig};
pub use visual::{CursorSink, VisualSync, VisualSyncHandle};
