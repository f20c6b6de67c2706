//! Volume and mute control
//!
//! [`MixController`] changes gain and mute on the loaded channels, with an
//! optional lock group that snaps every channel to one gain. [`GainFader`]
//! and [`DragControl`] adapt a high-rate slider drag to it.

mod controller;
mod fader;
mod state;

pub use controller::{MixController, MixError};
pub use fader::{DragControl, FaderConfig, FaderTarget, GainFader};
pub use state::{ChannelMix, MixState};
