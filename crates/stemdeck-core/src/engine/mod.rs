//! Playback engine - channels, session, clock and transport
//!
//! - [`ChannelHandle`]: seam to one autonomous audio source
//! - [`StemVoice`]: the in-memory handle rendered by an output backend
//! - [`Session`]: the channels of one track, aggregate duration and readiness
//! - [`PlaybackClock`]: the logical playhead
//! - [`Transport`]: play/pause/seek over every channel at once

mod channel;
mod clock;
mod error;
pub mod gc;
mod handle;
mod session;
mod transport;
mod voice;

pub use channel::Channel;
pub use clock::{ClockReader, PlaybackClock, TransportStatus};
pub use error::{ChannelLoadError, LoadError, PlaybackError, PlaybackStartError, TransportError};
pub use handle::ChannelHandle;
pub use session::Session;
pub use transport::{Transport, TransportConfig};
pub use voice::StemVoice;

#[cfg(test)]
pub(crate) use handle::mock;
