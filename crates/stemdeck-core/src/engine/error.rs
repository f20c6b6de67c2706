//! Engine error types
//!
//! Loading failures are split in two levels: a `ChannelLoadError` is recorded
//! on the channel it belongs to and never aborts a session load, while a
//! `LoadError` means the session as a whole could not be produced.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::clock::TransportStatus;
use crate::types::ChannelId;

/// Failure to load a single channel's stem file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelLoadError {
    /// Expected stem file is not present
    #[error("Stem file not found: {}", path.display())]
    Missing { path: PathBuf },

    /// File exists but could not be read
    #[error("Cannot read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// File was read but is not decodable audio
    #[error("Cannot decode {}: {reason}", path.display())]
    Undecodable { path: PathBuf, reason: String },

    /// File decoded to zero frames
    #[error("Stem file is empty: {}", path.display())]
    Empty { path: PathBuf },
}

/// Failure to produce a session at all
#[derive(Error, Debug)]
pub enum LoadError {
    /// Separation output directory does not exist
    #[error("Output directory not found: {}", .0.display())]
    OutputDirMissing(PathBuf),

    /// Output directory has no usable folder name to derive the track from
    #[error("Cannot derive a track name from {}", .0.display())]
    InvalidOutputPath(PathBuf),

    /// Not a single channel could be loaded
    #[error("No stem of '{base_name}' could be loaded")]
    NoChannels { base_name: String },

    /// A loader task panicked or was cancelled
    #[error("Loader task failed: {0}")]
    Task(String),
}

/// A channel handle refused to start
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Handle was released by an unload
    #[error("Channel handle has been released")]
    Released,

    /// Handle has nothing to play
    #[error("Channel has no audio")]
    EmptyBuffer,

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

/// One or more channels failed to begin playback.
///
/// Channels that did start were paused again before this error was
/// returned, so no channel is left playing on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStartError {
    /// Channels that refused to play, with the reason
    pub failures: Vec<(ChannelId, PlaybackError)>,
    /// True when no channel started at all
    pub all_failed: bool,
}

impl fmt::Display for PlaybackStartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_failed {
            write!(f, "No channel could start playback")?;
        } else {
            write!(f, "{} channel(s) failed to start playback", self.failures.len())?;
        }
        for (id, err) in &self.failures {
            write!(f, "; {}: {}", id, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlaybackStartError {}

/// Errors surfaced by transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    /// Session is not fully loaded or the transport is in the wrong state
    #[error("Session not ready ({status}, {loaded}/{total} channels loaded)")]
    NotReady {
        status: TransportStatus,
        loaded: usize,
        total: usize,
    },

    /// Playback could not start on every channel
    #[error(transparent)]
    PlaybackStart(#[from] PlaybackStartError),

    /// Loading a new session failed
    #[error(transparent)]
    Load(#[from] LoadError),
}
