//! Session - the fixed set of channels for one logical track

use std::path::{Path, PathBuf};

use super::channel::Channel;
use super::error::ChannelLoadError;
use super::handle::ChannelHandle;
use crate::mix::{ChannelMix, MixState};
use crate::types::{ChannelId, ChannelSpec};

/// The channels of one track plus their aggregate state.
///
/// A session owns its handles. `unload` releases every handle exactly once;
/// dropping a session that was not unloaded does the same.
#[derive(Debug)]
pub struct Session<H: ChannelHandle> {
    base_name: String,
    output_dir: PathBuf,
    channels: Vec<Channel<H>>,
    /// Longest known channel duration, only ever grows while loaded
    duration: f64,
    locked: bool,
}

impl<H: ChannelHandle> Session<H> {
    /// Session with one empty channel per spec
    pub fn new(specs: &[ChannelSpec], output_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            output_dir: output_dir.into(),
            channels: specs.iter().map(Channel::new).collect(),
            duration: 0.0,
            locked: false,
        }
    }

    /// Placeholder before any track is chosen
    pub fn empty(specs: &[ChannelSpec]) -> Self {
        Self::new(specs, PathBuf::new(), String::new())
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn channels(&self) -> &[Channel<H>] {
        &self.channels
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel<H>> {
        self.channels.iter().find(|c| c.id() == id)
    }

    pub(crate) fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel<H>> {
        self.channels.iter_mut().find(|c| c.id() == id)
    }

    pub(crate) fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel<H>> {
        self.channels.iter_mut()
    }

    /// Handles of all loaded channels, in channel order
    pub fn handles(&self) -> impl Iterator<Item = (&ChannelId, &H)> {
        self.channels
            .iter()
            .filter_map(|c| c.handle().map(|h| (c.id(), h)))
    }

    /// Aggregate duration: the longest channel. Zero until one reports.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// True iff every channel has a handle
    pub fn all_loaded(&self) -> bool {
        !self.channels.is_empty() && self.channels.iter().all(|c| c.is_loaded())
    }

    pub fn loaded_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_loaded()).count()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Install a loaded handle on the channel with `id`
    ///
    /// Returns the handle back if no such channel exists.
    pub fn attach(&mut self, id: &ChannelId, handle: H) -> Result<(), H> {
        let Some(channel) = self.channel_mut(id) else {
            return Err(handle);
        };
        channel.attach(handle);
        let reported = channel.duration();
        if let Some(duration) = reported {
            if duration > self.duration {
                self.duration = duration;
            }
        }
        Ok(())
    }

    /// Record why a channel could not be loaded
    pub fn record_error(&mut self, id: &ChannelId, error: ChannelLoadError) {
        if let Some(channel) = self.channel_mut(id) {
            channel.record_error(error);
        }
    }

    /// Per-channel load errors, for reporting
    pub fn load_errors(&self) -> impl Iterator<Item = (&ChannelId, &ChannelLoadError)> {
        self.channels
            .iter()
            .filter_map(|c| c.load_error().map(|e| (c.id(), e)))
    }

    /// Stop and release every handle and return to the empty state.
    ///
    /// Gains, mutes and the lock flag are kept; they belong to the user's
    /// mix, not to the loaded files.
    pub fn unload(&mut self) {
        let mut released = 0;
        for channel in &mut self.channels {
            if let Some(handle) = channel.take_handle() {
                handle.pause();
                handle.release();
                released += 1;
            }
        }
        self.duration = 0.0;
        if released > 0 {
            log::info!("Unloaded session '{}' ({} channels released)", self.base_name, released);
        }
        self.base_name.clear();
        self.output_dir = PathBuf::new();
    }

    /// Current mix, for persisting across sessions
    pub fn mix_snapshot(&self) -> MixState {
        MixState {
            locked: self.locked,
            channels: self
                .channels
                .iter()
                .map(|c| {
                    (
                        c.id().clone(),
                        ChannelMix {
                            gain: c.gain(),
                            muted: c.is_muted(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Restore a remembered mix. Channels missing from `state` keep their
    /// current values.
    pub fn apply_mix(&mut self, state: &MixState) {
        self.locked = state.locked;
        for channel in &mut self.channels {
            if let Some(mix) = state.channels.get(channel.id()) {
                channel.set_gain(mix.gain);
                channel.set_muted(mix.muted);
            }
        }
    }
}

impl<H: ChannelHandle> Drop for Session<H> {
    fn drop(&mut self) {
        self.unload();
    }
}
