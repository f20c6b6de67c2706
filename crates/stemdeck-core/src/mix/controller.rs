//! Volume/mute controller over a session's channels

use thiserror::Error;

use super::state::MixState;
use crate::engine::{ChannelHandle, Session};
use crate::types::ChannelId;

/// Mix errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),
}

/// Per-channel gain and mute, plus the lock group.
///
/// Borrowed from the transport for the duration of one change; it never
/// touches play state or position.
pub struct MixController<'a, H: ChannelHandle> {
    session: &'a mut Session<H>,
}

impl<'a, H: ChannelHandle> MixController<'a, H> {
    pub(crate) fn new(session: &'a mut Session<H>) -> Self {
        Self { session }
    }

    pub fn is_locked(&self) -> bool {
        self.session.is_locked()
    }

    pub fn set_locked(&mut self, locked: bool) {
        log::debug!("Lock group {}", if locked { "on" } else { "off" });
        self.session.set_locked(locked);
    }

    pub fn gain(&self, id: &ChannelId) -> Result<f32, MixError> {
        self.session
            .channel(id)
            .map(|c| c.gain())
            .ok_or_else(|| MixError::UnknownChannel(id.clone()))
    }

    /// Gain a master fader shows: the first channel in display order
    pub fn master_gain(&self) -> Option<f32> {
        self.session.channels().first().map(|c| c.gain())
    }

    pub fn is_muted(&self, id: &ChannelId) -> Result<bool, MixError> {
        self.session
            .channel(id)
            .map(|c| c.is_muted())
            .ok_or_else(|| MixError::UnknownChannel(id.clone()))
    }

    /// Set one channel's gain (clamped to [0, 1]) and apply it now
    pub fn set_channel_gain(&mut self, id: &ChannelId, gain: f32) -> Result<(), MixError> {
        let channel = self
            .session
            .channel_mut(id)
            .ok_or_else(|| MixError::UnknownChannel(id.clone()))?;
        channel.set_gain(gain);
        Ok(())
    }

    /// Snap every channel to the same gain. Overwrites, never scales.
    pub fn set_master_gain(&mut self, gain: f32) {
        for channel in self.session.channels_mut() {
            channel.set_gain(gain);
        }
    }

    /// Gain change from a channel fader: fans out to every channel while
    /// the lock group is on
    pub fn set_gain_direct(&mut self, id: &ChannelId, gain: f32) -> Result<(), MixError> {
        if self.session.is_locked() {
            if self.session.channel(id).is_none() {
                return Err(MixError::UnknownChannel(id.clone()));
            }
            self.set_master_gain(gain);
            Ok(())
        } else {
            self.set_channel_gain(id, gain)
        }
    }

    /// Silence or restore a channel. The stored gain is untouched.
    pub fn set_channel_muted(&mut self, id: &ChannelId, muted: bool) -> Result<(), MixError> {
        let channel = self
            .session
            .channel_mut(id)
            .ok_or_else(|| MixError::UnknownChannel(id.clone()))?;
        channel.set_muted(muted);
        Ok(())
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self, id: &ChannelId) -> Result<bool, MixError> {
        let muted = !self.is_muted(id)?;
        self.set_channel_muted(id, muted)?;
        Ok(muted)
    }

    pub fn snapshot(&self) -> MixState {
        self.session.mix_snapshot()
    }

    pub fn apply(&mut self, state: &MixState) {
        self.session.apply_mix(state);
    }
}
