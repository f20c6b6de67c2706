//! Channel - one stem slot of a session

use super::error::ChannelLoadError;
use super::handle::ChannelHandle;
use crate::types::{clamp_gain, ChannelId, ChannelSpec};

/// One stem of a session.
///
/// Starts empty (no handle) and is populated by the loader. Gain and mute
/// are stored here as well as applied to the handle, so they survive a
/// reload and unmuting restores the stored gain.
#[derive(Debug)]
pub struct Channel<H> {
    id: ChannelId,
    name: String,
    gain: f32,
    muted: bool,
    duration: Option<f64>,
    handle: Option<H>,
    load_error: Option<ChannelLoadError>,
}

impl<H: ChannelHandle> Channel<H> {
    /// Empty channel at its default gain
    pub fn new(spec: &ChannelSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            gain: clamp_gain(spec.default_gain),
            muted: false,
            duration: None,
            handle: None,
            load_error: None,
        }
    }

    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain actually heard: zero while muted
    pub fn effective_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.gain
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn load_error(&self) -> Option<&ChannelLoadError> {
        self.load_error.as_ref()
    }

    pub(crate) fn set_gain(&mut self, gain: f32) {
        self.gain = clamp_gain(gain);
        if let Some(handle) = &self.handle {
            handle.set_volume(self.gain);
        }
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(handle) = &self.handle {
            handle.set_muted(muted);
        }
    }

    /// Install a loaded handle. The stored mix is pushed to it and the
    /// duration is fixed from here until the handle is taken again.
    pub(crate) fn attach(&mut self, handle: H) {
        handle.set_volume(self.gain);
        handle.set_muted(self.muted);
        if self.duration.is_none() {
            self.duration = handle.duration();
        }
        self.load_error = None;
        self.handle = Some(handle);
    }

    pub(crate) fn record_error(&mut self, error: ChannelLoadError) {
        self.load_error = Some(error);
    }

    /// Remove the handle, returning the channel to its empty state
    pub(crate) fn take_handle(&mut self) -> Option<H> {
        self.duration = None;
        self.load_error = None;
        self.handle.take()
    }
}
