//! Drag adapter for continuous gain controls
//!
//! A dragged slider produces values far faster than gains need to change.
//! [`DragControl`] shows every value immediately but forwards at most one
//! per display frame, and only once it moved at least `threshold` from the
//! last forwarded value. Releasing the drag always forwards the final value
//! and drops anything still pending, so the committed gain equals what the
//! slider shows.
//!
//! The control is pure state: the caller drives `on_frame` from its frame
//! timer. [`GainFader`] binds a control to a channel or to the master path.

use serde::{Deserialize, Serialize};

use super::controller::{MixController, MixError};
use crate::engine::ChannelHandle;
use crate::types::{clamp_gain, ChannelId};

/// Fader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaderConfig {
    /// Minimum change, in gain units, before a drag value is forwarded
    pub threshold: f32,
}

impl Default for FaderConfig {
    fn default() -> Self {
        Self { threshold: 0.01 }
    }
}

/// Throttled value forwarding for one continuous control
#[derive(Debug, Clone, PartialEq)]
pub struct DragControl {
    threshold: f32,
    displayed: f32,
    last_forwarded: f32,
    pending: Option<f32>,
    dragging: bool,
}

impl DragControl {
    pub fn new(initial: f32, threshold: f32) -> Self {
        let initial = clamp_gain(initial);
        Self {
            threshold: threshold.max(0.0),
            displayed: initial,
            last_forwarded: initial,
            pending: None,
            dragging: false,
        }
    }

    /// Value the control shows
    pub fn displayed(&self) -> f32 {
        self.displayed
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start_drag(&mut self) {
        self.dragging = true;
        self.last_forwarded = self.displayed;
        self.pending = None;
    }

    /// New value from the input.
    ///
    /// While dragging this only updates the display and, past the
    /// threshold, replaces the pending value; `None` is returned. Outside a
    /// drag (a click or keyboard step) the value is returned for immediate
    /// forwarding.
    pub fn input(&mut self, value: f32) -> Option<f32> {
        let value = clamp_gain(value);
        self.displayed = value;

        if !self.dragging {
            self.pending = None;
            self.last_forwarded = value;
            return Some(value);
        }

        if (value - self.last_forwarded).abs() >= self.threshold {
            self.pending = Some(value);
        }
        None
    }

    /// Frame tick: the value to forward now, if any
    pub fn on_frame(&mut self) -> Option<f32> {
        let value = self.pending.take()?;
        self.last_forwarded = value;
        Some(value)
    }

    /// Release: cancels the pending value and returns the final one, which
    /// must be forwarded regardless of the threshold
    pub fn end_drag(&mut self, final_value: f32) -> f32 {
        let value = clamp_gain(final_value);
        self.dragging = false;
        self.pending = None;
        self.displayed = value;
        self.last_forwarded = value;
        value
    }

    /// External change (another fader under lock, a restored mix).
    /// Ignored mid-drag so it cannot fight the user's own input.
    pub fn sync(&mut self, value: f32) -> bool {
        if self.dragging {
            return false;
        }
        let value = clamp_gain(value);
        self.displayed = value;
        self.last_forwarded = value;
        true
    }
}

/// What a fader controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaderTarget {
    /// One channel, through the direct path (fans out under lock)
    Channel(ChannelId),
    /// All channels at once
    Master,
}

/// A drag control bound to a gain target
#[derive(Debug, Clone)]
pub struct GainFader {
    target: FaderTarget,
    control: DragControl,
}

impl GainFader {
    pub fn new(target: FaderTarget, initial: f32, config: &FaderConfig) -> Self {
        Self {
            target,
            control: DragControl::new(initial, config.threshold),
        }
    }

    pub fn target(&self) -> &FaderTarget {
        &self.target
    }

    pub fn control(&self) -> &DragControl {
        &self.control
    }

    pub fn displayed(&self) -> f32 {
        self.control.displayed()
    }

    fn forward<H: ChannelHandle>(&self, mix: &mut MixController<'_, H>, value: f32) -> Result<(), MixError> {
        match &self.target {
            FaderTarget::Channel(id) => mix.set_gain_direct(id, value),
            FaderTarget::Master => {
                mix.set_master_gain(value);
                Ok(())
            }
        }
    }

    pub fn start_drag(&mut self) {
        self.control.start_drag();
    }

    /// Feed an input value; forwards at once only outside a drag
    pub fn input<H: ChannelHandle>(&mut self, mix: &mut MixController<'_, H>, value: f32) -> Result<(), MixError> {
        if let Some(value) = self.control.input(value) {
            self.forward(mix, value)?;
        }
        Ok(())
    }

    /// Apply the coalesced value for this frame, returning it
    pub fn on_frame<H: ChannelHandle>(&mut self, mix: &mut MixController<'_, H>) -> Result<Option<f32>, MixError> {
        match self.control.on_frame() {
            Some(value) => {
                self.forward(mix, value)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Commit the final value synchronously
    pub fn end_drag<H: ChannelHandle>(&mut self, mix: &mut MixController<'_, H>, final_value: f32) -> Result<f32, MixError> {
        let value = self.control.end_drag(final_value);
        self.forward(mix, value)?;
        Ok(value)
    }

    /// Refresh the display from the mix when not dragging
    pub fn sync_from<H: ChannelHandle>(&mut self, mix: &MixController<'_, H>) -> bool {
        let value = match &self.target {
            FaderTarget::Channel(id) => match mix.gain(id) {
                Ok(gain) => gain,
                Err(_) => return false,
            },
            // Under lock all channels are equal
            FaderTarget::Master => match mix.master_gain() {
                Some(gain) => gain,
                None => return false,
            },
        };
        self.control.sync(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockHandle;
    use crate::engine::Session;
    use crate::types::ChannelSpec;

    #[test]
    fn test_small_moves_are_not_forwarded() {
        let mut drag = DragControl::new(0.5, 0.01);
        drag.start_drag();
        assert_eq!(drag.input(0.505), None);
        assert_eq!(drag.displayed(), 0.505);
        assert_eq!(drag.on_frame(), None);
    }

    #[test]
    fn test_burst_coalesces_to_one_apply_per_frame() {
        let mut drag = DragControl::new(0.5, 0.01);
        drag.start_drag();
        for v in [0.52, 0.55, 0.58, 0.61] {
            drag.input(v);
        }
        assert_eq!(drag.on_frame(), Some(0.61));
        assert_eq!(drag.on_frame(), None);
    }

    #[test]
    fn test_end_drag_commits_exact_final_value() {
        let mut drag = DragControl::new(0.8, 0.01);
        drag.start_drag();
        drag.input(0.3);
        drag.input(0.301);
        drag.input(0.3012);
        assert!(drag.has_pending());

        let committed = drag.end_drag(0.3017);
        assert_eq!(committed, 0.3017);
        assert_eq!(drag.displayed(), 0.3017);
        // Pending value was cancelled, nothing stale left for the next frame
        assert_eq!(drag.on_frame(), None);
    }

    #[test]
    fn test_sync_ignored_while_dragging() {
        let mut drag = DragControl::new(0.5, 0.01);
        drag.start_drag();
        drag.input(0.7);
        assert!(!drag.sync(0.2));
        assert_eq!(drag.displayed(), 0.7);

        drag.end_drag(0.7);
        assert!(drag.sync(0.2));
        assert_eq!(drag.displayed(), 0.2);
    }

    #[test]
    fn test_input_outside_drag_forwards_immediately() {
        let mut drag = DragControl::new(0.5, 0.01);
        assert_eq!(drag.input(0.501), Some(0.501));
        assert_eq!(drag.input(1.4), Some(1.0));
    }

    #[test]
    fn test_fader_commits_to_channel() {
        let specs = ChannelSpec::default_set();
        let mut session = Session::new(&specs, "/tmp/out/song", "song");
        let vocals = MockHandle::new(30.0);
        session.attach(&specs[0].id, vocals.clone()).unwrap();
        let mut mix = crate::mix::MixController::new(&mut session);

        let mut fader = GainFader::new(FaderTarget::Channel(specs[0].id.clone()), 0.8, &FaderConfig::default());
        fader.start_drag();
        for v in [0.7, 0.6, 0.5, 0.42, 0.41] {
            fader.input(&mut mix, v).unwrap();
        }
        assert_eq!(vocals.gain(), 0.8);
        assert_eq!(fader.on_frame(&mut mix).unwrap(), Some(0.41));
        assert_eq!(vocals.gain(), 0.41);

        fader.input(&mut mix, 0.333).unwrap();
        assert_eq!(fader.end_drag(&mut mix, 0.333).unwrap(), 0.333);
        assert_eq!(vocals.gain(), 0.333);
        assert_eq!(fader.on_frame(&mut mix).unwrap(), None);
    }

    #[test]
    fn test_master_fader_and_sync() {
        let specs = ChannelSpec::default_set();
        let mut session: Session<MockHandle> = Session::new(&specs, "/tmp/out/song", "song");
        let mut mix = crate::mix::MixController::new(&mut session);

        let mut master = GainFader::new(FaderTarget::Master, 1.0, &FaderConfig::default());
        master.start_drag();
        master.input(&mut mix, 0.25).unwrap();
        master.end_drag(&mut mix, 0.25).unwrap();
        for spec in &specs {
            assert_eq!(mix.gain(&spec.id).unwrap(), 0.25);
        }

        let mut bass = GainFader::new(FaderTarget::Channel(specs[2].id.clone()), 0.75, &FaderConfig::default());
        assert!(bass.sync_from(&mix));
        assert_eq!(bass.displayed(), 0.25);
    }

    #[test]
    fn test_master_sync_reads_first_channel_in_display_order() {
        let specs = ChannelSpec::default_set();
        let mut session: Session<MockHandle> = Session::new(&specs, "/tmp/out/song", "song");
        let mut mix = crate::mix::MixController::new(&mut session);
        mix.set_channel_gain(&"vocals".into(), 0.9).unwrap();
        mix.set_channel_gain(&"bass".into(), 0.2).unwrap();

        let mut master = GainFader::new(FaderTarget::Master, 0.0, &FaderConfig::default());
        assert!(master.sync_from(&mix));
        assert_eq!(master.displayed(), 0.9);
    }

    #[test]
    fn test_non_finite_input_is_silence() {
        let mut drag = DragControl::new(f32::NAN, 0.01);
        assert_eq!(drag.displayed(), 0.0);
        assert_eq!(drag.input(f32::NAN), Some(0.0));
        drag.start_drag();
        drag.input(0.5);
        assert_eq!(drag.end_drag(f32::INFINITY), 0.0);
        assert!(drag.sync(f32::NAN));
        assert_eq!(drag.displayed(), 0.0);
    }
}
