//! Cursor update decisions with a two-tier epsilon

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Visual sync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Cursor refresh interval while playing (one display frame)
    pub tick_ms: u64,
    /// Minimum cursor movement pushed while animating
    pub playing_epsilon_ms: u64,
    /// Minimum correction pushed once playback stopped
    pub settled_epsilon_ms: u64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            playing_epsilon_ms: 30,
            settled_epsilon_ms: 100,
        }
    }
}

impl VisualConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Remembers what the cursor shows and decides when to move it.
///
/// The tight epsilon keeps the animation smooth without redrawing for
/// sub-frame changes; the loose one stops a static cursor from twitching
/// after every small pause/seek rounding difference.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    last_pushed: Option<f64>,
    playing_epsilon: f64,
    settled_epsilon: f64,
}

impl CursorTracker {
    pub fn new(config: &VisualConfig) -> Self {
        Self {
            last_pushed: None,
            playing_epsilon: config.playing_epsilon_ms as f64 / 1000.0,
            settled_epsilon: config.settled_epsilon_ms as f64 / 1000.0,
        }
    }

    /// Value last sent to the cursor
    pub fn last_pushed(&self) -> Option<f64> {
        self.last_pushed
    }

    fn push_if_beyond(&mut self, position: f64, epsilon: f64) -> Option<f64> {
        let moved = match self.last_pushed {
            Some(last) => (position - last).abs() > epsilon,
            None => true,
        };
        if moved {
            self.last_pushed = Some(position);
            Some(position)
        } else {
            None
        }
    }

    /// Animation tick while playing
    pub fn on_tick(&mut self, position: f64) -> Option<f64> {
        self.push_if_beyond(position, self.playing_epsilon)
    }

    /// One-off correction after leaving the playing state
    pub fn on_settle(&mut self, position: f64) -> Option<f64> {
        self.push_if_beyond(position, self.settled_epsilon)
    }

    /// Forget the cursor, e.g. after a new track replaced the waveform
    pub fn reset(&mut self) {
        self.last_pushed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_always_pushed() {
        let mut t = CursorTracker::new(&VisualConfig::default());
        assert_eq!(t.on_settle(0.0), Some(0.0));
    }

    #[test]
    fn test_tick_uses_tight_epsilon() {
        let mut t = CursorTracker::new(&VisualConfig::default());
        t.on_tick(1.0);
        assert_eq!(t.on_tick(1.02), None);
        assert_eq!(t.on_tick(1.04), Some(1.04));
    }

    #[test]
    fn test_settle_uses_loose_epsilon() {
        let mut t = CursorTracker::new(&VisualConfig::default());
        t.on_tick(10.0);
        assert_eq!(t.on_settle(10.08), None);
        assert_eq!(t.on_settle(10.2), Some(10.2));
        assert_eq!(t.last_pushed(), Some(10.2));

        t.reset();
        assert_eq!(t.on_settle(10.2), Some(10.2));
    }
}
