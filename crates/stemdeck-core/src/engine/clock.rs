//! Playback clock - the single logical playhead of a session
//!
//! Channels synchronise to this clock, never to each other. The clock is a
//! plain value: position is computed from a monotonic reference instant and
//! a stored offset, so reading it has no side effects. The transport owns
//! the clock and publishes every change through a `watch` channel; readers
//! such as the visual sync loop hold a [`ClockReader`].

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Error,
}

impl TransportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportStatus::Idle => "idle",
            TransportStatus::Loading => "loading",
            TransportStatus::Ready => "ready",
            TransportStatus::Playing => "playing",
            TransportStatus::Paused => "paused",
            TransportStatus::Error => "error",
        }
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical time of a session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackClock {
    status: TransportStatus,
    /// Instant of the last `mark_playing_from`, set only while playing
    reference: Option<Instant>,
    /// Position at `reference`
    start_offset: f64,
    /// Position while not playing
    paused_position: f64,
    duration: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.status == TransportStatus::Playing
    }

    fn clamp(&self, position: f64) -> f64 {
        if !position.is_finite() {
            return 0.0;
        }
        position.clamp(0.0, self.duration.max(0.0))
    }

    /// Position at `now`, clamped to [0, duration]. Does not mutate.
    pub fn snapshot(&self, now: Instant) -> f64 {
        match (self.status, self.reference) {
            (TransportStatus::Playing, Some(reference)) => {
                let elapsed = now.saturating_duration_since(reference).as_secs_f64();
                self.clamp(self.start_offset + elapsed)
            }
            _ => self.paused_position,
        }
    }

    /// True while playing and the playhead has reached the duration
    pub fn has_ended(&self, now: Instant) -> bool {
        self.is_playing() && self.duration > 0.0 && self.snapshot(now) >= self.duration
    }

    /// Start advancing from `position` at `now`
    pub fn mark_playing_from(&mut self, position: f64, now: Instant) {
        let position = self.clamp(position);
        self.reference = Some(now);
        self.start_offset = position;
        self.paused_position = position;
        self.status = TransportStatus::Playing;
    }

    /// Freeze at the position computed for `now`
    pub fn mark_paused(&mut self, now: Instant) {
        self.paused_position = self.snapshot(now);
        self.reference = None;
        self.status = TransportStatus::Paused;
    }

    /// Set the stored position. Only meaningful while not playing.
    pub fn set_position(&mut self, position: f64) {
        self.paused_position = self.clamp(position);
    }

    /// Set a non-playing status
    pub(crate) fn set_status(&mut self, status: TransportStatus) {
        debug_assert!(status != TransportStatus::Playing, "use mark_playing_from");
        if self.is_playing() {
            self.paused_position = self.snapshot(Instant::now());
            self.reference = None;
        }
        self.status = status;
    }

    pub(crate) fn set_duration(&mut self, duration: f64) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.paused_position = self.clamp(self.paused_position);
        self.start_offset = self.clamp(self.start_offset);
    }

    /// Back to idle at position zero
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view of the transport's clock
#[derive(Debug, Clone)]
pub struct ClockReader {
    rx: watch::Receiver<PlaybackClock>,
}

impl ClockReader {
    pub(crate) fn new(rx: watch::Receiver<PlaybackClock>) -> Self {
        Self { rx }
    }

    /// Latest published clock
    pub fn current(&self) -> PlaybackClock {
        *self.rx.borrow()
    }

    pub fn status(&self) -> TransportStatus {
        self.current().status()
    }

    /// Logical position right now
    pub fn position(&self) -> f64 {
        self.current().snapshot(Instant::now())
    }

    /// Wait for the next published change. Returns false once the
    /// transport is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn clock(duration: f64) -> PlaybackClock {
        let mut c = PlaybackClock::new();
        c.set_duration(duration);
        c.set_status(TransportStatus::Ready);
        c
    }

    #[test]
    fn test_idle_clock_is_frozen_at_zero() {
        let c = PlaybackClock::new();
        let now = Instant::now();
        assert_eq!(c.snapshot(now), 0.0);
        assert_eq!(c.snapshot(now + Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn test_playing_clock_advances_from_offset() {
        let mut c = clock(180.0);
        let t0 = Instant::now();
        c.mark_playing_from(10.0, t0);

        assert_eq!(c.snapshot(t0), 10.0);
        assert!((c.snapshot(t0 + Duration::from_millis(2500)) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_is_clamped_to_duration() {
        let mut c = clock(5.0);
        let t0 = Instant::now();
        c.mark_playing_from(4.0, t0);
        assert_eq!(c.snapshot(t0 + Duration::from_secs(10)), 5.0);
        assert!(c.has_ended(t0 + Duration::from_secs(1)));
        assert!(!c.has_ended(t0));
    }

    #[test]
    fn test_snapshot_before_reference_does_not_go_back() {
        let mut c = clock(60.0);
        let t0 = Instant::now() + Duration::from_secs(1);
        c.mark_playing_from(3.0, t0);
        assert_eq!(c.snapshot(t0 - Duration::from_millis(500)), 3.0);
    }

    #[test]
    fn test_pause_captures_position() {
        let mut c = clock(180.0);
        let t0 = Instant::now();
        c.mark_playing_from(0.0, t0);
        c.mark_paused(t0 + Duration::from_secs(30));

        assert_eq!(c.status(), TransportStatus::Paused);
        assert_eq!(c.snapshot(t0 + Duration::from_secs(30)), 30.0);
        assert_eq!(c.snapshot(t0 + Duration::from_secs(90)), 30.0);
    }

    #[test]
    fn test_monotonic_while_playing() {
        let mut c = clock(100.0);
        let t0 = Instant::now();
        c.mark_playing_from(1.0, t0);
        let mut last = 0.0;
        for ms in (0..200_000).step_by(997) {
            let p = c.snapshot(t0 + Duration::from_millis(ms));
            assert!(p >= last);
            assert!((0.0..=100.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn test_set_position_clamps() {
        let mut c = clock(180.0);
        c.set_position(-5.0);
        assert_eq!(c.snapshot(Instant::now()), 0.0);
        c.set_position(280.0);
        assert_eq!(c.snapshot(Instant::now()), 180.0);
    }

    #[test]
    fn test_reader_sees_published_clock() {
        let mut c = clock(10.0);
        c.set_position(4.0);
        let (tx, rx) = watch::channel(PlaybackClock::new());
        let reader = ClockReader::new(rx);
        tx.send_replace(c);
        assert_eq!(reader.status(), TransportStatus::Ready);
        assert_eq!(reader.position(), 4.0);
    }
}
