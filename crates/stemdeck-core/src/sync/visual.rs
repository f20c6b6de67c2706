//! Visual sync bridge - keeps a waveform cursor on the playback clock
//!
//! Runs as a tokio task that only reads the clock. While the transport is
//! playing it ticks once per display frame and moves the cursor when it
//! drifted past the tight epsilon. The animation loop ends as soon as a
//! non-playing clock is published; one corrective update is then pushed if
//! the cursor is off by more than the loose epsilon, and the task sleeps
//! until the next clock change.

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::tracker::{CursorTracker, VisualConfig};
use crate::engine::{ClockReader, TransportStatus};

/// Receiver of cursor positions, in seconds
pub trait CursorSink: Send + 'static {
    fn set_cursor(&mut self, seconds: f64);
}

impl<F> CursorSink for F
where
    F: FnMut(f64) + Send + 'static,
{
    fn set_cursor(&mut self, seconds: f64) {
        self(seconds)
    }
}

/// Spawner for the cursor task
pub struct VisualSync;

impl VisualSync {
    /// Start following `reader`. Must be called inside a tokio runtime.
    pub fn spawn<S: CursorSink>(reader: ClockReader, sink: S, config: VisualConfig) -> VisualSyncHandle {
        let task = tokio::spawn(run(reader, sink, config));
        VisualSyncHandle { task }
    }
}

/// Stops the cursor task when dropped
pub struct VisualSyncHandle {
    task: JoinHandle<()>,
}

impl VisualSyncHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for VisualSyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<S: CursorSink>(mut reader: ClockReader, mut sink: S, config: VisualConfig) {
    let mut tracker = CursorTracker::new(&config);

    loop {
        if reader.status() == TransportStatus::Playing {
            let open = animate(&mut reader, &mut sink, &mut tracker, &config).await;
            if !open {
                break;
            }
        }

        let clock = reader.current();
        if !clock.is_playing() {
            if let Some(position) = tracker.on_settle(clock.snapshot(Instant::now())) {
                sink.set_cursor(position);
            }
        }

        if !reader.changed().await {
            break;
        }
    }

    log::debug!("Visual sync stopped: transport closed");
}

/// Per-frame loop while playing. Returns false if the transport is gone.
async fn animate<S: CursorSink>(
    reader: &mut ClockReader,
    sink: &mut S,
    tracker: &mut CursorTracker,
    config: &VisualConfig,
) -> bool {
    let mut ticker = interval(config.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let clock = reader.current();
                if !clock.is_playing() {
                    return true;
                }
                if let Some(position) = tracker.on_tick(clock.snapshot(Instant::now())) {
                    sink.set_cursor(position);
                }
            }
            open = reader.changed() => {
                if !open {
                    return false;
                }
                if !reader.current().is_playing() {
                    return true;
                }
            }
        }
    }
}
