//! Transport - play/pause/seek coordination across all channels
//!
//! The transport is the only place that moves channel handles in time.
//! Every operation takes `&mut self`, so operations on one transport are
//! serialised: a seek-while-playing completes its pause, reposition and
//! resume before the next call is accepted.
//!
//! State machine:
//!
//! ```text
//! idle ──load──► loading ──all loaded──► ready ──play──► playing ⇄ paused
//!                   │                                      │
//!                   └──nothing loaded──► error   end ──► paused at duration
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use super::clock::{ClockReader, PlaybackClock, TransportStatus};
use super::error::{LoadError, PlaybackStartError, TransportError};
use super::handle::ChannelHandle;
use super::session::Session;
use crate::mix::MixController;
use crate::types::ChannelSpec;

/// Transport timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Longest wait for a channel to report ready before playing anyway
    pub ready_timeout_ms: u64,
    /// How often readiness is polled during that wait
    pub ready_poll_ms: u64,
    /// Pause between repositioning and resuming in a seek while playing
    pub seek_settle_ms: u64,
    /// Default skip step in seconds
    pub skip_seconds: f64,
    /// Channel/clock divergence that triggers a corrective resync.
    /// `None` disables drift correction.
    pub drift_tolerance_ms: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 1000,
            ready_poll_ms: 10,
            seek_settle_ms: 20,
            skip_seconds: 10.0,
            drift_tolerance_ms: Some(80),
        }
    }
}

impl TransportConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms.max(1))
    }

    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    pub fn drift_tolerance(&self) -> Option<f64> {
        self.drift_tolerance_ms.map(|ms| ms as f64 / 1000.0)
    }
}

/// One logical transport over all channels of a session
pub struct Transport<H: ChannelHandle> {
    session: Session<H>,
    clock: PlaybackClock,
    clock_tx: watch::Sender<PlaybackClock>,
    config: TransportConfig,
    last_error: Option<String>,
}

impl<H: ChannelHandle> Transport<H> {
    /// Wrap an existing session. Ready if every channel is loaded.
    pub fn new(session: Session<H>, config: TransportConfig) -> Self {
        let mut clock = PlaybackClock::new();
        clock.set_duration(session.duration());
        if session.all_loaded() {
            clock.set_status(TransportStatus::Ready);
        }
        let (clock_tx, _) = watch::channel(clock);

        Self {
            session,
            clock,
            clock_tx,
            config,
            last_error: None,
        }
    }

    /// Transport with no track loaded
    pub fn empty(specs: &[ChannelSpec], config: TransportConfig) -> Self {
        Self::new(Session::empty(specs), config)
    }

    pub fn status(&self) -> TransportStatus {
        self.clock.status()
    }

    /// Logical position now
    pub fn position(&self) -> f64 {
        self.clock.snapshot(Instant::now())
    }

    pub fn duration(&self) -> f64 {
        self.clock.duration()
    }

    /// Position as a percentage of the duration, 0..=100
    pub fn progress(&self) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.position() / duration * 100.0).clamp(0.0, 100.0)
    }

    pub fn session(&self) -> &Session<H> {
        &self.session
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Message of the last failure that put the transport in error
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Subscribe to clock changes
    pub fn clock_reader(&self) -> ClockReader {
        ClockReader::new(self.clock_tx.subscribe())
    }

    /// Gain and mute control over the current session
    pub fn mix(&mut self) -> MixController<'_, H> {
        MixController::new(&mut self.session)
    }

    fn publish(&self) {
        self.clock_tx.send_replace(self.clock);
    }

    fn set_status(&mut self, status: TransportStatus) {
        if self.clock.status() != status {
            log::debug!("Transport: {} -> {}", self.clock.status(), status);
        }
        self.clock.set_status(status);
        self.publish();
    }

    fn not_ready(&self) -> TransportError {
        TransportError::NotReady {
            status: self.clock.status(),
            loaded: self.session.loaded_count(),
            total: self.session.len(),
        }
    }

    /// Replace the session with the result of `load`.
    ///
    /// The current session is stopped and released first. Settles in
    /// `Ready` when every channel loaded, `Idle` when some are missing
    /// (play stays refused) and `Error` when the load failed outright. The
    /// mix (gains, mutes, lock) carries over to the new session.
    pub async fn load<F>(&mut self, load: F) -> Result<(), TransportError>
    where
        F: Future<Output = Result<Session<H>, LoadError>>,
    {
        let mix = self.session.mix_snapshot();
        self.unload();
        self.set_status(TransportStatus::Loading);

        match load.await {
            Ok(mut session) => {
                session.apply_mix(&mix);
                self.session = session;
                self.last_error = None;
                self.clock.set_duration(self.session.duration());
                self.clock.set_position(0.0);

                if self.session.all_loaded() {
                    log::info!(
                        "Session '{}' ready ({} channels, {:.2}s)",
                        self.session.base_name(),
                        self.session.len(),
                        self.session.duration()
                    );
                    self.set_status(TransportStatus::Ready);
                } else {
                    for (id, err) in self.session.load_errors() {
                        log::warn!("Channel {} not loaded: {}", id, err);
                    }
                    log::warn!(
                        "Session '{}' incomplete: {}/{} channels loaded",
                        self.session.base_name(),
                        self.session.loaded_count(),
                        self.session.len()
                    );
                    self.set_status(TransportStatus::Idle);
                }
                Ok(())
            }
            Err(err) => {
                log::error!("Session load failed: {}", err);
                self.last_error = Some(err.to_string());
                self.set_status(TransportStatus::Error);
                Err(err.into())
            }
        }
    }

    /// Stop playback and release every channel
    pub fn unload(&mut self) {
        if self.clock.is_playing() {
            self.clock.mark_paused(Instant::now());
        }
        // Keeps the channel layout and the mix
        self.session.unload();
        self.clock.reset();
        self.publish();
    }

    /// Start all channels together from the stored position.
    ///
    /// Allowed after a failed start (`Error` with every channel loaded) so
    /// the user can retry without reloading.
    pub async fn play(&mut self) -> Result<(), TransportError> {
        let status = self.clock.status();
        if !self.session.all_loaded()
            || !matches!(
                status,
                TransportStatus::Ready | TransportStatus::Paused | TransportStatus::Error
            )
        {
            return Err(self.not_ready());
        }

        let start = self.clock.snapshot(Instant::now());
        for (_, handle) in self.session.handles() {
            handle.seek(start);
        }

        self.wait_until_ready().await;

        let mut started = Vec::with_capacity(self.session.len());
        let mut failures = Vec::new();
        for (id, handle) in self.session.handles() {
            match handle.play() {
                Ok(()) => started.push(handle),
                Err(err) => {
                    log::warn!("Channel {} failed to start: {}", id, err);
                    failures.push((id.clone(), err));
                }
            }
        }

        if failures.is_empty() {
            self.last_error = None;
            self.clock.mark_playing_from(start, Instant::now());
            self.publish();
            log::info!("Playing '{}' from {:.3}s", self.session.base_name(), start);
            return Ok(());
        }

        // Roll back so no channel plays on its own
        for handle in &started {
            handle.pause();
            handle.seek(start);
        }
        let all_failed = started.is_empty();
        let error = PlaybackStartError { failures, all_failed };

        if all_failed {
            log::error!("Playback failed: {}", error);
            self.last_error = Some(error.to_string());
            self.set_status(TransportStatus::Error);
        } else {
            log::error!("Playback rolled back: {}", error);
        }
        Err(error.into())
    }

    /// Bounded wait for every handle to report ready. A timeout is logged
    /// and playback proceeds.
    async fn wait_until_ready(&self) {
        let deadline = Instant::now() + self.config.ready_timeout();
        loop {
            if self.session.handles().all(|(_, h)| h.is_ready()) {
                return;
            }
            if Instant::now() >= deadline {
                for (id, handle) in self.session.handles() {
                    if !handle.is_ready() {
                        log::warn!(
                            "Channel {} not ready after {}ms, starting anyway",
                            id,
                            self.config.ready_timeout_ms
                        );
                    }
                }
                return;
            }
            sleep(self.config.ready_poll()).await;
        }
    }

    /// Freeze the clock, then stop every channel. No-op unless playing.
    pub fn pause(&mut self) {
        if !self.clock.is_playing() {
            return;
        }
        // Capture the position before the per-channel stop round-trip
        self.clock.mark_paused(Instant::now());
        for (_, handle) in self.session.handles() {
            handle.pause();
        }
        self.publish();
        log::info!("Paused at {:.3}s", self.clock.snapshot(Instant::now()));
    }

    /// Play when stopped, pause when playing
    pub async fn toggle(&mut self) -> Result<(), TransportError> {
        if self.clock.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play().await
        }
    }

    fn reposition(&mut self, target: f64) {
        for (_, handle) in self.session.handles() {
            handle.seek(target);
        }
        self.clock.set_position(target);
        self.publish();
    }

    /// Move every channel to `target`, clamped to [0, duration].
    ///
    /// While playing this is pause, reposition, settle, resume, so all
    /// channels restart from the same frame. Fails only if no channel could
    /// resume; a partial failure leaves the transport paused at `target`.
    pub async fn seek(&mut self, target: f64) -> Result<(), TransportError> {
        if !self.session.all_loaded() {
            return Err(self.not_ready());
        }
        let target = if target.is_finite() {
            target.clamp(0.0, self.duration())
        } else {
            0.0
        };

        if !self.clock.is_playing() {
            self.reposition(target);
            return Ok(());
        }

        self.pause();
        self.reposition(target);
        sleep(self.config.seek_settle()).await;

        match self.play().await {
            Ok(()) => Ok(()),
            Err(TransportError::PlaybackStart(err)) if !err.all_failed => {
                log::warn!("Resume after seek incomplete, staying paused: {}", err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Seek relative to the current position. Fails like `seek`.
    pub async fn skip_forward(&mut self, seconds: f64) -> Result<(), TransportError> {
        let target = self.position() + seconds.abs();
        self.seek(target).await
    }

    pub async fn skip_backward(&mut self, seconds: f64) -> Result<(), TransportError> {
        let target = self.position() - seconds.abs();
        self.seek(target).await
    }

    /// Handle the natural end of the track: pause at the duration.
    ///
    /// Returns true if playback just ended. Call periodically.
    pub fn poll_end(&mut self) -> bool {
        if !self.clock.has_ended(Instant::now()) {
            return false;
        }
        self.clock.mark_paused(Instant::now());
        for (_, handle) in self.session.handles() {
            handle.pause();
        }
        self.publish();
        log::info!("Reached end of '{}'", self.session.base_name());
        true
    }

    /// Largest divergence between any channel and the clock, in seconds.
    ///
    /// `None` unless playing. A channel shorter than the track is compared
    /// against its own end once the clock has passed it.
    pub fn measure_drift(&self) -> Option<f64> {
        if !self.clock.is_playing() {
            return None;
        }
        let logical = self.clock.snapshot(Instant::now());
        self.session
            .channels()
            .iter()
            .filter_map(|c| {
                let handle = c.handle()?;
                let expected = match c.duration() {
                    Some(d) => logical.min(d),
                    None => logical,
                };
                Some((handle.position() - expected).abs())
            })
            .reduce(f64::max)
    }

    /// Realign channels with the clock if drift exceeds the configured
    /// tolerance. Returns true if a resync was performed.
    pub async fn resync_if_drifted(&mut self) -> Result<bool, TransportError> {
        let Some(tolerance) = self.config.drift_tolerance() else {
            return Ok(false);
        };
        let Some(drift) = self.measure_drift() else {
            return Ok(false);
        };
        if drift <= tolerance {
            return Ok(false);
        }

        log::warn!(
            "Channels drifted {:.1}ms from the clock, resyncing",
            drift * 1000.0
        );
        let position = self.position();
        self.seek(position).await?;
        Ok(true)
    }
}

impl<H: ChannelHandle> Drop for Transport<H> {
    fn drop(&mut self) {
        if self.clock.is_playing() {
            for (_, handle) in self.session.handles() {
                handle.pause();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ChannelLoadError;
    use crate::engine::handle::mock::MockHandle;
    use crate::types::ChannelId;

    fn loaded_session(handles: &[MockHandle]) -> Session<MockHandle> {
        let specs = ChannelSpec::default_set();
        let mut session = Session::new(&specs, "/tmp/out/song", "song");
        for (spec, handle) in specs.iter().zip(handles) {
            session.attach(&spec.id, handle.clone()).unwrap();
        }
        session
    }

    fn mocks(duration: f64) -> Vec<MockHandle> {
        (0..4).map(|_| MockHandle::new(duration)).collect()
    }

    fn transport(handles: &[MockHandle]) -> Transport<MockHandle> {
        Transport::new(loaded_session(handles), TransportConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_play_pause_seek_play() {
        let handles = mocks(180.0);
        let mut t = transport(&handles);
        assert_eq!(t.status(), TransportStatus::Ready);

        t.play().await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
        assert!(handles.iter().all(|h| h.is_playing()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!((t.position() - 30.0).abs() < 0.1);

        t.pause();
        assert_eq!(t.status(), TransportStatus::Paused);
        assert!((t.position() - 30.0).abs() < 0.1);
        assert!(handles.iter().all(|h| !h.is_playing()));

        t.seek(10.0).await.unwrap();
        assert_eq!(t.position(), 10.0);
        assert!(handles.iter().all(|h| h.position() == 10.0));

        t.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!((t.position() - 15.0).abs() < 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_requires_all_loaded() {
        let specs = ChannelSpec::default_set();
        let mut session = Session::new(&specs, "/tmp/out/song", "song");
        for spec in &specs[..3] {
            session.attach(&spec.id, MockHandle::new(60.0)).unwrap();
        }
        session.record_error(
            &ChannelId::new("other"),
            ChannelLoadError::Missing {
                path: "/tmp/out/song/song_other.wav".into(),
            },
        );

        let mut t = Transport::new(session, TransportConfig::default());
        let err = t.play().await.unwrap_err();
        assert!(matches!(err, TransportError::NotReady { loaded: 3, total: 4, .. }));
        assert_eq!(t.status(), TransportStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_skip_require_all_loaded() {
        let specs = ChannelSpec::default_set();
        let handles = mocks(60.0);
        let mut session = Session::new(&specs, "/tmp/out/song", "song");
        for (spec, handle) in specs[..3].iter().zip(&handles) {
            session.attach(&spec.id, handle.clone()).unwrap();
        }

        let mut t = Transport::new(session, TransportConfig::default());
        assert!(matches!(t.seek(30.0).await, Err(TransportError::NotReady { loaded: 3, .. })));
        assert!(matches!(t.skip_forward(5.0).await, Err(TransportError::NotReady { .. })));
        assert!(matches!(t.skip_backward(5.0).await, Err(TransportError::NotReady { .. })));

        assert_eq!(t.position(), 0.0);
        assert_eq!(t.status(), TransportStatus::Idle);
        assert!(handles[..3].iter().all(|h| h.position() == 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_on_empty_transport_is_not_ready() {
        let mut t: Transport<MockHandle> =
            Transport::empty(&ChannelSpec::default_set(), TransportConfig::default());
        assert!(matches!(t.seek(10.0).await, Err(TransportError::NotReady { loaded: 0, .. })));
        assert_eq!(t.position(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_while_playing_is_not_ready() {
        let handles = mocks(60.0);
        let mut t = transport(&handles);
        t.play().await.unwrap();
        assert!(matches!(t.play().await, Err(TransportError::NotReady { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_play_failure_rolls_back() {
        let mut handles = mocks(60.0);
        handles[2] = MockHandle::failing(60.0);
        let mut t = transport(&handles);

        let err = t.play().await.unwrap_err();
        match err {
            TransportError::PlaybackStart(e) => {
                assert!(!e.all_failed);
                assert_eq!(e.failures.len(), 1);
                assert_eq!(e.failures[0].0.as_str(), "bass");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t.status(), TransportStatus::Ready);
        assert!(handles.iter().all(|h| !h.is_playing()));

        // Retry after the flaky channel recovers
        handles[2].state.lock().unwrap().fail_play = false;
        t.play().await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_channels_failing_sets_error() {
        let handles: Vec<_> = (0..4).map(|_| MockHandle::failing(60.0)).collect();
        let mut t = transport(&handles);

        let err = t.play().await.unwrap_err();
        assert!(matches!(err, TransportError::PlaybackStart(ref e) if e.all_failed));
        assert_eq!(t.status(), TransportStatus::Error);
        assert!(t.last_error().is_some());

        // The session survives, so play can be retried once channels recover
        for h in &handles {
            h.state.lock().unwrap().fail_play = false;
        }
        t.play().await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
        assert!(t.last_error().is_none());
        assert!(handles.iter().all(|h| h.is_playing()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_ready_channel_waits_bounded_time() {
        let mut handles = mocks(60.0);
        handles[0] = MockHandle::never_ready(60.0);
        let mut t = transport(&handles);

        let before = Instant::now();
        t.play().await.unwrap();
        let waited = Instant::now() - before;
        assert!(waited >= Duration::from_millis(1000));
        assert!(waited < Duration::from_millis(1100));
        assert_eq!(t.status(), TransportStatus::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_clamps_and_is_idempotent() {
        let handles = mocks(180.0);
        let mut t = transport(&handles);

        t.seek(-5.0).await.unwrap();
        assert_eq!(t.position(), 0.0);
        t.seek(280.0).await.unwrap();
        assert_eq!(t.position(), 180.0);

        t.seek(42.0).await.unwrap();
        t.seek(42.0).await.unwrap();
        assert_eq!(t.position(), 42.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_seek_while_playing_is_idempotent() {
        let handles = mocks(180.0);
        let mut t = transport(&handles);
        t.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(7)).await;

        t.seek(42.0).await.unwrap();
        t.seek(42.0).await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
        assert!((t.position() - 42.0).abs() < 0.05);
        for h in &handles {
            assert!(h.is_playing());
            assert_eq!(h.position(), 42.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_while_playing_repositions_and_resumes() {
        let handles = mocks(180.0);
        let mut t = transport(&handles);
        t.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        t.seek(100.0).await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
        assert!((t.position() - 100.0).abs() < 0.05);
        for h in &handles {
            assert!(h.is_playing());
            assert_eq!(h.position(), 100.0);
            assert!(h.state.lock().unwrap().pause_calls >= 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_and_toggle() {
        let handles = mocks(30.0);
        let mut t = transport(&handles);

        t.skip_forward(10.0).await.unwrap();
        assert_eq!(t.position(), 10.0);
        t.skip_backward(25.0).await.unwrap();
        assert_eq!(t.position(), 0.0);

        t.toggle().await.unwrap();
        assert_eq!(t.status(), TransportStatus::Playing);
        t.toggle().await.unwrap();
        assert_eq!(t.status(), TransportStatus::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_when_not_playing_is_noop() {
        let handles = mocks(30.0);
        let mut t = transport(&handles);
        t.pause();
        assert_eq!(t.status(), TransportStatus::Ready);
        assert!(handles.iter().all(|h| h.state.lock().unwrap().pause_calls == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_end_pauses_at_duration() {
        let handles = mocks(5.0);
        let mut t = transport(&handles);
        t.play().await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!t.poll_end());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(t.poll_end());
        assert_eq!(t.status(), TransportStatus::Paused);
        assert_eq!(t.position(), 5.0);
        assert_eq!(t.progress(), 100.0);
        assert!(handles.iter().all(|h| !h.is_playing()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drift_detection_and_resync() {
        let handles = mocks(120.0);
        let mut t = transport(&handles);
        t.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        for h in &handles {
            h.force_position(10.0);
        }
        assert!(t.measure_drift().unwrap() < 0.01);
        assert!(!t.resync_if_drifted().await.unwrap());

        handles[1].force_position(10.5);
        assert!((t.measure_drift().unwrap() - 0.5).abs() < 0.01);
        assert!(t.resync_if_drifted().await.unwrap());
        assert_eq!(t.status(), TransportStatus::Playing);
        let target = handles[0].position();
        assert!(handles.iter().all(|h| h.position() == target));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_success_and_failure() {
        let mut t: Transport<MockHandle> =
            Transport::empty(&ChannelSpec::default_set(), TransportConfig::default());
        assert_eq!(t.status(), TransportStatus::Idle);

        let handles = mocks(90.0);
        let session = loaded_session(&handles);
        t.load(async move { Ok(session) }).await.unwrap();
        assert_eq!(t.status(), TransportStatus::Ready);
        assert_eq!(t.duration(), 90.0);

        let err = t
            .load(async {
                Err(LoadError::NoChannels {
                    base_name: "song".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Load(_)));
        assert_eq!(t.status(), TransportStatus::Error);
        // Previous session was released on reload
        assert!(handles.iter().all(|h| h.release_count() == 1));
        assert_eq!(t.duration(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_keeps_mix() {
        let mut t = transport(&mocks(60.0));
        t.mix().set_locked(true);
        t.mix().set_master_gain(0.4);

        let handles = mocks(60.0);
        let session = loaded_session(&handles);
        t.load(async move { Ok(session) }).await.unwrap();
        assert!(t.session().is_locked());
        assert!(handles.iter().all(|h| h.gain() == 0.4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_reader_follows_transport() {
        let handles = mocks(60.0);
        let mut t = transport(&handles);
        let reader = t.clock_reader();

        t.play().await.unwrap();
        assert_eq!(reader.status(), TransportStatus::Playing);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!((reader.position() - 2.0).abs() < 0.05);

        t.pause();
        assert_eq!(reader.status(), TransportStatus::Paused);
    }
}
