//! Player state and the stdin command loop

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior};

use stemdeck_core::audio::AudioSystemResult;
use stemdeck_core::config::PlayerConfig;
use stemdeck_core::engine::{StemVoice, Transport};
use stemdeck_core::loader::StemLoader;
use stemdeck_core::mix::{FaderTarget, GainFader};
use stemdeck_core::recent::{RecentSession, RecentSessions};
use stemdeck_core::separation::{SeparationEvent, SeparationProgress};
use stemdeck_core::sync::{VisualSync, VisualSyncHandle};
use stemdeck_core::format_time;

use crate::audio::attach_voices;
use crate::commands::{Command, HELP};

/// How often channel drift is checked while playing
const DRIFT_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// A scripted fader glide, advanced once per frame
#[derive(Debug, Clone)]
struct Fade {
    target: FaderTarget,
    from: f32,
    to: f32,
    started: Instant,
    length: Duration,
}

impl Fade {
    fn value_at(&self, now: Instant) -> (f32, bool) {
        if self.length.is_zero() {
            return (self.to, true);
        }
        let t = (now.saturating_duration_since(self.started).as_secs_f32() / self.length.as_secs_f32()).min(1.0);
        (self.from + (self.to - self.from) * t, t >= 1.0)
    }
}

pub struct App {
    config: PlayerConfig,
    config_path: PathBuf,
    recent: RecentSessions,
    recent_path: PathBuf,
    output: AudioSystemResult,
    loader: StemLoader,
    transport: Transport<StemVoice>,
    faders: Vec<GainFader>,
    fade: Option<Fade>,
    separation: SeparationProgress,
    /// Source track of the next stems to open
    pending_input: Option<PathBuf>,
    /// Last cursor pushed by the visual sync, as f64 bits
    cursor: Arc<AtomicU64>,
    _visual: VisualSyncHandle,
}

impl App {
    /// Must be called inside the tokio runtime
    pub fn new(
        config: PlayerConfig,
        config_path: PathBuf,
        recent_path: PathBuf,
        output: AudioSystemResult,
    ) -> Self {
        let loader = config.stem_loader(output.sample_rate);
        let mut transport = Transport::empty(&config.channels, config.transport.clone());
        transport.mix().apply(&config.mix);

        let mut faders: Vec<GainFader> = config
            .channels
            .iter()
            .map(|spec| GainFader::new(FaderTarget::Channel(spec.id.clone()), spec.default_gain, &config.fader))
            .collect();
        faders.push(GainFader::new(FaderTarget::Master, 1.0, &config.fader));
        {
            let mix = transport.mix();
            for fader in &mut faders {
                fader.sync_from(&mix);
            }
        }

        let cursor = Arc::new(AtomicU64::new(0f64.to_bits()));
        let visual = {
            let cursor = cursor.clone();
            VisualSync::spawn(
                transport.clock_reader(),
                move |seconds: f64| {
                    log::trace!("cursor {:.3}", seconds);
                    cursor.store(seconds.to_bits(), Ordering::Relaxed);
                },
                config.visual.clone(),
            )
        };

        Self {
            recent: RecentSessions::load(&recent_path),
            config,
            config_path,
            recent_path,
            output,
            loader,
            transport,
            faders,
            fade: None,
            separation: SeparationProgress::new(),
            pending_input: None,
            cursor,
            _visual: visual,
        }
    }

    /// Load the stems of `dir`, remembering `input` as their source track
    pub async fn open(&mut self, dir: &Path, input: Option<PathBuf>) -> Result<()> {
        self.finish_fade()?;
        self.transport
            .load(self.loader.load_output_dir(dir))
            .await
            .with_context(|| format!("Could not open {:?}", dir))?;

        let attached = attach_voices(&mut self.output.voice_sender, self.transport.session());
        log::debug!("{} voices attached to the output", attached);
        self.sync_faders();

        if let Some(input) = input.or_else(|| self.pending_input.take()) {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.transport.session().base_name().to_string());
            self.recent.add(RecentSession::new(&input, name, dir));
            if let Err(e) = self.recent.save(&self.recent_path) {
                log::warn!("Could not save recent tracks: {:#}", e);
            }
        }

        let session = self.transport.session();
        println!(
            "Opened '{}': {}/{} stems, {} ({})",
            session.base_name(),
            session.loaded_count(),
            session.len(),
            format_time(session.duration()),
            self.transport.status()
        );
        Ok(())
    }

    /// Reopen the stems of a previously separated track
    pub async fn resume(&mut self, input: &Path) -> Result<()> {
        let dir = self.recent.resume(
            input,
            &self.config.output_directory,
            &self.config.channels,
            &self.config.audio_extension,
        );
        let Some(dir) = dir else {
            if let Err(e) = self.recent.save(&self.recent_path) {
                log::warn!("Could not save recent tracks: {:#}", e);
            }
            bail!("No stems found for {:?} in {:?}", input, self.config.output_directory);
        };
        self.open(&dir, Some(input.to_path_buf())).await
    }

    /// Remember the source track of the next separation
    pub fn set_input(&mut self, input: PathBuf) {
        self.pending_input = Some(input);
    }

    /// Read commands until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let mut frame = tokio::time::interval(self.config.visual.tick());
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut drift = tokio::time::interval(DRIFT_CHECK_INTERVAL);
        drift.set_missed_tick_behavior(MissedTickBehavior::Skip);

        println!("Type 'help' for commands.");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read stdin")? else { break };
                    match Command::parse(&line) {
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(command)) => {
                            if let Err(e) = self.execute(command).await {
                                println!("Error: {:#}", e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{:#}", e),
                    }
                }
                _ = frame.tick() => self.on_frame(),
                _ = drift.tick() => self.check_drift().await,
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Play => self.transport.play().await?,
            Command::Pause => self.transport.pause(),
            Command::Toggle => self.transport.toggle().await?,
            Command::Stop => {
                self.transport.pause();
                self.transport.seek(0.0).await?;
            }
            Command::Seek(seconds) => self.transport.seek(seconds).await?,
            Command::SkipForward(seconds) => {
                let step = seconds.unwrap_or(self.config.transport.skip_seconds);
                self.transport.skip_forward(step).await?;
            }
            Command::SkipBackward(seconds) => {
                let step = seconds.unwrap_or(self.config.transport.skip_seconds);
                self.transport.skip_backward(step).await?;
            }
            Command::Volume(target, gain) => {
                self.cancel_fade_on(&target);
                let fader = find_fader(&mut self.faders, &target)?;
                fader.input(&mut self.transport.mix(), gain)?;
                self.sync_faders();
            }
            Command::Fade { target, gain, millis } => self.start_fade(target, gain, millis)?,
            Command::Mute(id) => {
                let muted = self.transport.mix().toggle_mute(&id)?;
                println!("{} {}", id, if muted { "muted" } else { "unmuted" });
            }
            Command::Lock(locked) => {
                let mut mix = self.transport.mix();
                let locked = locked.unwrap_or(!mix.is_locked());
                mix.set_locked(locked);
                println!("Gains {}", if locked { "locked" } else { "unlocked" });
            }
            Command::Open(dir) => self.open(&dir, None).await?,
            Command::Resume(input) => self.resume(&input).await?,
            Command::Recent => self.print_recent(),
            Command::Status => self.print_status(),
            Command::Help => println!("{}", HELP),
            Command::Separation(event) => self.on_separation(event).await?,
            Command::Quit => {}
        }
        Ok(())
    }

    async fn on_separation(&mut self, event: SeparationEvent) -> Result<()> {
        self.separation.apply(&event);
        println!("[{:>3}%] {}", self.separation.percent(), self.separation.message());

        if let Some(dir) = event.finished_output() {
            let dir = dir.clone();
            self.open(&dir, None).await?;
        }
        Ok(())
    }

    fn sync_faders(&mut self) {
        let mix = self.transport.mix();
        for fader in &mut self.faders {
            fader.sync_from(&mix);
        }
    }

    fn start_fade(&mut self, target: FaderTarget, to: f32, millis: u64) -> Result<()> {
        self.finish_fade()?;
        let fader = find_fader(&mut self.faders, &target)?;
        fader.start_drag();
        self.fade = Some(Fade {
            from: fader.displayed(),
            to: to.clamp(0.0, 1.0),
            target,
            started: Instant::now(),
            length: Duration::from_millis(millis),
        });
        Ok(())
    }

    /// Commit a running fade at its end value
    fn finish_fade(&mut self) -> Result<()> {
        if let Some(fade) = self.fade.take() {
            let fader = find_fader(&mut self.faders, &fade.target)?;
            fader.end_drag(&mut self.transport.mix(), fade.to)?;
            self.sync_faders();
        }
        Ok(())
    }

    fn cancel_fade_on(&mut self, target: &FaderTarget) {
        if self.fade.as_ref().is_some_and(|f| &f.target == target) {
            if let Err(e) = self.finish_fade() {
                log::warn!("Fade failed: {:#}", e);
            }
        }
    }

    fn on_frame(&mut self) {
        if let Some(fade) = self.fade.clone() {
            let (value, done) = fade.value_at(Instant::now());
            let result = find_fader(&mut self.faders, &fade.target).and_then(|fader| {
                let mut mix = self.transport.mix();
                if done {
                    fader.end_drag(&mut mix, value)?;
                } else {
                    fader.input(&mut mix, value)?;
                    fader.on_frame(&mut mix)?;
                }
                Ok(())
            });
            if done || result.is_err() {
                self.fade = None;
                self.sync_faders();
            }
            if let Err(e) = result {
                log::warn!("Fade stopped: {:#}", e);
            }
        }

        if self.transport.poll_end() {
            println!("End of track");
        }
    }

    async fn check_drift(&mut self) {
        match self.transport.resync_if_drifted().await {
            Ok(true) => log::info!("Channels resynchronized"),
            Ok(false) => {}
            Err(e) => log::error!("Resync failed: {}", e),
        }
    }

    fn print_status(&self) {
        let cursor = f64::from_bits(self.cursor.load(Ordering::Relaxed));
        let transport = &self.transport;
        println!(
            "{} {} / {} ({:.0}%)  cursor {}  [{}]",
            transport.status(),
            format_time(transport.position()),
            format_time(transport.duration()),
            transport.progress(),
            format_time(cursor),
            self.output.handle.name()
        );
        if let Some(error) = transport.last_error() {
            println!("  last error: {}", error);
        }
        if let Some(drift) = transport.measure_drift() {
            println!("  drift {:.1} ms", drift * 1000.0);
        }

        let session = transport.session();
        if session.is_locked() {
            println!("  gains locked");
        }
        for channel in session.channels() {
            let state = match channel.load_error() {
                Some(err) => format!("not loaded: {}", err),
                None if !channel.is_loaded() => "not loaded".to_string(),
                None if channel.is_muted() => "muted".to_string(),
                None => String::new(),
            };
            println!("  {:<8} {:<8} {:>4.2}  {}", channel.id(), channel.name(), channel.gain(), state);
        }
        if self.separation.status().is_processing() {
            println!("  separation: {}", self.separation.message());
        }
    }

    fn print_recent(&self) {
        if self.recent.is_empty() {
            println!("No recent tracks");
            return;
        }
        for (i, entry) in self.recent.entries().iter().enumerate() {
            println!("  {}. {}  ({:?})", i + 1, entry.name, entry.input_path);
        }
    }

    /// Stop playback and persist the mix and the recent list
    pub fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.finish_fade() {
            log::warn!("Fade failed: {:#}", e);
        }
        self.config.mix = self.transport.mix().snapshot();
        self.transport.unload();

        self.recent.save(&self.recent_path)?;
        self.config.save(&self.config_path)?;
        log::info!("Saved mix and recent tracks");
        Ok(())
    }
}

fn find_fader<'a>(faders: &'a mut [GainFader], target: &FaderTarget) -> Result<&'a mut GainFader> {
    faders
        .iter_mut()
        .find(|f| f.target() == target)
        .with_context(|| match target {
            FaderTarget::Channel(id) => format!("No channel '{}'", id),
            FaderTarget::Master => "No master fader".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdeck_core::ChannelId;

    #[test]
    fn test_fade_interpolates_and_finishes() {
        let start = Instant::now();
        let fade = Fade {
            target: FaderTarget::Channel(ChannelId::new("vocals")),
            from: 0.0,
            to: 1.0,
            started: start,
            length: Duration::from_millis(1000),
        };

        let (value, done) = fade.value_at(start + Duration::from_millis(250));
        assert!((value - 0.25).abs() < 1e-4);
        assert!(!done);

        let (value, done) = fade.value_at(start + Duration::from_millis(1500));
        assert_eq!(value, 1.0);
        assert!(done);
    }

    #[test]
    fn test_zero_length_fade_is_immediate() {
        let fade = Fade {
            target: FaderTarget::Master,
            from: 0.8,
            to: 0.2,
            started: Instant::now(),
            length: Duration::ZERO,
        };
        assert_eq!(fade.value_at(Instant::now()), (0.2, true));
    }

    #[test]
    fn test_find_fader() {
        let config = stemdeck_core::mix::FaderConfig::default();
        let mut faders = vec![
            GainFader::new(FaderTarget::Channel("bass".into()), 0.75, &config),
            GainFader::new(FaderTarget::Master, 1.0, &config),
        ];
        assert!(find_fader(&mut faders, &FaderTarget::Master).is_ok());
        assert!(find_fader(&mut faders, &FaderTarget::Channel("keys".into())).is_err());
    }
}
