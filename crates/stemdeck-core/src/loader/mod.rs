//! Channel loader
//!
//! Turns a separation output folder into a [`Session`] of [`StemVoice`]s.
//! Stem files follow a fixed naming convention:
//!
//! ```text
//! <output_dir>/<base_name>_<channel_id>.<ext>      e.g. song/song_vocals.wav
//! ```
//!
//! Every channel is decoded on its own blocking task, so the whole load
//! takes as long as the slowest stem. A stem that is missing or broken is
//! recorded on its channel and the others still load; the session is then
//! simply not ready to play.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::audio_file::{decode_stem, probe_duration, AudioFileError};
use crate::engine::{ChannelLoadError, LoadError, Session, StemVoice};
use crate::types::{ChannelId, ChannelSpec};

/// Default stem file extension
pub const DEFAULT_AUDIO_EXTENSION: &str = "wav";

/// Path of one channel's stem file
pub fn resolve_channel_path(output_dir: &Path, base_name: &str, channel: &ChannelId, extension: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.{}", base_name, channel, extension.trim_start_matches('.')))
}

/// Track name of an input file: its file name without extension
pub fn track_base_name(input: &Path) -> Option<String> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Where the separation job writes the stems of `input`
pub fn expected_output_dir(output_root: &Path, input: &Path) -> Option<PathBuf> {
    track_base_name(input).map(|name| output_root.join(name))
}

fn map_decode_error(path: &Path, err: AudioFileError) -> ChannelLoadError {
    let path = path.to_path_buf();
    match err {
        AudioFileError::Open { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            ChannelLoadError::Missing { path }
        }
        AudioFileError::Open { source, .. } => ChannelLoadError::Unreadable {
            path,
            reason: source.to_string(),
        },
        AudioFileError::Empty => ChannelLoadError::Empty { path },
        other => ChannelLoadError::Undecodable {
            path,
            reason: other.to_string(),
        },
    }
}

/// Decode one stem file into a voice. Blocking.
fn load_channel(path: &Path, sample_rate: u32) -> Result<StemVoice, ChannelLoadError> {
    if !path.is_file() {
        return Err(ChannelLoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let header_duration = probe_duration(path).map_err(|e| map_decode_error(path, e))?;
    let stem = decode_stem(path, sample_rate).map_err(|e| map_decode_error(path, e))?;

    log::debug!(
        "Decoded {:?}: {:.3}s (header {:?}), {}Hz -> {}Hz",
        path.file_name().unwrap_or_default(),
        stem.duration_seconds(),
        header_duration,
        stem.source_sample_rate,
        stem.sample_rate
    );

    Ok(StemVoice::new(stem.buffer, stem.sample_rate))
}

/// Loads the stems of one track into a session
#[derive(Debug, Clone)]
pub struct StemLoader {
    specs: Vec<ChannelSpec>,
    extension: String,
    sample_rate: u32,
}

impl StemLoader {
    /// `sample_rate` is the output rate; stems are resampled to it
    pub fn new(specs: Vec<ChannelSpec>, extension: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            specs,
            extension: extension.into(),
            sample_rate,
        }
    }

    pub fn specs(&self) -> &[ChannelSpec] {
        &self.specs
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Path of a channel's stem for this loader's extension
    pub fn channel_path(&self, output_dir: &Path, base_name: &str, channel: &ChannelId) -> PathBuf {
        resolve_channel_path(output_dir, base_name, channel, &self.extension)
    }

    /// Load every configured channel of `base_name` from `output_dir`.
    ///
    /// Fails only when the directory is missing or no channel loaded at
    /// all; individual failures are recorded on the returned session. The
    /// caller owns the session and must unload it (dropping it also
    /// releases every channel).
    pub async fn load(&self, output_dir: &Path, base_name: &str) -> Result<Session<StemVoice>, LoadError> {
        if !output_dir.is_dir() {
            return Err(LoadError::OutputDirMissing(output_dir.to_path_buf()));
        }

        let started = Instant::now();
        log::info!(
            "Loading {} stems of '{}' from {:?}",
            self.specs.len(),
            base_name,
            output_dir
        );

        let tasks: Vec<_> = self
            .specs
            .iter()
            .map(|spec| {
                let path = self.channel_path(output_dir, base_name, &spec.id);
                let sample_rate = self.sample_rate;
                let id = spec.id.clone();
                let task = tokio::task::spawn_blocking(move || load_channel(&path, sample_rate));
                (id, task)
            })
            .collect();

        let mut session = Session::new(&self.specs, output_dir, base_name);
        for (id, task) in tasks {
            let result = task.await.map_err(|e| LoadError::Task(e.to_string()))?;
            match result {
                Ok(voice) => {
                    if session.attach(&id, voice).is_err() {
                        log::warn!("Loaded stem for unknown channel {}", id);
                    }
                }
                Err(err) => {
                    log::warn!("Channel {} failed to load: {}", id, err);
                    session.record_error(&id, err);
                }
            }
        }

        if session.loaded_count() == 0 {
            return Err(LoadError::NoChannels {
                base_name: base_name.to_string(),
            });
        }

        log::info!(
            "Loaded {}/{} stems of '{}' in {:?} ({:.2}s)",
            session.loaded_count(),
            session.len(),
            base_name,
            started.elapsed(),
            session.duration()
        );
        Ok(session)
    }

    /// Load from a separation output folder; the folder name is the track
    /// base name
    pub async fn load_output_dir(&self, output_dir: &Path) -> Result<Session<StemVoice>, LoadError> {
        let base_name = output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LoadError::InvalidOutputPath(output_dir.to_path_buf()))?
            .to_string();
        self.load(output_dir, &base_name).await
    }
}
