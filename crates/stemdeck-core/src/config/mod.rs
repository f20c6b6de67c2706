//! Player configuration
//!
//! Stored as YAML at `<config dir>/stemdeck/config.yaml`:
//!
//! ```yaml
//! audio:
//!   backend: cpal
//!   sample_rate: 48000
//!   buffer_frames: 512
//! channels:
//!   - { id: vocals, name: Vocals, default_gain: 0.8 }
//!   - { id: drums, name: Drums, default_gain: 0.7 }
//! audio_extension: wav
//! output_directory: /home/me/Music/stemdeck
//! transport:
//!   ready_timeout_ms: 1000
//!   drift_tolerance_ms: 80
//! mix:
//!   locked: false
//!   channels:
//!     vocals: { gain: 0.5, muted: true }
//! ```
//!
//! Every section falls back to its defaults when omitted.

mod io;
mod paths;

pub use io::{load_config, read_yaml, save_config};
pub use paths::{
    config_dir, default_config_path, default_output_directory, default_recent_path, CONFIG_FILE, RECENT_FILE,
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::engine::TransportConfig;
use crate::loader::{StemLoader, DEFAULT_AUDIO_EXTENSION};
use crate::mix::{FaderConfig, MixState};
use crate::sync::VisualConfig;
use crate::types::{clamp_gain, ChannelSpec};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub audio: AudioConfig,
    /// Channel layout, in display order
    pub channels: Vec<ChannelSpec>,
    /// Stem file extension without the dot
    pub audio_extension: String,
    /// Folder holding one separation output folder per track
    pub output_directory: PathBuf,
    pub transport: TransportConfig,
    pub visual: VisualConfig,
    pub fader: FaderConfig,
    /// Mix remembered from the last session
    pub mix: MixState,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            channels: ChannelSpec::default_set(),
            audio_extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            output_directory: default_output_directory(),
            transport: TransportConfig::default(),
            visual: VisualConfig::default(),
            fader: FaderConfig::default(),
            mix: MixState::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load(path: &Path) -> Self {
        let mut config: Self = load_config(path);
        config.validate();
        config
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        save_config(self, path)
    }

    /// Repair values that would leave the player unusable
    pub fn validate(&mut self) {
        if self.channels.is_empty() {
            log::warn!("Config has no channels, using the default stem set");
            self.channels = ChannelSpec::default_set();
        }

        let mut seen = std::collections::HashSet::new();
        self.channels.retain(|spec| {
            let fresh = seen.insert(spec.id.clone());
            if !fresh {
                log::warn!("Ignoring duplicate channel {}", spec.id);
            }
            fresh
        });

        for spec in &mut self.channels {
            spec.default_gain = clamp_gain(spec.default_gain);
        }

        let ext = self.audio_extension.trim().trim_start_matches('.');
        self.audio_extension = if ext.is_empty() {
            DEFAULT_AUDIO_EXTENSION.to_string()
        } else {
            ext.to_string()
        };
    }

    /// Loader for the configured layout at the output's sample rate
    pub fn stem_loader(&self, sample_rate: u32) -> StemLoader {
        StemLoader::new(self.channels.clone(), self.audio_extension.clone(), sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mix::ChannelMix;
    use crate::types::ChannelId;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.audio_extension, "wav");
        assert_eq!(config.transport.ready_timeout_ms, 1000);
        assert!(config.output_directory.ends_with("stemdeck"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = "audio_extension: flac\ntransport:\n  seek_settle_ms: 5\n";
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.audio_extension, "flac");
        assert_eq!(config.transport.seek_settle_ms, 5);
        assert_eq!(config.transport.ready_timeout_ms, 1000);
        assert_eq!(config.channels, ChannelSpec::default_set());
    }

    #[test]
    fn test_validate_repairs_layout() {
        let mut config = PlayerConfig {
            channels: vec![
                ChannelSpec::new("vocals", "Vocals", 1.7),
                ChannelSpec::new("vocals", "Again", 0.5),
                ChannelSpec::new("keys", "Keys", 0.4),
            ],
            audio_extension: " .flac".into(),
            ..PlayerConfig::default()
        };
        config.validate();

        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].default_gain, 1.0);
        assert_eq!(config.channels[1].id, ChannelId::new("keys"));
        assert_eq!(config.audio_extension, "flac");

        config.channels.clear();
        config.audio_extension.clear();
        config.validate();
        assert_eq!(config.channels, ChannelSpec::default_set());
        assert_eq!(config.audio_extension, "wav");
    }

    #[test]
    fn test_save_and_load_with_mix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = PlayerConfig::default();
        config.mix.locked = true;
        config.mix.channels.insert(
            "bass".into(),
            ChannelMix {
                gain: 0.25,
                muted: true,
            },
        );
        config.save(&path).unwrap();

        let loaded = PlayerConfig::load(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.stem_loader(44100).sample_rate(), 44100);
    }
}
