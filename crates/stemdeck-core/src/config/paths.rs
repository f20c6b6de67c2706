//! Standard file locations

use std::path::PathBuf;

const APP_DIR: &str = "stemdeck";
pub const CONFIG_FILE: &str = "config.yaml";
pub const RECENT_FILE: &str = "recent.yaml";

/// `<config dir>/stemdeck`, e.g. `~/.config/stemdeck` on Linux
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

pub fn default_recent_path() -> PathBuf {
    config_dir().join(RECENT_FILE)
}

/// Where separation output folders live by default: `~/Music/stemdeck`
pub fn default_output_directory() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
