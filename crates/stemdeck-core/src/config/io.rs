//! YAML load/save for any serde type

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and parse a YAML file, failing on any error
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

/// Load a config file, falling back to defaults.
///
/// A missing file yields `T::default()` silently; an unreadable or invalid
/// one is logged and also yields defaults, so a broken file never keeps the
/// player from starting.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return T::default();
    }

    match read_yaml(path) {
        Ok(config) => {
            log::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("{:#}, using defaults", e);
            T::default()
        }
    }
}

/// Write a config file, creating parent directories.
///
/// The YAML is written next to the target and renamed over it, so a crash
/// mid-write leaves the previous file intact.
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;

    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).with_context(|| format!("Failed to write {:?}", tmp))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {:?}", path))?;

    log::debug!("Saved {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        level: u32,
        label: String,
    }

    #[test]
    fn test_missing_file_gives_default() {
        let loaded: Sample = load_config(Path::new("/nonexistent/stemdeck/config.yaml"));
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_invalid_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "level: [not, a, number").unwrap();

        let loaded: Sample = load_config(&path);
        assert_eq!(loaded, Sample::default());
        assert!(read_yaml::<Sample>(&path).is_err());
    }

    #[test]
    fn test_save_creates_parents_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.yaml");
        let config = Sample {
            level: 7,
            label: "stems".into(),
        };

        save_config(&config, &path).unwrap();
        assert!(!path.with_extension("yaml.tmp").exists());

        let loaded: Sample = load_config(&path);
        assert_eq!(loaded, config);
    }
}
