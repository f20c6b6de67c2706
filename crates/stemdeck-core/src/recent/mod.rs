//! Recently separated tracks
//!
//! A short most-recent-first list of input files whose stems were produced
//! before, so they can be reopened without separating again. Entries are
//! keyed by input path; adding a track that is already listed moves it to
//! the front.
//!
//! Reopening does not trust the stored output path: the folder is derived
//! again from the current output directory, and a record whose first stem
//! file is gone is dropped.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::{load_config, save_config};
use crate::loader::{expected_output_dir, resolve_channel_path, track_base_name};
use crate::types::ChannelSpec;

/// Entries kept
pub const MAX_RECENT_SESSIONS: usize = 5;

/// One separated track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSession {
    /// Original input file
    pub input_path: PathBuf,
    /// Display name
    pub name: String,
    /// Folder the stems were written to
    pub output_path: PathBuf,
    /// Unix time in milliseconds
    #[serde(default)]
    pub processed_at: u64,
}

impl RecentSession {
    pub fn new(input_path: impl Into<PathBuf>, name: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        let processed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            input_path: input_path.into(),
            name: name.into(),
            output_path: output_path.into(),
            processed_at,
        }
    }
}

/// The recent list, persisted as YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentSessions {
    entries: Vec<RecentSession>,
}

impl RecentSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing or broken file gives an empty list
    pub fn load(path: &Path) -> Self {
        let mut recent: Self = load_config(path);
        recent.entries.truncate(MAX_RECENT_SESSIONS);
        recent
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        save_config(self, path)
    }

    /// Most recent first
    pub fn entries(&self) -> &[RecentSession] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, input_path: &Path) -> Option<&RecentSession> {
        self.entries.iter().find(|e| e.input_path == input_path)
    }

    /// Put `session` in front, replacing an entry for the same input
    pub fn add(&mut self, session: RecentSession) {
        self.entries.retain(|e| e.input_path != session.input_path);
        self.entries.insert(0, session);
        self.entries.truncate(MAX_RECENT_SESSIONS);
    }

    /// Returns whether an entry was removed
    pub fn remove(&mut self, input_path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.input_path != input_path);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resolve the output folder to reopen for `input_path`.
    ///
    /// The folder is `<output_root>/<input file stem>` and must still hold
    /// the first channel's stem. On failure the record is removed and
    /// `None` is returned.
    pub fn resume(
        &mut self,
        input_path: &Path,
        output_root: &Path,
        channels: &[ChannelSpec],
        extension: &str,
    ) -> Option<PathBuf> {
        let resolved = resume_output_dir(input_path, output_root, channels, extension);
        if resolved.is_none() {
            log::warn!("Stems for {:?} are gone, forgetting it", input_path);
            self.remove(input_path);
        }
        resolved
    }
}

/// Output folder for `input_path` if its first channel's stem exists
pub fn resume_output_dir(
    input_path: &Path,
    output_root: &Path,
    channels: &[ChannelSpec],
    extension: &str,
) -> Option<PathBuf> {
    let base_name = track_base_name(input_path)?;
    let dir = expected_output_dir(output_root, input_path)?;
    let first = channels.first()?;
    let probe = resolve_channel_path(&dir, &base_name, &first.id, extension);
    probe.is_file().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> RecentSession {
        RecentSession::new(input, input, format!("/out/{}", input))
    }

    #[test]
    fn test_add_dedupes_and_caps() {
        let mut recent = RecentSessions::new();
        for name in ["a", "b", "c", "d", "e", "f"] {
            recent.add(session(name));
        }
        assert_eq!(recent.len(), MAX_RECENT_SESSIONS);
        assert_eq!(recent.entries()[0].input_path, PathBuf::from("f"));
        assert!(recent.get(Path::new("a")).is_none());

        recent.add(session("c"));
        assert_eq!(recent.len(), MAX_RECENT_SESSIONS);
        assert_eq!(recent.entries()[0].input_path, PathBuf::from("c"));
        assert_eq!(
            recent.entries().iter().filter(|e| e.input_path == Path::new("c")).count(),
            1
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut recent = RecentSessions::new();
        recent.add(session("a"));
        recent.add(session("b"));

        assert!(recent.remove(Path::new("a")));
        assert!(!recent.remove(Path::new("a")));
        assert_eq!(recent.len(), 1);

        recent.clear();
        assert!(recent.is_empty());
    }

    #[test]
    fn test_persisted_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent.yaml");

        let mut recent = RecentSessions::new();
        recent.add(session("a"));
        recent.add(session("b"));
        recent.save(&path).unwrap();

        let loaded = RecentSessions::load(&path);
        assert_eq!(loaded, recent);
        assert!(RecentSessions::load(&dir.path().join("missing.yaml")).is_empty());
    }

    #[test]
    fn test_resume_validates_first_stem() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let channels = ChannelSpec::default_set();
        let input = Path::new("/tracks/My Song.mp3");

        let mut recent = RecentSessions::new();
        recent.add(RecentSession::new(input, "My Song.mp3", root.join("My Song")));

        let out = root.join("My Song");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("My Song_vocals.wav"), b"").unwrap();

        assert_eq!(recent.resume(input, root, &channels, "wav"), Some(out.clone()));
        assert_eq!(recent.len(), 1);

        std::fs::remove_file(out.join("My Song_vocals.wav")).unwrap();
        assert_eq!(recent.resume(input, root, &channels, "wav"), None);
        assert!(recent.is_empty());
    }
}
