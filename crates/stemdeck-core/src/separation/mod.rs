//! Separation job progress
//!
//! Stem separation runs as an external job that reports progress as JSON
//! lines, one event per line:
//!
//! ```text
//! {"kind":"download","downloaded":1048576,"total":83886080}
//! {"kind":"stage","name":"Separating"}
//! {"kind":"writing","stem":"vocals","percent":40}
//! {"kind":"finished","outputPath":"/home/me/Music/stemdeck/song"}
//! ```
//!
//! [`SeparationProgress`] folds those events into the status shown to the
//! user. A `finished` event carries the output folder that the loader opens
//! next.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Progress shown while the job is separating (it reports no fraction)
const PROCESSING_PERCENT: u8 = 50;

#[derive(Error, Debug)]
pub enum SeparationError {
    #[error("Invalid separation event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SeparationError>;

/// One progress event of the separation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SeparationEvent {
    /// Model download in bytes
    Download {
        downloaded: u64,
        #[serde(default)]
        total: Option<u64>,
    },
    /// A named processing stage started
    Stage { name: String },
    /// A stem file is being written
    Writing { stem: String, percent: f32 },
    /// All stems written
    Finished {
        #[serde(rename = "outputPath")]
        output_path: PathBuf,
    },
    /// The job failed
    Failed { message: String },
}

impl SeparationEvent {
    /// Parse one JSON line
    pub fn from_json_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Output folder if this is the final event
    pub fn finished_output(&self) -> Option<&PathBuf> {
        match self {
            SeparationEvent::Finished { output_path } => Some(output_path),
            _ => None,
        }
    }
}

/// Coarse job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparationStatus {
    #[default]
    Idle,
    Downloading,
    Processing,
    Writing,
    Finished,
    Error,
}

impl SeparationStatus {
    pub fn is_processing(self) -> bool {
        matches!(self, Self::Downloading | Self::Processing | Self::Writing)
    }
}

/// Accumulated state of one separation job
#[derive(Debug, Clone, Default)]
pub struct SeparationProgress {
    status: SeparationStatus,
    download_percent: u8,
    stage: Option<String>,
    stem: Option<String>,
    writing_percent: u8,
    output_path: Option<PathBuf>,
    error: Option<String>,
}

impl SeparationProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SeparationStatus {
        self.status
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn stem(&self) -> Option<&str> {
        self.stem.as_deref()
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: &SeparationEvent) {
        match event {
            SeparationEvent::Download { downloaded, total } => {
                self.status = SeparationStatus::Downloading;
                self.download_percent = match total {
                    Some(total) if *total > 0 => ((*downloaded as f64 / *total as f64) * 100.0).clamp(0.0, 100.0) as u8,
                    _ => 0,
                };
            }
            SeparationEvent::Stage { name } => {
                self.status = SeparationStatus::Processing;
                self.stage = Some(name.clone());
            }
            SeparationEvent::Writing { stem, percent } => {
                self.status = SeparationStatus::Writing;
                self.stem = Some(stem.clone());
                self.writing_percent = percent.clamp(0.0, 100.0) as u8;
            }
            SeparationEvent::Finished { output_path } => {
                self.status = SeparationStatus::Finished;
                self.output_path = Some(output_path.clone());
                self.error = None;
            }
            SeparationEvent::Failed { message } => {
                self.status = SeparationStatus::Error;
                self.error = Some(message.clone());
            }
        }
    }

    /// Progress in percent for a progress bar
    pub fn percent(&self) -> u8 {
        match self.status {
            SeparationStatus::Downloading => self.download_percent,
            SeparationStatus::Processing => PROCESSING_PERCENT,
            SeparationStatus::Writing => self.writing_percent,
            SeparationStatus::Finished => 100,
            SeparationStatus::Idle | SeparationStatus::Error => 0,
        }
    }

    /// Status line
    pub fn message(&self) -> String {
        match self.status {
            SeparationStatus::Idle => "Idle".to_string(),
            SeparationStatus::Downloading => format!("Downloading model... {}%", self.download_percent),
            SeparationStatus::Processing => self
                .stage
                .clone()
                .unwrap_or_else(|| "Processing audio...".to_string()),
            SeparationStatus::Writing => format!("Writing stems... {}%", self.writing_percent),
            SeparationStatus::Finished => "Separation complete".to_string(),
            SeparationStatus::Error => format!(
                "Separation failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
