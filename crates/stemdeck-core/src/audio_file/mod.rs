//! Stem audio file handling
//!
//! Each separated stem is its own file (`{track}_{stem}.wav` by default).
//! This module probes a stem for its duration and decodes it into a stereo
//! buffer at the output sample rate, using Symphonia so any container the
//! separation job writes (WAV, FLAC, MP3, OGG) can be played back.

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::types::{Sample, StereoBuffer, StereoSample};

/// Audio file errors
#[derive(Error, Debug)]
pub enum AudioFileError {
    /// File could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container or codec not recognised
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Stream header lacks a sample rate
    #[error("Unknown sample rate")]
    UnknownSampleRate,

    /// Decoding failed before any audio was produced
    #[error("Decode failed: {0}")]
    Decode(String),

    /// File decoded but contains no frames
    #[error("File contains no audio")]
    Empty,
}

/// A fully decoded stem, resampled to the output rate
#[derive(Debug, Clone)]
pub struct DecodedStem {
    /// Stereo frames at `sample_rate`
    pub buffer: StereoBuffer,
    /// Rate of `buffer` (the output rate requested at decode time)
    pub sample_rate: u32,
    /// Rate stored in the file
    pub source_sample_rate: u32,
}

impl DecodedStem {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer.len() as f64 / self.sample_rate as f64
    }
}

/// Open a file and probe its container
fn open_format(path: &Path) -> Result<Box<dyn FormatReader>, AudioFileError> {
    let file = File::open(path).map_err(|source| AudioFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioFileError::UnsupportedFormat(e.to_string()))?;

    Ok(probed.format)
}

/// Read the duration from the stream header without decoding.
///
/// Returns `Ok(None)` when the container does not declare a frame count
/// (some MP3/OGG streams); the duration is then known only after decoding.
pub fn probe_duration(path: &Path) -> Result<Option<f64>, AudioFileError> {
    let format = open_format(path)?;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioFileError::UnsupportedFormat("No audio track found".to_string()))?;

    let params = &track.codec_params;
    Ok(match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    })
}

/// Decode a stem file to stereo at `target_sample_rate`
pub fn decode_stem(path: &Path, target_sample_rate: u32) -> Result<DecodedStem, AudioFileError> {
    let mut format = open_format(path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioFileError::UnsupportedFormat("No audio track found".to_string()))?;

    let track_id = track.id;
    let source_sample_rate = track.codec_params.sample_rate.ok_or(AudioFileError::UnknownSampleRate)?;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioFileError::UnsupportedFormat(e.to_string()))?;

    let mut interleaved: Vec<Sample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut sample_buf_frames = 0u64;
    let mut first_error: Option<String> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                log::warn!("decode_stem: error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame: skip it, keep the rest of the stem
                log::warn!("decode_stem: skipping bad packet in {:?}: {}", path, e);
                first_error.get_or_insert_with(|| e.to_string());
                continue;
            }
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
                break;
            }
        };

        let capacity = decoded.capacity() as u64;
        if sample_buf.is_none() || capacity > sample_buf_frames {
            sample_buf = Some(SampleBuffer::new(capacity, *decoded.spec()));
            sample_buf_frames = capacity;
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if interleaved.is_empty() {
        return Err(match first_error {
            Some(msg) => AudioFileError::Decode(msg),
            None => AudioFileError::Empty,
        });
    }

    let buffer = StereoBuffer::from_interleaved(&interleaved, channels);
    let buffer = if source_sample_rate != target_sample_rate {
        log::debug!(
            "decode_stem: resampling {:?} {} Hz -> {} Hz",
            path,
            source_sample_rate,
            target_sample_rate
        );
        resample_linear(&buffer, source_sample_rate, target_sample_rate)
    } else {
        buffer
    };

    Ok(DecodedStem {
        buffer,
        sample_rate: target_sample_rate,
        source_sample_rate,
    })
}

/// Linear interpolation resampling
///
/// Adequate for playback preview; stems are already band-limited by the
/// separation model.
pub fn resample_linear(input: &StereoBuffer, from_rate: u32, to_rate: u32) -> StereoBuffer {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 || input.is_empty() {
        return input.clone();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio) as usize;
    let mut output = StereoBuffer::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as Sample;

        let sample = if idx + 1 < input.len() {
            input[idx].lerp(&input[idx + 1], frac)
        } else if idx < input.len() {
            input[idx]
        } else {
            StereoSample::silence()
        };
        output.push(sample);
    }

    output
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Write a stereo 16-bit WAV fixture with a constant value on both sides
    pub(crate) fn write_wav(path: &Path, sample_rate: u32, frames: usize, value: i16) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(value).unwrap();
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_probe_duration_reads_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_vocals.wav");
        write_wav(&path, 8000, 16000, 1000);

        let duration = probe_duration(&path).unwrap().unwrap();
        assert!((duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_stem_same_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_drums.wav");
        write_wav(&path, 8000, 4000, 16384);

        let stem = decode_stem(&path, 8000).unwrap();
        assert_eq!(stem.buffer.len(), 4000);
        assert_eq!(stem.source_sample_rate, 8000);
        assert!((stem.duration_seconds() - 0.5).abs() < 1e-9);
        assert!((stem.buffer[10].left - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_decode_stem_resamples_to_output_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_bass.wav");
        write_wav(&path, 8000, 8000, 1000);

        let stem = decode_stem(&path, 16000).unwrap();
        assert_eq!(stem.sample_rate, 16000);
        assert_eq!(stem.buffer.len(), 16000);
        assert!((stem.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_stem(Path::new("/nonexistent/song_other.wav"), 48000).unwrap_err();
        assert!(matches!(err, AudioFileError::Open { .. }));
    }

    #[test]
    fn test_decode_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_other.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(decode_stem(&path, 48000).is_err());
    }

    #[test]
    fn test_resample_linear_halves_length() {
        let input = StereoBuffer::from_vec((0..100).map(|i| StereoSample::mono(i as f32)).collect());
        let output = resample_linear(&input, 48000, 24000);
        assert_eq!(output.len(), 50);
        assert_eq!(output[10], StereoSample::mono(20.0));
    }
}
