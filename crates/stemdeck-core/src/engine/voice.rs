//! StemVoice - one decoded stem as an autonomous playback source
//!
//! The control side (transport, mix controller) and the render side (the
//! output mixer) share a voice through lock-free atomics:
//!
//! - `playing`, `gain`, `muted`, `released` are written by the control side
//!   and read on every render block.
//! - `cursor` is written only by the render thread while the voice is
//!   attached to an output. A seek from the control side is posted in
//!   `pending_seek` and picked up at the next block boundary, which is when
//!   the voice becomes ready again.
//! - A detached voice (no output running) applies seeks directly.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use basedrop::Shared;

use super::error::PlaybackError;
use super::gc::gc_handle;
use super::handle::ChannelHandle;
use crate::types::{clamp_gain, StereoBuffer, StereoSample};

/// Marker for "no seek pending"
const NO_SEEK: u64 = u64::MAX;

/// Lock-free state shared between control and render threads
#[derive(Debug)]
pub struct VoiceAtomics {
    /// Playhead in frames
    cursor: AtomicU64,
    /// Requested playhead in frames, `NO_SEEK` when none
    pending_seek: AtomicU64,
    playing: AtomicBool,
    /// Set by the render thread when the playhead reached the last frame
    ended: AtomicBool,
    /// Gain as f32 bits
    gain: AtomicU32,
    muted: AtomicBool,
    released: AtomicBool,
    attached: AtomicBool,
}

impl VoiceAtomics {
    fn new() -> Self {
        Self {
            cursor: AtomicU64::new(0),
            pending_seek: AtomicU64::new(NO_SEEK),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            gain: AtomicU32::new(1.0f32.to_bits()),
            muted: AtomicBool::new(false),
            released: AtomicBool::new(false),
            attached: AtomicBool::new(false),
        }
    }

    #[inline]
    fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }
}

struct VoiceInner {
    buffer: StereoBuffer,
    sample_rate: u32,
    atomics: VoiceAtomics,
}

/// A decoded stem that plays on its own once attached to an output.
///
/// Clones share the same buffer and state. The buffer lives in a
/// `basedrop::Shared`, so the last clone can be dropped on the render
/// thread without freeing memory there.
#[derive(Clone)]
pub struct StemVoice {
    inner: Shared<VoiceInner>,
}

impl std::fmt::Debug for StemVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemVoice")
            .field("frames", &self.inner.buffer.len())
            .field("sample_rate", &self.inner.sample_rate)
            .field("atomics", &self.inner.atomics)
            .finish()
    }
}

impl StemVoice {
    /// Wrap a decoded buffer
    pub fn new(buffer: StereoBuffer, sample_rate: u32) -> Self {
        let inner = VoiceInner {
            buffer,
            sample_rate: sample_rate.max(1),
            atomics: VoiceAtomics::new(),
        };
        Self {
            inner: Shared::new(&gc_handle(), inner),
        }
    }

    /// Length in frames
    pub fn len_frames(&self) -> u64 {
        self.inner.buffer.len() as u64
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.inner.atomics.playing.load(Ordering::Acquire)
    }

    /// True after the playhead reached the end on its own
    pub fn has_ended(&self) -> bool {
        self.inner.atomics.ended.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.inner.atomics.released.load(Ordering::Acquire)
    }

    pub fn gain(&self) -> f32 {
        self.inner.atomics.gain()
    }

    pub fn is_muted(&self) -> bool {
        self.inner.atomics.muted.load(Ordering::Relaxed)
    }

    /// Whether an output currently renders this voice
    pub fn is_attached(&self) -> bool {
        self.inner.atomics.attached.load(Ordering::Acquire)
    }

    /// Called by the output when it takes or gives up the voice
    pub(crate) fn set_attached(&self, attached: bool) {
        let atomics = &self.inner.atomics;
        if !attached {
            // Hand the cursor back to the control side with any pending seek applied
            let pending = atomics.pending_seek.swap(NO_SEEK, Ordering::AcqRel);
            if pending != NO_SEEK {
                atomics.cursor.store(pending, Ordering::Release);
            }
        }
        atomics.attached.store(attached, Ordering::Release);
    }

    fn seconds_to_frame(&self, seconds: f64) -> u64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let frame = (seconds * self.inner.sample_rate as f64).round() as u64;
        frame.min(self.len_frames())
    }

    fn frame_to_seconds(&self, frame: u64) -> f64 {
        frame as f64 / self.inner.sample_rate as f64
    }

    /// Mix this voice into `out`, advancing the playhead.
    ///
    /// Runs on the render thread: no allocation, no locks, no logging.
    /// A muted voice advances without contributing. Returns false once the
    /// voice has been released and should be dropped by the caller.
    pub fn render_add(&self, out: &mut [StereoSample]) -> bool {
        let atomics = &self.inner.atomics;
        if atomics.released.load(Ordering::Acquire) {
            return false;
        }

        let pending = atomics.pending_seek.swap(NO_SEEK, Ordering::AcqRel);
        let mut cursor = if pending != NO_SEEK {
            atomics.cursor.store(pending, Ordering::Release);
            pending
        } else {
            atomics.cursor.load(Ordering::Acquire)
        };

        if !atomics.playing.load(Ordering::Acquire) {
            return true;
        }

        let samples = self.inner.buffer.as_slice();
        let len = samples.len() as u64;
        let gain = if atomics.muted.load(Ordering::Relaxed) {
            0.0
        } else {
            atomics.gain()
        };

        let available = len.saturating_sub(cursor) as usize;
        let frames = out.len().min(available);
        let start = cursor as usize;
        if gain > 0.0 {
            for (dst, src) in out[..frames].iter_mut().zip(&samples[start..start + frames]) {
                *dst += *src * gain;
            }
        }
        cursor += frames as u64;
        atomics.cursor.store(cursor, Ordering::Release);

        if cursor >= len {
            atomics.playing.store(false, Ordering::Release);
            atomics.ended.store(true, Ordering::Release);
        }
        true
    }
}

impl ChannelHandle for StemVoice {
    fn duration(&self) -> Option<f64> {
        Some(self.frame_to_seconds(self.len_frames()))
    }

    fn seek(&self, seconds: f64) {
        let frame = self.seconds_to_frame(seconds);
        let atomics = &self.inner.atomics;
        atomics.ended.store(false, Ordering::Release);
        if atomics.attached.load(Ordering::Acquire) {
            atomics.pending_seek.store(frame, Ordering::Release);
        } else {
            atomics.cursor.store(frame, Ordering::Release);
        }
    }

    fn position(&self) -> f64 {
        let atomics = &self.inner.atomics;
        let pending = atomics.pending_seek.load(Ordering::Acquire);
        let frame = if pending != NO_SEEK {
            pending
        } else {
            atomics.cursor.load(Ordering::Acquire)
        };
        self.frame_to_seconds(frame)
    }

    fn is_ready(&self) -> bool {
        !self.is_released() && self.inner.atomics.pending_seek.load(Ordering::Acquire) == NO_SEEK
    }

    fn play(&self) -> Result<(), PlaybackError> {
        if self.is_released() {
            return Err(PlaybackError::Released);
        }
        if self.inner.buffer.is_empty() {
            return Err(PlaybackError::EmptyBuffer);
        }
        self.inner.atomics.ended.store(false, Ordering::Release);
        self.inner.atomics.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn pause(&self) {
        self.inner.atomics.playing.store(false, Ordering::Release);
    }

    fn set_volume(&self, gain: f32) {
        self.inner
            .atomics
            .gain
            .store(clamp_gain(gain).to_bits(), Ordering::Relaxed);
    }

    fn set_muted(&self, muted: bool) {
        self.inner.atomics.muted.store(muted, Ordering::Relaxed);
    }

    fn release(&self) {
        let atomics = &self.inner.atomics;
        atomics.playing.store(false, Ordering::Release);
        atomics.released.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(frames: usize, value: f32) -> StemVoice {
        StemVoice::new(StereoBuffer::from_vec(vec![StereoSample::mono(value); frames]), 100)
    }

    #[test]
    fn test_detached_seek_applies_immediately() {
        let v = voice(1000, 0.5);
        v.seek(2.5);
        assert!(v.is_ready());
        assert_eq!(v.position(), 2.5);

        // Clamped to the buffer end
        v.seek(99.0);
        assert_eq!(v.position(), 10.0);
        v.seek(-1.0);
        assert_eq!(v.position(), 0.0);
    }

    #[test]
    fn test_attached_seek_is_pending_until_rendered() {
        let v = voice(1000, 0.5);
        v.set_attached(true);
        v.seek(3.0);
        assert!(!v.is_ready());
        assert_eq!(v.position(), 3.0);

        let mut out = vec![StereoSample::silence(); 10];
        assert!(v.render_add(&mut out));
        assert!(v.is_ready());
        // Not playing: nothing rendered, cursor at the requested frame
        assert_eq!(out[0], StereoSample::silence());
        assert_eq!(v.position(), 3.0);
    }

    #[test]
    fn test_render_applies_gain_and_advances() {
        let v = voice(1000, 0.5);
        v.set_attached(true);
        v.set_volume(0.5);
        v.play().unwrap();

        let mut out = vec![StereoSample::silence(); 50];
        v.render_add(&mut out);
        assert_eq!(out[0], StereoSample::mono(0.25));
        assert_eq!(v.position(), 0.5);
    }

    #[test]
    fn test_muted_voice_advances_silently() {
        let v = voice(1000, 0.5);
        v.set_attached(true);
        v.set_muted(true);
        v.play().unwrap();

        let mut out = vec![StereoSample::silence(); 100];
        v.render_add(&mut out);
        assert_eq!(out[99], StereoSample::silence());
        assert_eq!(v.position(), 1.0);
        assert!(v.is_muted());
        assert_eq!(v.gain(), 1.0);
    }

    #[test]
    fn test_voice_stops_at_end() {
        let v = voice(30, 1.0);
        v.set_attached(true);
        v.play().unwrap();

        let mut out = vec![StereoSample::silence(); 64];
        v.render_add(&mut out);
        assert_eq!(out[29], StereoSample::mono(1.0));
        assert_eq!(out[30], StereoSample::silence());
        assert!(!v.is_playing());
        assert!(v.has_ended());
        assert_eq!(v.position(), 0.3);
    }

    #[test]
    fn test_released_voice_refuses_play() {
        let v = voice(100, 1.0);
        v.release();
        assert_eq!(v.play(), Err(PlaybackError::Released));
        let mut out = vec![StereoSample::silence(); 4];
        assert!(!v.render_add(&mut out));
    }

    #[test]
    fn test_empty_voice_refuses_play() {
        let v = StemVoice::new(StereoBuffer::default(), 48000);
        assert_eq!(v.play(), Err(PlaybackError::EmptyBuffer));
        assert_eq!(v.duration(), Some(0.0));
    }

    #[test]
    fn test_detach_keeps_pending_seek() {
        let v = voice(1000, 1.0);
        v.set_attached(true);
        v.seek(4.0);
        v.set_attached(false);
        assert!(v.is_ready());
        assert_eq!(v.position(), 4.0);
    }
}
