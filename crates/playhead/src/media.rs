//! Playback state machine types and decoded-frame handles.
//!
//! Positions and durations cross the public API in integer milliseconds;
//! internally everything is `f64` seconds.

use std::fmt;

#[cfg(feature = "ffmpeg")]
use std::sync::Arc;

/// The user-facing playback state.
///
/// Controls whether the worker loops advance or park on the wait gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Not playing. Initial state; also entered at end of media.
    #[default]
    Stopped,
    /// Worker loops are advancing and frames are being emitted.
    Playing,
    /// Worker loops are parked; position is retained.
    Paused,
}

/// The codec library's view of the current source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaStatus {
    /// No source set, or the session has been torn down.
    #[default]
    NoMedia,
    /// The source opened successfully and streams are known.
    Loaded,
    /// The demuxer reached end of file and both queues drained.
    EndOfMedia,
    /// The source could not be opened or decoded.
    Invalid,
}

/// Errors surfaced through [`crate::PlayerEvent::ErrorOccurred`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The source cannot be opened, no codec was found, or an
    /// unrecoverable decode failure occurred. The message is derived from
    /// the codec library's error string.
    Resource(String),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::Resource(msg) => write!(f, "resource error: {msg}"),
        }
    }
}

impl std::error::Error for PlayerError {}

/// A decoded video frame.
///
/// Cheap to clone; the pixel data is shared. The core does no conversion or
/// rendering — consumers take the raw decoded frame downstream.
#[derive(Clone)]
pub struct VideoFrame {
    pts: f64,
    width: u32,
    height: u32,
    #[cfg(feature = "ffmpeg")]
    raw: Arc<ffmpeg_next::util::frame::Video>,
}

impl VideoFrame {
    #[cfg(feature = "ffmpeg")]
    pub(crate) fn from_raw(pts: f64, raw: ffmpeg_next::util::frame::Video) -> Self {
        Self {
            pts,
            width: raw.width(),
            height: raw.height(),
            raw: Arc::new(raw),
        }
    }

    #[cfg(not(feature = "ffmpeg"))]
    pub(crate) fn synthetic(pts: f64, width: u32, height: u32) -> Self {
        Self { pts, width, height }
    }

    /// Presentation timestamp in seconds from stream start.
    pub fn pts(&self) -> f64 {
        self.pts
    }

    /// Frame dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The decoded FFmpeg frame.
    #[cfg(feature = "ffmpeg")]
    pub fn raw(&self) -> &ffmpeg_next::util::frame::Video {
        &self.raw
    }
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrame")
            .field("pts", &self.pts)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

// SAFETY: the frame buffer is never written after decode; FFmpeg frame
// buffers are reference counted and safe to release from any thread.
#[cfg(feature = "ffmpeg")]
unsafe impl Send for VideoFrame {}
#[cfg(feature = "ffmpeg")]
unsafe impl Sync for VideoFrame {}

/// A decoded audio frame.
#[derive(Clone)]
pub struct AudioFrame {
    pts: f64,
    sample_rate: u32,
    channels: u16,
    samples: usize,
    #[cfg(feature = "ffmpeg")]
    raw: Arc<ffmpeg_next::util::frame::Audio>,
}

impl AudioFrame {
    #[cfg(feature = "ffmpeg")]
    pub(crate) fn from_raw(pts: f64, raw: ffmpeg_next::util::frame::Audio) -> Self {
        Self {
            pts,
            sample_rate: raw.rate(),
            channels: raw.channels(),
            samples: raw.samples(),
            raw: Arc::new(raw),
        }
    }

    #[cfg(not(feature = "ffmpeg"))]
    pub(crate) fn synthetic(pts: f64, sample_rate: u32, channels: u16, samples: usize) -> Self {
        Self {
            pts,
            sample_rate,
            channels,
            samples,
        }
    }

    /// Presentation timestamp in seconds from stream start.
    pub fn pts(&self) -> f64 {
        self.pts
    }

    /// Sample rate the frame should be played at.
    ///
    /// At non-unit playback speed this is the container rate scaled by the
    /// speed factor — a pitch-shifting resample, not a time stretch. Sinks
    /// that want pitch-preserving speedup need their own time stretcher.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples per channel in this frame.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Duration of this frame at its nominal rate, in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples as f64 / self.sample_rate as f64
    }

    /// The decoded FFmpeg frame.
    #[cfg(feature = "ffmpeg")]
    pub fn raw(&self) -> &ffmpeg_next::util::frame::Audio {
        &self.raw
    }

    pub(crate) fn apply_speed(&mut self, speed: f64) {
        self.sample_rate = (self.sample_rate as f64 * speed).round() as u32;
    }
}

impl fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioFrame")
            .field("pts", &self.pts)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("samples", &self.samples)
            .finish()
    }
}

// SAFETY: same reasoning as VideoFrame — immutable after decode, refcounted
// buffers.
#[cfg(feature = "ffmpeg")]
unsafe impl Send for AudioFrame {}
#[cfg(feature = "ffmpeg")]
unsafe impl Sync for AudioFrame {}
