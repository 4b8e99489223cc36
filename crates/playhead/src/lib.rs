//! playhead: playback control core for FFmpeg-backed media.
//!
//! This crate is the concurrent heart of a media player: it turns a source
//! URL into an ordered stream of decoded video and audio frames, delivered
//! as typed events, while honoring play/pause/stop/seek/speed control with
//! clean cancellation on teardown and seek. It contains:
//!
//! - The [`Player`] controller and its state machine
//! - The demux / packet queue / decode pipeline
//! - A/V pacing against the audio clock and wall clock
//! - Deferred control events that replay at safe quiescence points
//!
//! Rendering and audio output are **not** here: consumers subscribe with
//! [`Player::events`] and present frames downstream. Real demuxing and
//! decoding require the `ffmpeg` cargo feature; without it a synthetic
//! placeholder source keeps the whole pipeline (and the test suite)
//! running with no system FFmpeg.

mod demux;
mod events;
#[cfg(feature = "ffmpeg")]
mod io;
mod media;
mod player;
mod queue;

pub use events::PlayerEvent;
#[cfg(feature = "ffmpeg")]
pub use io::MediaIo;
pub use media::{AudioFrame, MediaStatus, PlayerError, State, VideoFrame};
pub use player::{Player, PlayerConfig};
