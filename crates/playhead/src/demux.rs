//! Demuxer adapter: a thin wrapper over the codec library.
//!
//! Two implementations share one surface, switched by the `ffmpeg` cargo
//! feature:
//!
//! - `ffmpeg_impl` wraps `ffmpeg-next`: real container demuxing, packet
//!   reads, keyframe seeking, and per-stream decoders.
//! - `placeholder_impl` synthesizes a timed video+audio source so the whole
//!   pipeline runs without system FFmpeg. Keyframes fall on whole seconds,
//!   EOF and the abort latch behave like the real demuxer's.
//!
//! The adapter is not internally concurrent: only the demux worker calls
//! `read`/`seek`, the loader calls `load`/`unload`, and the controller may
//! call `abort` at any time.

use crate::media::PlayerError;

#[cfg(feature = "ffmpeg")]
type PacketData = ffmpeg_next::codec::packet::Packet;
#[cfg(not(feature = "ffmpeg"))]
type PacketData = placeholder_impl::SimPacket;

/// One compressed packet, routed by stream index.
///
/// `generation` is the demuxer's seek generation at read time; a player
/// worker flushes its decoder when the generation changes under it.
pub(crate) struct Packet {
    stream_index: usize,
    pts: f64,
    size: usize,
    generation: u64,
    data: PacketData,
}

impl Packet {
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Presentation timestamp in seconds.
    pub fn pts(&self) -> f64 {
        self.pts
    }

    /// Payload size in bytes, for queue accounting.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn test_packet(stream_index: usize, pts: f64, size: usize) -> Self {
        Self {
            stream_index,
            pts,
            size,
            generation: 0,
            #[cfg(feature = "ffmpeg")]
            data: ffmpeg_next::codec::packet::Packet::empty(),
            #[cfg(not(feature = "ffmpeg"))]
            data: placeholder_impl::SimPacket::video(),
        }
    }
}

// SAFETY: a packet is owned by exactly one thread at a time (demux worker,
// then queue, then player worker); the underlying buffer is never shared.
#[cfg(feature = "ffmpeg")]
unsafe impl Send for Packet {}

#[cfg(feature = "ffmpeg")]
mod ffmpeg_impl {
    use std::ffi::c_void;
    use std::os::raw::c_int;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;

    use ffmpeg_next as ffmpeg;
    use ffmpeg_next::ffi;
    use parking_lot::Mutex;

    use super::{Packet, PlayerError};
    use crate::io::{AvioInput, MediaIo};
    use crate::media::{AudioFrame, VideoFrame};

    fn ts_to_secs(ts: i64, time_base: (i32, i32)) -> f64 {
        if time_base.1 == 0 {
            return 0.0;
        }
        ts as f64 * time_base.0 as f64 / time_base.1 as f64
    }

    unsafe extern "C" fn interrupt_cb(opaque: *mut c_void) -> c_int {
        let aborted = &*(opaque as *const AtomicBool);
        aborted.load(Ordering::Acquire) as c_int
    }

    #[derive(Default)]
    struct Inner {
        input: Option<ffmpeg::format::context::Input>,
        /// Keeps the custom AVIO context (and its Rust stream) alive while
        /// the input uses it. Dropped after the input is closed.
        avio: Option<AvioInput>,
        video_stream: Option<usize>,
        audio_stream: Option<usize>,
        video_time_base: (i32, i32),
        audio_time_base: (i32, i32),
        duration: f64,
        frame_rate: f64,
        seekable: bool,
    }

    /// FFmpeg-backed demuxer. `read` blocks inside `av_read_frame`; the
    /// abort latch breaks it via the format context's interrupt callback.
    pub(crate) struct Demuxer {
        inner: Mutex<Inner>,
        interrupted: Arc<AtomicBool>,
        eof: AtomicBool,
        generation: AtomicU64,
    }

    // SAFETY: the raw AVFormatContext is only dereferenced under the inner
    // mutex, so access is serialized; the interrupt flag is atomic.
    unsafe impl Send for Demuxer {}
    unsafe impl Sync for Demuxer {}

    impl Demuxer {
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(Inner::default()),
                interrupted: Arc::new(AtomicBool::new(false)),
                eof: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }
        }

        /// Opens a URL or file path.
        pub fn load(&self, url: &str) -> Result<(), PlayerError> {
            ffmpeg::init()
                .map_err(|e| PlayerError::Resource(format!("ffmpeg init failed: {e}")))?;
            let mut input = ffmpeg::format::input(&url)
                .map_err(|e| PlayerError::Resource(format!("failed to open {url}: {e}")))?;
            self.install_interrupt(&mut input);
            self.finish_load(input, None);
            Ok(())
        }

        /// Opens a caller-supplied byte stream through a custom AVIO
        /// context.
        pub fn load_reader(&self, reader: Box<dyn MediaIo>) -> Result<(), PlayerError> {
            ffmpeg::init()
                .map_err(|e| PlayerError::Resource(format!("ffmpeg init failed: {e}")))?;
            let avio = AvioInput::open(reader, Arc::clone(&self.interrupted))?;
            // SAFETY: AvioInput::open returns a fully opened input context
            // (avformat_open_input + find_stream_info succeeded) that we
            // own until unload.
            let mut input = unsafe { ffmpeg::format::context::Input::wrap(avio.format_ctx()) };
            self.install_interrupt(&mut input);
            self.finish_load(input, Some(avio));
            Ok(())
        }

        fn install_interrupt(&self, input: &mut ffmpeg::format::context::Input) {
            unsafe {
                let ctx = input.as_mut_ptr();
                (*ctx).interrupt_callback = ffi::AVIOInterruptCB {
                    callback: Some(interrupt_cb),
                    opaque: Arc::as_ptr(&self.interrupted) as *mut c_void,
                };
            }
        }

        fn finish_load(&self, input: ffmpeg::format::context::Input, avio: Option<AvioInput>) {
            let video = input.streams().best(ffmpeg::media::Type::Video).map(|s| {
                let rate = s.avg_frame_rate();
                let fps = rate.0 as f64 / rate.1.max(1) as f64;
                (s.index(), (s.time_base().0, s.time_base().1), fps)
            });
            let audio = input
                .streams()
                .best(ffmpeg::media::Type::Audio)
                .map(|s| (s.index(), (s.time_base().0, s.time_base().1)));

            let duration = if input.duration() > 0 {
                input.duration() as f64 / f64::from(ffi::AV_TIME_BASE)
            } else {
                0.0
            };
            let seekable = unsafe {
                let pb = (*input.as_ptr()).pb;
                !pb.is_null() && (*pb).seekable != 0
            };

            let mut inner = self.inner.lock();
            inner.video_stream = video.map(|(i, _, _)| i);
            inner.video_time_base = video.map(|(_, tb, _)| tb).unwrap_or((0, 1));
            inner.frame_rate = video
                .map(|(_, _, fps)| if fps.is_finite() { fps } else { 0.0 })
                .unwrap_or(0.0);
            inner.audio_stream = audio.map(|(i, _)| i);
            inner.audio_time_base = audio.map(|(_, tb)| tb).unwrap_or((0, 1));
            inner.duration = duration;
            inner.seekable = seekable;
            inner.input = Some(input);
            inner.avio = avio;
            self.eof.store(false, Ordering::Release);
        }

        pub fn unload(&self) {
            let mut inner = self.inner.lock();
            // Close the input before releasing the AVIO context it reads
            // through.
            inner.input = None;
            inner.avio = None;
            inner.video_stream = None;
            inner.audio_stream = None;
            self.eof.store(false, Ordering::Release);
        }

        /// Latches abort; any in-flight `av_read_frame` returns early via
        /// the interrupt callback.
        pub fn abort(&self) {
            self.interrupted.store(true, Ordering::Release);
        }

        /// Releases the abort latch (used when reloading).
        pub fn clear_abort(&self) {
            self.interrupted.store(false, Ordering::Release);
        }

        /// Blocking read of the next packet in container order. Returns
        /// `None` on EOF or abort; transient failures are logged.
        pub fn read(&self) -> Option<Packet> {
            if self.interrupted.load(Ordering::Acquire) {
                return None;
            }
            let mut inner = self.inner.lock();
            let video_stream = inner.video_stream;
            let video_tb = inner.video_time_base;
            let audio_tb = inner.audio_time_base;
            let input = inner.input.as_mut()?;

            let mut packet = ffmpeg::Packet::empty();
            match packet.read(input) {
                Ok(()) => {}
                Err(ffmpeg::Error::Eof) => {
                    self.eof.store(true, Ordering::Release);
                    return None;
                }
                Err(e) => {
                    if !self.interrupted.load(Ordering::Acquire) {
                        tracing::warn!("packet read failed: {e}");
                    }
                    return None;
                }
            }

            let stream_index = packet.stream();
            let time_base = if Some(stream_index) == video_stream {
                video_tb
            } else {
                audio_tb
            };
            let pts = packet
                .pts()
                .or(packet.dts())
                .map(|ts| ts_to_secs(ts, time_base))
                .unwrap_or(0.0);
            Some(Packet {
                stream_index,
                pts,
                size: packet.size(),
                generation: self.generation.load(Ordering::Acquire),
                data: packet,
            })
        }

        /// Seeks to the nearest keyframe at or before `position` seconds
        /// and bumps the packet generation so decoders flush.
        pub fn seek(&self, position: f64) -> Result<(), PlayerError> {
            let mut inner = self.inner.lock();
            let input = inner
                .input
                .as_mut()
                .ok_or_else(|| PlayerError::Resource("no media loaded".into()))?;
            let ts = (position * f64::from(ffi::AV_TIME_BASE)) as i64;
            input
                .seek(ts, ..=ts)
                .map_err(|e| PlayerError::Resource(format!("seek failed: {e}")))?;
            self.eof.store(false, Ordering::Release);
            self.generation.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }

        pub fn video_stream(&self) -> Option<usize> {
            self.inner.lock().video_stream
        }

        pub fn audio_stream(&self) -> Option<usize> {
            self.inner.lock().audio_stream
        }

        pub fn duration(&self) -> f64 {
            self.inner.lock().duration
        }

        pub fn frame_rate(&self) -> f64 {
            self.inner.lock().frame_rate
        }

        pub fn seekable(&self) -> bool {
            self.inner.lock().seekable
        }

        pub fn eof(&self) -> bool {
            self.eof.load(Ordering::Acquire)
        }

        pub fn video_decoder(&self) -> Result<VideoDecoder, PlayerError> {
            let inner = self.inner.lock();
            let input = inner
                .input
                .as_ref()
                .ok_or_else(|| PlayerError::Resource("no media loaded".into()))?;
            let index = inner
                .video_stream
                .ok_or_else(|| PlayerError::Resource("no video stream".into()))?;
            let stream = input
                .streams()
                .nth(index)
                .ok_or_else(|| PlayerError::Resource("video stream vanished".into()))?;
            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| PlayerError::Resource(format!("video codec context: {e}")))?;
            let decoder = context
                .decoder()
                .video()
                .map_err(|e| PlayerError::Resource(format!("no video decoder: {e}")))?;
            Ok(VideoDecoder {
                decoder,
                time_base: inner.video_time_base,
            })
        }

        pub fn audio_decoder(&self) -> Result<AudioDecoder, PlayerError> {
            let inner = self.inner.lock();
            let input = inner
                .input
                .as_ref()
                .ok_or_else(|| PlayerError::Resource("no media loaded".into()))?;
            let index = inner
                .audio_stream
                .ok_or_else(|| PlayerError::Resource("no audio stream".into()))?;
            let stream = input
                .streams()
                .nth(index)
                .ok_or_else(|| PlayerError::Resource("audio stream vanished".into()))?;
            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| PlayerError::Resource(format!("audio codec context: {e}")))?;
            let decoder = context
                .decoder()
                .audio()
                .map_err(|e| PlayerError::Resource(format!("no audio decoder: {e}")))?;
            Ok(AudioDecoder {
                decoder,
                time_base: inner.audio_time_base,
            })
        }
    }

    /// Decodes video packets for one stream. Owned by the video worker.
    pub(crate) struct VideoDecoder {
        decoder: ffmpeg::decoder::Video,
        time_base: (i32, i32),
    }

    // SAFETY: only the video worker thread touches the codec context.
    unsafe impl Send for VideoDecoder {}

    impl VideoDecoder {
        pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>, PlayerError> {
            self.decoder
                .send_packet(&packet.data)
                .map_err(|e| PlayerError::Resource(format!("video decode: {e}")))?;
            let mut frames = Vec::new();
            loop {
                let mut decoded = ffmpeg::util::frame::Video::empty();
                match self.decoder.receive_frame(&mut decoded) {
                    Ok(()) => {
                        let pts = decoded
                            .pts()
                            .map(|ts| ts_to_secs(ts, self.time_base))
                            .unwrap_or_else(|| packet.pts());
                        frames.push(VideoFrame::from_raw(pts, decoded));
                    }
                    Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                    Err(ffmpeg::Error::Eof) => break,
                    Err(e) => {
                        return Err(PlayerError::Resource(format!("video decode: {e}")));
                    }
                }
            }
            Ok(frames)
        }

        pub fn flush(&mut self) {
            self.decoder.flush();
        }
    }

    /// Decodes audio packets for one stream. Owned by the audio worker.
    pub(crate) struct AudioDecoder {
        decoder: ffmpeg::decoder::Audio,
        time_base: (i32, i32),
    }

    // SAFETY: only the audio worker thread touches the codec context.
    unsafe impl Send for AudioDecoder {}

    impl AudioDecoder {
        pub fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>, PlayerError> {
            self.decoder
                .send_packet(&packet.data)
                .map_err(|e| PlayerError::Resource(format!("audio decode: {e}")))?;
            let mut frames = Vec::new();
            loop {
                let mut decoded = ffmpeg::util::frame::Audio::empty();
                match self.decoder.receive_frame(&mut decoded) {
                    Ok(()) => {
                        let pts = decoded
                            .pts()
                            .map(|ts| ts_to_secs(ts, self.time_base))
                            .unwrap_or_else(|| packet.pts());
                        frames.push(AudioFrame::from_raw(pts, decoded));
                    }
                    Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                    Err(ffmpeg::Error::Eof) => break,
                    Err(e) => {
                        return Err(PlayerError::Resource(format!("audio decode: {e}")));
                    }
                }
            }
            Ok(frames)
        }

        pub fn flush(&mut self) {
            self.decoder.flush();
        }
    }
}

#[cfg(not(feature = "ffmpeg"))]
mod placeholder_impl {
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use parking_lot::Mutex;

    use super::{Packet, PlayerError};
    use crate::media::{AudioFrame, VideoFrame};

    const AUDIO_RATE: u32 = 48_000;
    const AUDIO_CHANNELS: u16 = 2;
    const AUDIO_FRAME_SAMPLES: usize = 1024;
    const VIDEO_PACKET_SIZE: usize = 4096;
    const AUDIO_PACKET_SIZE: usize = 1024;
    const KEYFRAME_INTERVAL: f64 = 1.0;

    #[derive(Clone, Copy, PartialEq, Eq)]
    pub(crate) enum SimKind {
        Video,
        Audio,
    }

    /// Synthetic packet payload stand-in.
    pub(crate) struct SimPacket {
        pub kind: SimKind,
    }

    impl SimPacket {
        #[cfg(test)]
        pub(crate) fn video() -> Self {
            Self {
                kind: SimKind::Video,
            }
        }
    }

    struct Sim {
        duration: f64,
        fps: f64,
        width: u32,
        height: u32,
        has_video: bool,
        has_audio: bool,
        next_video: f64,
        next_audio: f64,
    }

    impl Sim {
        /// `sim://clip?duration=2&fps=25&audio=0&video=1`. Defaults: 10 s,
        /// 30 fps 1920x1080 video plus 48 kHz stereo audio.
        fn parse(url: &str) -> Result<Self, PlayerError> {
            let (path, query) = match url.split_once('?') {
                Some((p, q)) => (p, q),
                None => (url, ""),
            };
            if !path.contains("://") && !Path::new(path).exists() {
                return Err(PlayerError::Resource(format!("no such file: {path}")));
            }

            let mut sim = Sim {
                duration: 10.0,
                fps: 30.0,
                width: 1920,
                height: 1080,
                has_video: true,
                has_audio: true,
                next_video: 0.0,
                next_audio: 0.0,
            };
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                match key {
                    "duration" => sim.duration = value.parse().unwrap_or(sim.duration),
                    "fps" => sim.fps = value.parse().unwrap_or(sim.fps),
                    "video" => sim.has_video = value != "0",
                    "audio" => sim.has_audio = value != "0",
                    _ => {}
                }
            }
            Ok(sim)
        }

        fn video_index(&self) -> Option<usize> {
            self.has_video.then_some(0)
        }

        fn audio_index(&self) -> Option<usize> {
            self.has_audio.then_some(usize::from(self.has_video))
        }
    }

    /// Synthetic demuxer used when the `ffmpeg` feature is disabled. It
    /// mirrors the real adapter's surface: container-ordered interleaving,
    /// EOF detection, prior-keyframe seeking, and the abort latch.
    pub(crate) struct Demuxer {
        inner: Mutex<Option<Sim>>,
        aborted: AtomicBool,
        eof: AtomicBool,
        generation: AtomicU64,
    }

    impl Demuxer {
        pub fn new() -> Self {
            Self {
                inner: Mutex::new(None),
                aborted: AtomicBool::new(false),
                eof: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }
        }

        pub fn load(&self, url: &str) -> Result<(), PlayerError> {
            tracing::warn!(
                "playhead built without the `ffmpeg` feature; synthesizing a placeholder source for {url}"
            );
            let sim = Sim::parse(url)?;
            *self.inner.lock() = Some(sim);
            self.eof.store(false, Ordering::Release);
            Ok(())
        }

        pub fn unload(&self) {
            *self.inner.lock() = None;
            self.eof.store(false, Ordering::Release);
        }

        pub fn abort(&self) {
            self.aborted.store(true, Ordering::Release);
        }

        pub fn clear_abort(&self) {
            self.aborted.store(false, Ordering::Release);
        }

        pub fn read(&self) -> Option<Packet> {
            if self.aborted.load(Ordering::Acquire) {
                return None;
            }
            let mut inner = self.inner.lock();
            let sim = inner.as_mut()?;

            let video_next = (sim.has_video && sim.next_video < sim.duration)
                .then_some(sim.next_video);
            let audio_next = (sim.has_audio && sim.next_audio < sim.duration)
                .then_some(sim.next_audio);

            let generation = self.generation.load(Ordering::Acquire);
            let pick_video = match (video_next, audio_next) {
                (None, None) => {
                    self.eof.store(true, Ordering::Release);
                    return None;
                }
                (Some(v), Some(a)) => v <= a,
                (Some(_), None) => true,
                (None, Some(_)) => false,
            };

            if pick_video {
                let pts = sim.next_video;
                sim.next_video += 1.0 / sim.fps;
                Some(Packet {
                    stream_index: 0,
                    pts,
                    size: VIDEO_PACKET_SIZE,
                    generation,
                    data: SimPacket {
                        kind: SimKind::Video,
                    },
                })
            } else {
                let pts = sim.next_audio;
                sim.next_audio += AUDIO_FRAME_SAMPLES as f64 / AUDIO_RATE as f64;
                Some(Packet {
                    stream_index: sim.audio_index().unwrap_or(0),
                    pts,
                    size: AUDIO_PACKET_SIZE,
                    generation,
                    data: SimPacket {
                        kind: SimKind::Audio,
                    },
                })
            }
        }

        pub fn seek(&self, position: f64) -> Result<(), PlayerError> {
            let mut inner = self.inner.lock();
            let sim = inner
                .as_mut()
                .ok_or_else(|| PlayerError::Resource("no media loaded".into()))?;
            let keyframe = (position / KEYFRAME_INTERVAL).floor() * KEYFRAME_INTERVAL;
            sim.next_video = keyframe;
            sim.next_audio = keyframe;
            self.eof.store(false, Ordering::Release);
            self.generation.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }

        pub fn video_stream(&self) -> Option<usize> {
            self.inner.lock().as_ref().and_then(|s| s.video_index())
        }

        pub fn audio_stream(&self) -> Option<usize> {
            self.inner.lock().as_ref().and_then(|s| s.audio_index())
        }

        pub fn duration(&self) -> f64 {
            self.inner.lock().as_ref().map(|s| s.duration).unwrap_or(0.0)
        }

        pub fn frame_rate(&self) -> f64 {
            self.inner
                .lock()
                .as_ref()
                .filter(|s| s.has_video)
                .map(|s| s.fps)
                .unwrap_or(0.0)
        }

        pub fn seekable(&self) -> bool {
            self.inner.lock().is_some()
        }

        pub fn eof(&self) -> bool {
            self.eof.load(Ordering::Acquire)
        }

        pub fn video_decoder(&self) -> Result<VideoDecoder, PlayerError> {
            let inner = self.inner.lock();
            let sim = inner
                .as_ref()
                .filter(|s| s.has_video)
                .ok_or_else(|| PlayerError::Resource("no video stream".into()))?;
            Ok(VideoDecoder {
                width: sim.width,
                height: sim.height,
            })
        }

        pub fn audio_decoder(&self) -> Result<AudioDecoder, PlayerError> {
            self.inner
                .lock()
                .as_ref()
                .filter(|s| s.has_audio)
                .ok_or_else(|| PlayerError::Resource("no audio stream".into()))?;
            Ok(AudioDecoder {
                rate: AUDIO_RATE,
                channels: AUDIO_CHANNELS,
            })
        }
    }

    pub(crate) struct VideoDecoder {
        width: u32,
        height: u32,
    }

    impl VideoDecoder {
        pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>, PlayerError> {
            match packet.data.kind {
                SimKind::Video => Ok(vec![VideoFrame::synthetic(
                    packet.pts(),
                    self.width,
                    self.height,
                )]),
                SimKind::Audio => Ok(Vec::new()),
            }
        }

        pub fn flush(&mut self) {}
    }

    pub(crate) struct AudioDecoder {
        rate: u32,
        channels: u16,
    }

    impl AudioDecoder {
        pub fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>, PlayerError> {
            match packet.data.kind {
                SimKind::Audio => Ok(vec![AudioFrame::synthetic(
                    packet.pts(),
                    self.rate,
                    self.channels,
                    AUDIO_FRAME_SAMPLES,
                )]),
                SimKind::Video => Ok(Vec::new()),
            }
        }

        pub fn flush(&mut self) {}
    }
}

#[cfg(feature = "ffmpeg")]
pub(crate) use ffmpeg_impl::{AudioDecoder, Demuxer, VideoDecoder};
#[cfg(not(feature = "ffmpeg"))]
pub(crate) use placeholder_impl::{AudioDecoder, Demuxer, VideoDecoder};

#[cfg(all(test, not(feature = "ffmpeg")))]
mod tests {
    use super::*;

    #[test]
    fn load_rejects_missing_files() {
        let demuxer = Demuxer::new();
        let err = demuxer.load("nonexistent.mp4").unwrap_err();
        assert!(matches!(err, PlayerError::Resource(_)));
        assert!(demuxer.video_stream().is_none());
    }

    #[test]
    fn load_parses_query_parameters() {
        let demuxer = Demuxer::new();
        demuxer
            .load("sim://clip?duration=2&fps=25&audio=0")
            .unwrap();
        assert_eq!(demuxer.video_stream(), Some(0));
        assert!(demuxer.audio_stream().is_none());
        assert!((demuxer.duration() - 2.0).abs() < 1e-9);
        assert!((demuxer.frame_rate() - 25.0).abs() < 1e-9);
        assert!(demuxer.seekable());
    }

    #[test]
    fn packets_interleave_in_pts_order() {
        let demuxer = Demuxer::new();
        demuxer.load("sim://clip?duration=1").unwrap();
        let mut last_pts = 0.0;
        let mut saw_video = false;
        let mut saw_audio = false;
        while let Some(packet) = demuxer.read() {
            assert!(packet.pts() >= last_pts - 1e-9);
            last_pts = packet.pts();
            match packet.stream_index() {
                0 => saw_video = true,
                1 => saw_audio = true,
                other => panic!("unexpected stream {other}"),
            }
        }
        assert!(saw_video && saw_audio);
        assert!(demuxer.eof());
    }

    #[test]
    fn seek_snaps_to_prior_keyframe() {
        let demuxer = Demuxer::new();
        demuxer.load("sim://clip?duration=10&audio=0").unwrap();
        demuxer.seek(3.7).unwrap();
        let packet = demuxer.read().expect("packet after seek");
        assert!((packet.pts() - 3.0).abs() < 1e-9);
        assert_eq!(packet.generation(), 1);
    }

    #[test]
    fn seek_rewinds_eof() {
        let demuxer = Demuxer::new();
        demuxer.load("sim://clip?duration=0.05&audio=0").unwrap();
        while demuxer.read().is_some() {}
        assert!(demuxer.eof());
        demuxer.seek(0.0).unwrap();
        assert!(!demuxer.eof());
        assert!(demuxer.read().is_some());
    }

    #[test]
    fn abort_latches_until_cleared() {
        let demuxer = Demuxer::new();
        demuxer.load("sim://clip").unwrap();
        demuxer.abort();
        assert!(demuxer.read().is_none());
        demuxer.clear_abort();
        assert!(demuxer.read().is_some());
    }

    #[test]
    fn decoders_route_by_packet_kind() {
        let demuxer = Demuxer::new();
        demuxer.load("sim://clip?duration=1").unwrap();
        let mut video = demuxer.video_decoder().unwrap();
        let mut audio = demuxer.audio_decoder().unwrap();
        let packet = demuxer.read().unwrap();
        // first packet of an A/V clip is video (ties go to video)
        let frames = video.decode(&packet).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].dimensions(), (1920, 1080));
        assert!(audio.decode(&packet).unwrap().is_empty());
    }
}
