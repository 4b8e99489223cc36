//! The player controller: public API, state machine, and worker loops.
//!
//! One source session owns up to four workers: a one-shot loader, the demux
//! loop, and a player loop per present stream. Control calls translate to
//! immediate state transitions plus deferred events that complete at safe
//! tick points; a global wait gate parks all loops while paused or stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::demux::{AudioDecoder, Demuxer, VideoDecoder};
use crate::events::{EventQueue, PlayerEvent};
#[cfg(feature = "ffmpeg")]
use crate::io::MediaIo;
use crate::media::{AudioFrame, MediaStatus, PlayerError, State, VideoFrame};
use crate::queue::{Lookahead, PacketQueue};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Pipeline tunables. The defaults match common desktop playback.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Demux backpressure: stop reading while both queues together hold
    /// more than this many packet bytes.
    pub max_queue_bytes: usize,
    /// A queue reports `enough` lookahead at this packet count…
    pub lookahead_packets: usize,
    /// …or once its queued PTS span reaches this many seconds.
    pub lookahead_span: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_queue_bytes: 15 * 1024 * 1024,
            lookahead_packets: 25,
            lookahead_span: 1.0,
        }
    }
}

/// The global wait gate: parks every worker loop at its top while the
/// player is paused or stopped.
struct WaitGate {
    waiting: Mutex<bool>,
    cond: Condvar,
}

impl WaitGate {
    fn new() -> Self {
        Self {
            waiting: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn set(&self, waiting: bool) {
        *self.waiting.lock() = waiting;
        if !waiting {
            self.cond.notify_all();
        }
    }

    fn park(&self, quit: &AtomicBool) {
        let mut waiting = self.waiting.lock();
        while *waiting && !quit.load(Ordering::Acquire) {
            self.cond.wait(&mut waiting);
        }
    }
}

/// At most one outstanding user seek. The generation grows monotonically so
/// an in-flight service (or a stale `seeked` event) can tell whether it has
/// been superseded.
#[derive(Default)]
struct PendingSeek {
    position: Option<f64>,
    generation: u64,
}

#[derive(Default)]
struct Props {
    source: String,
    duration: f64,
    seekable: bool,
    video_frame_rate: f64,
    error: Option<PlayerError>,
}

#[derive(Default)]
struct StateCell {
    state: State,
    media_status: MediaStatus,
}

#[derive(Default)]
struct Workers {
    loader: Option<JoinHandle<()>>,
    demux: Option<JoinHandle<()>>,
    video: Option<JoinHandle<()>>,
    audio: Option<JoinHandle<()>>,
}

impl Workers {
    fn take_all(&mut self) -> Vec<JoinHandle<()>> {
        [
            self.loader.take(),
            self.demux.take(),
            self.video.take(),
            self.audio.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

struct PlayerInner {
    me: Weak<PlayerInner>,
    tx: Sender<PlayerEvent>,
    config: PlayerConfig,
    demuxer: Demuxer,
    video_queue: PacketQueue<VideoFrame>,
    audio_queue: PacketQueue<AudioFrame>,
    cell: Mutex<StateCell>,
    props: Mutex<Props>,
    speed: Mutex<f64>,
    pending: Mutex<PendingSeek>,
    events: EventQueue,
    quit: AtomicBool,
    gate: WaitGate,
    workers: Mutex<Workers>,
    #[cfg(feature = "ffmpeg")]
    pending_reader: Mutex<Option<Box<dyn MediaIo>>>,
}

impl PlayerInner {
    fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    fn upgrade(&self) -> Option<Arc<PlayerInner>> {
        self.me.upgrade()
    }

    fn state(&self) -> State {
        self.cell.lock().state
    }

    fn media_status(&self) -> MediaStatus {
        self.cell.lock().media_status
    }

    fn set_state(&self, state: State) -> bool {
        let mut cell = self.cell.lock();
        if cell.state == state {
            return false;
        }
        tracing::debug!("state: {:?} -> {:?}", cell.state, state);
        cell.state = state;
        self.emit(PlayerEvent::StateChanged(state));
        true
    }

    fn set_media_status(&self, status: MediaStatus) {
        let mut cell = self.cell.lock();
        if cell.media_status == status {
            return;
        }
        tracing::debug!("media status: {:?} -> {:?}", cell.media_status, status);
        cell.media_status = status;
        self.emit(PlayerEvent::MediaStatusChanged(status));
    }

    fn set_duration(&self, duration: f64) {
        let mut props = self.props.lock();
        if fuzzy_eq(props.duration, duration) {
            return;
        }
        props.duration = duration;
        self.emit(PlayerEvent::DurationChanged((duration * 1000.0).round() as i64));
    }

    fn set_seekable(&self, seekable: bool) {
        let mut props = self.props.lock();
        if props.seekable == seekable {
            return;
        }
        props.seekable = seekable;
        self.emit(PlayerEvent::SeekableChanged(seekable));
    }

    fn set_video_frame_rate(&self, rate: f64) {
        let mut props = self.props.lock();
        if fuzzy_eq(props.video_frame_rate, rate) {
            return;
        }
        props.video_frame_rate = rate;
        self.emit(PlayerEvent::VideoFrameRateChanged(rate));
    }

    /// Reports a resource error once per source; duplicates are suppressed
    /// until the next `set_source`.
    fn set_error(&self, error: PlayerError) {
        {
            let mut props = self.props.lock();
            if props.error.is_some() {
                return;
            }
            tracing::warn!("error: {}: {}", props.source, error);
            props.error = Some(error.clone());
        }
        self.emit(PlayerEvent::ErrorOccurred(error));
        self.set_media_status(MediaStatus::Invalid);
    }

    fn is_seeking(&self) -> bool {
        self.pending.lock().position.is_some()
    }

    fn speed(&self) -> f64 {
        *self.speed.lock()
    }

    /// Flips the wait gate and wakes queue waiters so parked consumers
    /// re-check it.
    fn wait(&self, waiting: bool) {
        self.gate.set(waiting);
        self.video_queue.wake_all();
        self.audio_queue.wake_all();
    }

    fn do_wait(&self) {
        self.gate.park(&self.quit);
    }

    fn process_events(&self, tick: bool) {
        self.events.process(tick, self.is_seeking());
    }

    fn has_video(&self) -> bool {
        self.demuxer.video_stream().is_some()
    }

    fn has_audio(&self) -> bool {
        self.demuxer.audio_stream().is_some()
    }

    fn duration_ms(&self) -> i64 {
        (self.props.lock().duration * 1000.0).round() as i64
    }

    fn position_ms(&self) -> i64 {
        if self.media_status() == MediaStatus::EndOfMedia {
            return self.duration_ms();
        }
        if let Some(position) = self.pending.lock().position {
            return (position * 1000.0).round() as i64;
        }
        let pts = if self.has_video() {
            self.video_queue.pts()
        } else {
            self.audio_queue.pts()
        };
        (pts * 1000.0).round() as i64
    }

    /// The single cancellation point: after this returns no worker is
    /// alive and no further events are emitted by this session.
    fn terminate(&self) {
        tracing::debug!("terminate");
        self.set_state(State::Stopped);
        self.set_media_status(MediaStatus::NoMedia);
        self.demuxer.abort();
        self.quit.store(true, Ordering::Release);
        self.wait(false);
        self.props.lock().video_frame_rate = 0.0;
        self.video_queue.clear();
        self.video_queue.abort();
        self.audio_queue.clear();
        self.audio_queue.abort();
        // the loader may still be inserting worker handles; keep joining
        // until none remain
        loop {
            let handles = self.workers.lock().take_all();
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.join();
            }
        }
        self.pending.lock().position = None;
        // stale session callbacks must not fire into the next session, and
        // they hold strong controller references
        self.events.clear();
    }

    fn set_source(&self, url: &str) {
        if self.props.lock().source == url {
            return;
        }
        tracing::debug!("set source: {url}");
        self.terminate();
        {
            let mut props = self.props.lock();
            props.source = url.to_string();
            props.error = None;
        }
        self.emit(PlayerEvent::SourceChanged(url.to_string()));
        if url.is_empty() {
            self.set_media_status(MediaStatus::NoMedia);
            self.set_duration(0.0);
            return;
        }

        self.wait(true);
        self.quit.store(false, Ordering::Release);
        let Some(inner) = self.upgrade() else { return };
        let source = url.to_string();
        self.workers.lock().loader = Some(thread::spawn(move || inner.do_load(&source)));
    }

    fn do_load(&self, source: &str) {
        self.demuxer.clear_abort();
        self.demuxer.unload();
        self.video_queue.reset();
        self.audio_queue.reset();

        #[cfg(feature = "ffmpeg")]
        let loaded = match self.pending_reader.lock().take() {
            Some(reader) => self.demuxer.load_reader(reader),
            None => self.demuxer.load(source),
        };
        #[cfg(not(feature = "ffmpeg"))]
        let loaded = self.demuxer.load(source);

        if let Err(e) = loaded {
            self.set_error(e);
            return;
        }
        if self.demuxer.video_stream().is_none() && self.demuxer.audio_stream().is_none() {
            self.set_error(PlayerError::Resource("no codecs found".into()));
            return;
        }

        // open the decoders up front so codec failures surface as load
        // errors rather than mid-playback surprises
        let video_decoder = if self.has_video() {
            match self.demuxer.video_decoder() {
                Ok(decoder) => Some(decoder),
                Err(e) => {
                    self.set_error(e);
                    return;
                }
            }
        } else {
            None
        };
        let audio_decoder = if self.has_audio() {
            match self.demuxer.audio_decoder() {
                Ok(decoder) => Some(decoder),
                Err(e) => {
                    self.set_error(e);
                    return;
                }
            }
        } else {
            None
        };

        let duration = self.demuxer.duration();
        let seekable = self.demuxer.seekable();
        let frame_rate = self.demuxer.frame_rate();
        tracing::debug!("[{source}]: loaded, seekable: {seekable}, duration: {duration}");
        self.set_seekable(seekable);
        self.set_duration(duration);
        self.set_video_frame_rate(frame_rate);
        self.set_media_status(MediaStatus::Loaded);
        tracing::debug!("processing deferred control events");
        self.process_events(true);

        if self.quit.load(Ordering::Acquire) {
            return;
        }
        let Some(inner) = self.upgrade() else { return };
        let mut workers = self.workers.lock();
        {
            let inner = Arc::clone(&inner);
            workers.demux = Some(thread::spawn(move || inner.do_demux()));
        }
        if let Some(decoder) = video_decoder {
            let inner = Arc::clone(&inner);
            workers.video = Some(thread::spawn(move || inner.do_play_video(decoder)));
        }
        if let Some(decoder) = audio_decoder {
            let inner = Arc::clone(&inner);
            workers.audio = Some(thread::spawn(move || inner.do_play_audio(decoder)));
        }
    }

    fn play(&self) {
        let status = self.media_status();
        if self.props.lock().source.is_empty() || status == MediaStatus::Invalid {
            return;
        }
        tracing::debug!("play");
        if matches!(status, MediaStatus::Loaded | MediaStatus::EndOfMedia) {
            if self.set_state(State::Playing) {
                if status == MediaStatus::EndOfMedia {
                    tracing::debug!("playing from beginning");
                    self.seek(0);
                }
                if let Some(inner) = self.upgrade() {
                    self.events.push(move |tick| {
                        inner.wait(false);
                        if !tick && inner.media_status() != MediaStatus::EndOfMedia {
                            return false;
                        }
                        let position = inner.position_ms();
                        tracing::debug!("played from pos: {position}");
                        inner.emit(PlayerEvent::Played(position));
                        true
                    });
                }
            }
            self.wait(false);
        } else {
            tracing::debug!("{status:?}: not loaded yet, postponing play until loaded");
            if let Some(inner) = self.upgrade() {
                self.events.push(move |_| {
                    tracing::debug!("starting pending play");
                    inner.play();
                    true
                });
            }
            // the loader may have finished between the status check and
            // the push; drain now so the command isn't stranded
            if matches!(
                self.media_status(),
                MediaStatus::Loaded | MediaStatus::EndOfMedia
            ) {
                self.process_events(true);
            }
        }
    }

    fn pause(&self) {
        tracing::debug!("pause");
        let status = self.media_status();
        if matches!(status, MediaStatus::Loaded | MediaStatus::EndOfMedia) {
            if status == MediaStatus::EndOfMedia {
                tracing::debug!("pausing from beginning");
                self.seek(0);
            }
            if self.set_state(State::Paused) {
                self.wait(false);
                if let Some(inner) = self.upgrade() {
                    self.events.push(move |tick| {
                        if !tick && inner.media_status() != MediaStatus::EndOfMedia {
                            return false;
                        }
                        let position = inner.position_ms();
                        tracing::debug!("paused at pos: {position}");
                        inner.emit(PlayerEvent::Paused(position));
                        inner.wait(true);
                        true
                    });
                }
            } else {
                self.wait(true);
            }
        } else {
            tracing::debug!("{status:?}: not loaded yet, postponing pause until loaded");
            if let Some(inner) = self.upgrade() {
                self.events.push(move |_| {
                    tracing::debug!("starting pending pause");
                    inner.pause();
                    true
                });
            }
            if matches!(
                self.media_status(),
                MediaStatus::Loaded | MediaStatus::EndOfMedia
            ) {
                self.process_events(true);
            }
        }
    }

    fn stop(&self) {
        tracing::debug!("stop");
        let status = self.media_status();
        if !matches!(status, MediaStatus::Loaded | MediaStatus::EndOfMedia) {
            return;
        }
        if self.set_state(State::Stopped) {
            self.wait(false);
            if let Some(inner) = self.upgrade() {
                self.events.push(move |_| {
                    let position = inner.position_ms();
                    tracing::debug!("stopped at pos: {position}");
                    inner.emit(PlayerEvent::Stopped(position));
                    if inner.has_video() {
                        tracing::debug!("flushing empty video frame");
                        inner.emit(PlayerEvent::VideoFrame(None));
                    }
                    inner.wait(true);
                    true
                });
            }
        } else {
            self.wait(true);
        }
    }

    fn seek(&self, position_ms: i64) {
        let duration = self.duration_ms();
        if position_ms < 0 || (duration > 0 && position_ms > duration) {
            return;
        }
        tracing::debug!("seek to: {position_ms}");
        let status = self.media_status();
        if matches!(status, MediaStatus::Loaded | MediaStatus::EndOfMedia) {
            let generation = {
                let mut pending = self.pending.lock();
                pending.position = Some(position_ms as f64 / 1000.0);
                pending.generation += 1;
                pending.generation
            };
            if status == MediaStatus::EndOfMedia {
                self.set_media_status(MediaStatus::Loaded);
            }
            if let Some(inner) = self.upgrade() {
                self.events.push(move |tick| {
                    {
                        let pending = inner.pending.lock();
                        if pending.generation != generation {
                            // a newer seek superseded this one; its own
                            // event reports the final position
                            return true;
                        }
                        if !tick || pending.position.is_some() {
                            return false;
                        }
                    }
                    let position = inner.position_ms();
                    tracing::debug!("seeked to pos: {position}");
                    inner.emit(PlayerEvent::Seeked(position));
                    if matches!(inner.state(), State::Paused | State::Stopped) {
                        inner.wait(true);
                    }
                    true
                });
            }
            self.wait(false);
        } else {
            tracing::debug!("{status:?}: not loaded yet, postponing seek until loaded");
            if let Some(inner) = self.upgrade() {
                self.events.push(move |_| {
                    tracing::debug!("starting pending seek to {position_ms}");
                    inner.seek(position_ms);
                    true
                });
            }
            if matches!(
                self.media_status(),
                MediaStatus::Loaded | MediaStatus::EndOfMedia
            ) {
                self.process_events(true);
            }
        }
    }

    fn set_speed(&self, speed: f64) {
        if speed <= 0.0 {
            return;
        }
        {
            let mut current = self.speed.lock();
            if fuzzy_eq(*current, speed) {
                return;
            }
            tracing::debug!("speed: {} -> {}", *current, speed);
            *current = speed;
        }
        self.emit(PlayerEvent::SpeedChanged(speed));
    }

    // =========================================================================
    // Worker loops
    // =========================================================================

    fn do_demux(&self) {
        tracing::debug!("demux worker started");
        while !self.quit.load(Ordering::Acquire) {
            self.do_wait();
            if self.quit.load(Ordering::Acquire) {
                break;
            }

            if self.video_queue.bytes() + self.audio_queue.bytes() > self.config.max_queue_bytes
                || (self.video_queue.enough() && self.audio_queue.enough())
            {
                thread::sleep(POLL_INTERVAL);
                continue;
            }

            let snapshot = {
                let pending = self.pending.lock();
                pending.position.map(|p| (p, pending.generation))
            };
            if let Some((position, generation)) = snapshot {
                tracing::debug!("seeking to pos: {}", position * 1000.0);
                match self.demuxer.seek(position) {
                    Ok(()) => {
                        self.video_queue.clear();
                        self.audio_queue.clear();
                        tracing::debug!("waiting for video frames to drain");
                        self.video_queue.wait_for_empty();
                        tracing::debug!("waiting for audio frames to drain");
                        self.audio_queue.wait_for_empty();
                        tracing::debug!("reading packets from {}", position * 1000.0);
                    }
                    Err(e) => tracing::warn!("could not seek: {e}"),
                }
                let mut pending = self.pending.lock();
                if pending.generation == generation {
                    pending.position = None;
                }
            }

            let Some(packet) = self.demuxer.read() else {
                if self.demuxer.eof()
                    && self.video_queue.is_empty()
                    && self.audio_queue.is_empty()
                    && !self.video_queue.finished()
                    && !self.audio_queue.finished()
                {
                    if self.has_video() {
                        self.video_queue.finish();
                    }
                    if self.has_audio() {
                        self.audio_queue.finish();
                    }
                    tracing::debug!("end of media");
                    self.set_media_status(MediaStatus::EndOfMedia);
                    self.stop();
                }
                thread::sleep(POLL_INTERVAL);
                continue;
            };

            if Some(packet.stream_index()) == self.demuxer.video_stream() {
                self.video_queue.enqueue(packet);
            } else if Some(packet.stream_index()) == self.demuxer.audio_stream() {
                self.audio_queue.enqueue(packet);
            }
        }
        tracing::debug!("demux worker finished");
    }

    fn do_play_video(&self, mut decoder: VideoDecoder) {
        tracing::debug!("video worker started");
        self.video_queue.set_frame_rate(self.demuxer.frame_rate());
        let mut generation = 0;

        while !self.quit.load(Ordering::Acquire) {
            self.do_wait();
            if self.quit.load(Ordering::Acquire) {
                break;
            }
            let speed = self.speed();
            // once the audio stream drains its clock stops advancing;
            // trailing video frames pace off the wall clock instead
            let master = if self.has_audio()
                && !(self.audio_queue.finished() && self.audio_queue.is_empty())
            {
                Some(self.audio_queue.pts())
            } else {
                None
            };
            let frame = match self.video_queue.sync(speed, master, |packet| {
                if packet.generation() != generation {
                    generation = packet.generation();
                    decoder.flush();
                }
                decoder.decode(&packet)
            }) {
                Ok(frame) => frame,
                Err(e) => {
                    self.set_error(e);
                    None
                }
            };
            if let Some(ref frame) = frame {
                self.emit(PlayerEvent::VideoFrame(Some(frame.clone())));
                self.video_queue.pop();
            }
            self.process_events(frame.is_some());
        }

        // render reset for downstream sinks
        self.emit(PlayerEvent::VideoFrame(None));
        self.video_queue.clear();
        tracing::debug!("video worker finished");
    }

    fn do_play_audio(&self, mut decoder: AudioDecoder) {
        tracing::debug!("audio worker started");
        let has_video = self.has_video();
        let mut generation = 0;

        while !self.quit.load(Ordering::Acquire) {
            self.do_wait();
            if self.quit.load(Ordering::Acquire) {
                break;
            }
            let speed = self.speed();
            let frame = match self.audio_queue.sync(speed, None, |packet| {
                if packet.generation() != generation {
                    generation = packet.generation();
                    decoder.flush();
                }
                decoder.decode(&packet)
            }) {
                Ok(frame) => frame,
                Err(e) => {
                    self.set_error(e);
                    None
                }
            };
            if let Some(ref frame) = frame {
                let mut frame = frame.clone();
                frame.apply_speed(speed);
                self.emit(PlayerEvent::AudioFrame(frame));
                self.audio_queue.pop();
            }
            // with a video stream present the video worker drains events,
            // keeping tick semantics under the video-master clock
            if !has_video {
                self.process_events(frame.is_some());
            }
        }

        self.audio_queue.clear();
        tracing::debug!("audio worker finished");
    }
}

/// A media player playback core.
///
/// Turns a source URL into an ordered stream of decoded frames delivered as
/// [`PlayerEvent`]s, honoring play/pause/stop/seek/speed control. Rendering
/// and audio output are downstream concerns: subscribe with
/// [`events`](Player::events) and present the frames however you like.
///
/// ```no_run
/// use playhead::{Player, PlayerEvent};
///
/// let player = Player::new();
/// let events = player.events();
/// player.set_source("movie.mkv");
/// player.play();
/// for event in events.iter() {
///     match event {
///         PlayerEvent::VideoFrame(Some(_frame)) => { /* upload + present */ }
///         PlayerEvent::Stopped(_) => break,
///         _ => {}
///     }
/// }
/// ```
pub struct Player {
    inner: Arc<PlayerInner>,
    events: Receiver<PlayerEvent>,
}

impl Player {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        let (tx, rx) = unbounded();
        let lookahead = Lookahead {
            packets: config.lookahead_packets,
            span: config.lookahead_span,
        };
        let inner = Arc::new_cyclic(|me| PlayerInner {
            me: me.clone(),
            tx,
            config,
            demuxer: Demuxer::new(),
            video_queue: PacketQueue::new(lookahead),
            audio_queue: PacketQueue::new(lookahead),
            cell: Mutex::new(StateCell::default()),
            props: Mutex::new(Props::default()),
            speed: Mutex::new(1.0),
            pending: Mutex::new(PendingSeek::default()),
            events: EventQueue::default(),
            quit: AtomicBool::new(false),
            gate: WaitGate::new(),
            workers: Mutex::new(Workers::default()),
            #[cfg(feature = "ffmpeg")]
            pending_reader: Mutex::new(None),
        });
        Self { inner, events: rx }
    }

    /// The event stream. Events arrive in dispatch order; frame events are
    /// emitted from worker threads.
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.events.clone()
    }

    /// Replaces the media source, tearing down any current session. An
    /// empty URL just clears the player. Setting the current source again
    /// is a no-op.
    pub fn set_source(&self, url: &str) {
        self.inner.set_source(url);
    }

    /// Plays from a caller-supplied byte stream instead of a URL. `name`
    /// identifies the source for [`source`](Player::source) and logging.
    #[cfg(feature = "ffmpeg")]
    pub fn set_source_reader(&self, name: &str, reader: Box<dyn MediaIo>) {
        if self.inner.props.lock().source == name {
            return;
        }
        *self.inner.pending_reader.lock() = Some(reader);
        self.inner.set_source(name);
    }

    pub fn source(&self) -> String {
        self.inner.props.lock().source.clone()
    }

    /// Starts or resumes playback. Before the media loads the call is
    /// deferred and replayed once loading completes; at end of media
    /// playback restarts from the beginning.
    pub fn play(&self) {
        self.inner.play();
    }

    /// Pauses playback, retaining the current position.
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Stops playback. Position is not reset; a following
    /// [`play`](Player::play) resumes from where playback stopped.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Requests a seek to `position_ms`. Out-of-range positions are
    /// ignored. Rapid retriggers coalesce: only the latest target survives
    /// and exactly one `Seeked` event reports it.
    pub fn seek(&self, position_ms: i64) {
        self.inner.seek(position_ms);
    }

    /// Current position in milliseconds.
    pub fn position(&self) -> i64 {
        self.inner.position_ms()
    }

    /// Media duration in milliseconds (0 while unknown).
    pub fn duration(&self) -> i64 {
        self.inner.duration_ms()
    }

    pub fn is_seekable(&self) -> bool {
        self.inner.props.lock().seekable
    }

    /// Sets the playback rate. Values at or below zero are ignored. Takes
    /// effect at the next frame boundary; no restart needed.
    pub fn set_speed(&self, speed: f64) {
        self.inner.set_speed(speed);
    }

    pub fn speed(&self) -> f64 {
        self.inner.speed()
    }

    pub fn state(&self) -> State {
        self.inner.state()
    }

    pub fn media_status(&self) -> MediaStatus {
        self.inner.media_status()
    }

    pub fn has_video(&self) -> bool {
        self.inner.has_video()
    }

    pub fn has_audio(&self) -> bool {
        self.inner.has_audio()
    }

    pub fn video_frame_rate(&self) -> f64 {
        self.inner.props.lock().video_frame_rate
    }

    /// The latched error for the current source, if any.
    pub fn error(&self) -> Option<PlayerError> {
        self.inner.props.lock().error.clone()
    }

    pub fn error_string(&self) -> String {
        self.inner
            .props
            .lock()
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.inner.terminate();
    }
}
