//! Bounded packet queue with byte accounting, abort/finish latches, and the
//! `sync` pacing primitive.
//!
//! One queue sits between the demux worker and each player worker. The demux
//! worker enqueues compressed packets; the player worker decodes the head
//! packet inside [`PacketQueue::sync`] and receives the frame back only once
//! its PTS has caught up to the reference clock. The frame is held by the
//! queue until [`PacketQueue::pop`] commits consumption, so the player loop
//! can emit the frame before committing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::demux::Packet;
use crate::media::{AudioFrame, PlayerError, VideoFrame};

/// How long a consumer parks waiting for data before re-checking state.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound on `wait_for_empty`.
const DRAIN_DEADLINE: Duration = Duration::from_millis(100);

/// A wall-clock lag beyond this rebases the queue clock instead of
/// fast-forwarding through overdue frames (resume after pause, stalls).
const CLOCK_REBASE_THRESHOLD: f64 = 0.5;

/// Decoded frames carry a presentation timestamp the pacing logic reads.
pub(crate) trait Timestamped {
    fn pts(&self) -> f64;
}

impl Timestamped for VideoFrame {
    fn pts(&self) -> f64 {
        self.pts()
    }
}

impl Timestamped for AudioFrame {
    fn pts(&self) -> f64 {
        self.pts()
    }
}

struct QueueState<F> {
    packets: VecDeque<Packet>,
    /// Sum of packet payload sizes currently queued.
    bytes: usize,
    /// No more packets will arrive. Set only by the demux worker.
    finished: bool,
    /// Latched; all waiters unblock and observe empty results.
    aborted: bool,
    /// Consumer is parked inside `dequeue` (the queue is drained from its
    /// point of view).
    waiting_for_packets: bool,
    /// Frames decoded from the head packet, pending emission.
    frames: VecDeque<F>,
    /// PTS of the most recently returned frame.
    pts: f64,
    /// Emission pacing for video; zero disables.
    frame_rate: f64,
    /// Wall-clock reference: (origin instant, media time at origin).
    clock: Option<(Instant, f64)>,
    /// Last time `sync` released a frame, for frame-rate pacing.
    last_emit: Option<Instant>,
}

/// Thresholds for [`PacketQueue::enough`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lookahead {
    pub packets: usize,
    pub span: f64,
}

impl Default for Lookahead {
    fn default() -> Self {
        Self {
            packets: 25,
            span: 1.0,
        }
    }
}

/// A bounded FIFO of undecoded packets plus the per-stream pacing clock.
pub(crate) struct PacketQueue<F> {
    inner: Mutex<QueueState<F>>,
    /// Signals packet arrival, abort, finish, and external wake-ups.
    consumer: Condvar,
    /// Signals the queue draining, for `wait_for_empty`.
    producer: Condvar,
    lookahead: Lookahead,
}

impl<F: Timestamped + Clone> PacketQueue<F> {
    pub fn new(lookahead: Lookahead) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                packets: VecDeque::new(),
                bytes: 0,
                finished: false,
                aborted: false,
                waiting_for_packets: false,
                frames: VecDeque::new(),
                pts: 0.0,
                frame_rate: 0.0,
                clock: None,
                last_emit: None,
            }),
            consumer: Condvar::new(),
            producer: Condvar::new(),
            lookahead,
        }
    }

    /// Appends a packet and wakes any waiting consumer.
    pub fn enqueue(&self, packet: Packet) {
        let mut state = self.inner.lock();
        state.bytes += packet.size();
        state.packets.push_back(packet);
        self.consumer.notify_all();
    }

    /// Removes and returns the head packet.
    ///
    /// Parks briefly while the queue is empty; returns `None` on abort, on
    /// `finished` with nothing left, or when woken without data.
    pub fn dequeue(&self) -> Option<Packet> {
        let mut state = self.inner.lock();
        if state.packets.is_empty() && !state.aborted {
            state.waiting_for_packets = true;
            self.producer.notify_all();
            self.consumer.wait_for(&mut state, POLL_INTERVAL);
            state.waiting_for_packets = false;
        }
        if state.aborted {
            return None;
        }
        let packet = state.packets.pop_front();
        if let Some(ref p) = packet {
            state.bytes = state.bytes.saturating_sub(p.size());
        }
        packet
    }

    /// Total payload bytes currently queued.
    pub fn bytes(&self) -> usize {
        self.inner.lock().bytes
    }

    /// True when neither packets nor decoded frames remain.
    pub fn is_empty(&self) -> bool {
        let state = self.inner.lock();
        state.packets.is_empty() && state.frames.is_empty()
    }

    /// True when the queue holds sufficient lookahead (packet count or PTS
    /// span), so the demux worker can back off.
    pub fn enough(&self) -> bool {
        let state = self.inner.lock();
        if state.packets.len() >= self.lookahead.packets {
            return true;
        }
        match (state.packets.front(), state.packets.back()) {
            (Some(first), Some(last)) => last.pts() - first.pts() >= self.lookahead.span,
            _ => false,
        }
    }

    pub fn finished(&self) -> bool {
        self.inner.lock().finished
    }

    /// Discards queued packets and decoded-but-unconsumed frames, and
    /// rewinds the pacing clock. The last emitted PTS is preserved.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.packets.clear();
        state.frames.clear();
        state.bytes = 0;
        state.finished = false;
        state.clock = None;
        state.last_emit = None;
        self.producer.notify_all();
    }

    /// Latches abort: all waiters unblock and observe empty results.
    pub fn abort(&self) {
        let mut state = self.inner.lock();
        state.aborted = true;
        self.consumer.notify_all();
        self.producer.notify_all();
    }

    /// Full reset for reloading a new source: drops everything, releases
    /// the abort latch, and zeroes the emitted PTS.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.packets.clear();
        state.frames.clear();
        state.bytes = 0;
        state.finished = false;
        state.aborted = false;
        state.pts = 0.0;
        state.clock = None;
        state.last_emit = None;
    }

    /// Marks that no more packets will arrive, so consumers observe
    /// drain-then-EOF instead of waiting forever.
    pub fn finish(&self) {
        let mut state = self.inner.lock();
        state.finished = true;
        self.consumer.notify_all();
    }

    /// Blocks until the queue (packets and in-flight frames) is drained, or
    /// the queue is aborted, or the consumer is itself parked waiting for
    /// packets. Bounded: a consumer stalled against a clock that cannot
    /// advance mid-seek must not wedge the caller, so after the deadline
    /// the remaining frame is allowed to straggle.
    pub fn wait_for_empty(&self) {
        let deadline = Instant::now() + DRAIN_DEADLINE;
        let mut state = self.inner.lock();
        while !(state.packets.is_empty() && state.frames.is_empty())
            && !state.aborted
            && !state.waiting_for_packets
            && Instant::now() < deadline
        {
            self.producer.wait_for(&mut state, POLL_INTERVAL);
        }
    }

    /// Releases any waiters without changing queue state. Used when the
    /// global wait gate flips so consumers re-check it.
    pub fn wake_all(&self) {
        self.consumer.notify_all();
        self.producer.notify_all();
    }

    /// PTS of the most recently emitted frame, in seconds.
    pub fn pts(&self) -> f64 {
        self.inner.lock().pts
    }

    pub fn set_frame_rate(&self, rate: f64) {
        self.inner.lock().frame_rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            0.0
        };
    }

    /// Decodes the head packet (via `decode`) and returns the resulting
    /// frame once its PTS has caught up to the reference:
    ///
    /// - with `master` (audio PTS) above zero, the frame is due when its
    ///   PTS is at or behind the master clock;
    /// - otherwise the queue's own wall clock paces emission, scaled by
    ///   `speed` and anchored at the first frame after a clear;
    /// - a non-zero frame rate additionally spaces emissions by
    ///   `1 / (rate * speed)`.
    ///
    /// Returns `Ok(None)` when no frame is due yet (after a short bounded
    /// park) or when the queue is drained/aborted. The returned frame stays
    /// at the head until [`pop`](Self::pop) commits it.
    pub fn sync<D>(
        &self,
        speed: f64,
        master: Option<f64>,
        mut decode: D,
    ) -> Result<Option<F>, PlayerError>
    where
        D: FnMut(Packet) -> Result<Vec<F>, PlayerError>,
    {
        loop {
            {
                let state = self.inner.lock();
                if state.aborted {
                    return Ok(None);
                }
                if !state.frames.is_empty() {
                    break;
                }
            }
            let Some(packet) = self.dequeue() else {
                return Ok(None);
            };
            let decoded = decode(packet)?;
            let mut state = self.inner.lock();
            state.frames.extend(decoded);
        }

        let mut state = self.inner.lock();
        let pts = match state.frames.front() {
            Some(frame) => frame.pts(),
            None => return Ok(None),
        };
        let now = Instant::now();

        let clock = state.clock;
        let mut due_in = match master.filter(|m| *m > 0.0) {
            Some(master_pts) => (pts - master_pts) / speed,
            None => match clock {
                None => {
                    state.clock = Some((now, pts));
                    0.0
                }
                Some((origin, base)) => {
                    let elapsed = now.duration_since(origin).as_secs_f64() * speed + base;
                    let lag = elapsed - pts;
                    if lag > CLOCK_REBASE_THRESHOLD {
                        // Fell far behind (paused, stalled, or seeked):
                        // restart the clock at this frame instead of
                        // bursting through the backlog.
                        state.clock = Some((now, pts));
                        0.0
                    } else {
                        -lag / speed
                    }
                }
            },
        };

        if state.frame_rate > 0.0 {
            if let Some(last) = state.last_emit {
                let interval = 1.0 / (state.frame_rate * speed);
                let since = now.duration_since(last).as_secs_f64();
                if since < interval {
                    due_in = due_in.max(interval - since);
                }
            }
        }

        if due_in > 0.001 {
            let park = Duration::from_secs_f64(due_in).min(POLL_INTERVAL);
            self.consumer.wait_for(&mut state, park);
            return Ok(None);
        }

        state.pts = pts;
        state.last_emit = Some(now);
        Ok(state.frames.front().cloned())
    }

    /// Commits consumption of the frame last returned by `sync`.
    pub fn pop(&self) {
        let mut state = self.inner.lock();
        state.frames.pop_front();
        if state.frames.is_empty() && state.packets.is_empty() {
            self.producer.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Clone, Debug, PartialEq)]
    struct TestFrame(f64);

    impl Timestamped for TestFrame {
        fn pts(&self) -> f64 {
            self.0
        }
    }

    fn queue() -> PacketQueue<TestFrame> {
        PacketQueue::new(Lookahead::default())
    }

    fn packet(pts: f64, size: usize) -> Packet {
        Packet::test_packet(0, pts, size)
    }

    #[test]
    fn bytes_track_queue_contents() {
        let q = queue();
        q.enqueue(packet(0.0, 100));
        q.enqueue(packet(0.1, 50));
        assert_eq!(q.bytes(), 150);

        let p = q.dequeue().expect("packet queued");
        assert_eq!(p.size(), 100);
        assert_eq!(q.bytes(), 50);

        q.clear();
        assert_eq!(q.bytes(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn dequeue_returns_none_after_abort() {
        let q = queue();
        q.enqueue(packet(0.0, 10));
        q.abort();
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn abort_unblocks_waiting_consumer() {
        let q = Arc::new(queue());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                // parks briefly, then observes the abort
                while !q.inner.lock().aborted {
                    if q.dequeue().is_some() {
                        panic!("queue was never filled");
                    }
                }
            })
        };
        thread::sleep(Duration::from_millis(20));
        q.abort();
        consumer.join().unwrap();
    }

    #[test]
    fn enough_by_count_and_span() {
        let q = queue();
        assert!(!q.enough());
        q.enqueue(packet(0.0, 1));
        q.enqueue(packet(1.5, 1));
        // two packets, but a wide PTS span
        assert!(q.enough());

        let q = queue();
        for i in 0..25 {
            q.enqueue(packet(i as f64 * 0.001, 1));
        }
        assert!(q.enough());
    }

    #[test]
    fn sync_emits_first_frame_immediately() {
        let q = queue();
        q.enqueue(packet(0.0, 10));
        let frame = q
            .sync(1.0, None, |p| Ok(vec![TestFrame(p.pts())]))
            .unwrap();
        assert_eq!(frame, Some(TestFrame(0.0)));
        // held until popped: a second sync re-offers the same frame
        let again = q.sync(1.0, None, |_| Ok(vec![])).unwrap();
        assert_eq!(again, Some(TestFrame(0.0)));
        q.pop();
        assert!(q.is_empty());
        assert_eq!(q.pts(), 0.0);
    }

    #[test]
    fn sync_waits_for_future_pts() {
        let q = queue();
        q.enqueue(packet(0.0, 10));
        q.enqueue(packet(5.0, 10));
        let first = q
            .sync(1.0, None, |p| Ok(vec![TestFrame(p.pts())]))
            .unwrap();
        assert_eq!(first, Some(TestFrame(0.0)));
        q.pop();
        // the 5-second frame is nowhere near due
        let second = q
            .sync(1.0, None, |p| Ok(vec![TestFrame(p.pts())]))
            .unwrap();
        assert_eq!(second, None);
        assert_eq!(q.pts(), 0.0);
    }

    #[test]
    fn sync_follows_master_clock() {
        let q = queue();
        q.enqueue(packet(2.0, 10));
        // master behind the frame: not due
        let held = q
            .sync(1.0, Some(1.0), |p| Ok(vec![TestFrame(p.pts())]))
            .unwrap();
        assert_eq!(held, None);
        // master caught up: due
        let due = q.sync(1.0, Some(2.5), |_| Ok(vec![])).unwrap();
        assert_eq!(due, Some(TestFrame(2.0)));
    }

    #[test]
    fn sync_propagates_decode_errors() {
        let q = queue();
        q.enqueue(packet(0.0, 10));
        let err = q
            .sync(1.0, None, |_| -> Result<Vec<TestFrame>, _> {
                Err(PlayerError::Resource("bad packet".into()))
            })
            .unwrap_err();
        assert_eq!(err, PlayerError::Resource("bad packet".into()));
    }

    #[test]
    fn finished_queue_drains_then_yields_none() {
        let q = queue();
        q.enqueue(packet(0.0, 10));
        q.finish();
        assert!(q.dequeue().is_some());
        assert!(q.dequeue().is_none());
        assert!(q.finished());
    }

    #[test]
    fn wait_for_empty_blocks_until_consumer_drains() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let q = Arc::new(queue());
        q.enqueue(packet(0.0, 10));
        let frame = q
            .sync(1.0, None, |p| Ok(vec![TestFrame(p.pts())]))
            .unwrap();
        assert!(frame.is_some());

        let drained = Arc::new(AtomicBool::new(false));
        let waiter = {
            let q = Arc::clone(&q);
            let drained = Arc::clone(&drained);
            thread::spawn(move || {
                q.wait_for_empty();
                drained.store(true, Ordering::SeqCst);
            })
        };
        thread::sleep(Duration::from_millis(20));
        // the undrained frame keeps the waiter blocked
        assert!(!drained.load(Ordering::SeqCst));
        q.pop();
        waiter.join().unwrap();
        assert!(drained.load(Ordering::SeqCst));
    }

    #[test]
    fn reset_releases_abort_and_zeroes_pts() {
        let q = queue();
        q.enqueue(packet(3.0, 10));
        let _ = q.sync(1.0, Some(4.0), |p| Ok(vec![TestFrame(p.pts())]));
        assert_eq!(q.pts(), 3.0);
        q.abort();
        q.reset();
        assert_eq!(q.pts(), 0.0);
        q.enqueue(packet(0.0, 10));
        assert!(q.dequeue().is_some());
    }
}
