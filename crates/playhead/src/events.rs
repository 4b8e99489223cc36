//! Deferred control events and the observable event stream.
//!
//! Two mechanisms live side by side:
//!
//! - [`PlayerEvent`]: typed notifications delivered over a channel to the
//!   owner, serially, in dispatch order.
//! - [`EventQueue`]: deferred control callbacks. A command issued before
//!   the media loads, or one that must wait for a worker tick (a `seeked`
//!   signal waits until the demuxer has cleared the pending position), is
//!   queued as a `FnMut(tick) -> handled` callable and drained FIFO at
//!   safe points. `tick` is true when the drain runs from a worker cycle
//!   that produced a frame; an unhandled event stops the drain so order is
//!   preserved.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::media::{AudioFrame, MediaStatus, PlayerError, State, VideoFrame};

/// Notifications emitted by the player.
///
/// Frame events are emitted from worker threads; everything else follows
/// the dispatch order of the state machine. Consumers drain the channel on
/// a thread of their choosing.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    SourceChanged(String),
    StateChanged(State),
    MediaStatusChanged(MediaStatus),
    /// Duration in milliseconds.
    DurationChanged(i64),
    SeekableChanged(bool),
    VideoFrameRateChanged(f64),
    SpeedChanged(f64),
    ErrorOccurred(PlayerError),
    /// Playback started; position in milliseconds.
    Played(i64),
    /// Playback paused; position in milliseconds.
    Paused(i64),
    /// Playback stopped; position in milliseconds.
    Stopped(i64),
    /// A seek completed; position in milliseconds.
    Seeked(i64),
    /// A decoded video frame, or `None` as a render reset when playback
    /// stops or the session tears down.
    VideoFrame(Option<VideoFrame>),
    AudioFrame(AudioFrame),
}

type Deferred = Box<dyn FnMut(bool) -> bool + Send>;

/// FIFO list of deferred control callbacks.
#[derive(Default)]
pub(crate) struct EventQueue {
    list: Mutex<VecDeque<Deferred>>,
}

impl EventQueue {
    pub fn push(&self, event: impl FnMut(bool) -> bool + Send + 'static) {
        self.list.lock().push_back(Box::new(event));
    }

    /// Drops all queued callbacks. Callbacks hold strong references to the
    /// controller, so a torn-down session must not leave them queued.
    pub fn clear(&self) {
        self.list.lock().clear();
    }

    /// Drains the queue in order, invoking each callback with the lock
    /// released. A callback returning false is put back at the front and
    /// the drain stops. Skipped entirely while a seek is pending so no
    /// intermediate positions leak out mid-seek.
    pub fn process(&self, tick: bool, seeking: bool) {
        if seeking {
            return;
        }
        loop {
            let mut event = {
                let mut list = self.list.lock();
                match list.pop_front() {
                    Some(event) => event,
                    None => return,
                }
            };
            if !event(tick) {
                self.list.lock().push_front(event);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn drains_in_fifo_order() {
        let queue = EventQueue::default();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            queue.push(move |_| {
                order.lock().push(i);
                true
            });
        }
        queue.process(true, false);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn unhandled_event_stops_the_drain() {
        let queue = EventQueue::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        queue.push(move |tick| {
            c.fetch_add(1, Ordering::SeqCst);
            tick
        });
        let c = Arc::clone(&calls);
        queue.push(move |_| {
            c.fetch_add(10, Ordering::SeqCst);
            true
        });

        // first event defers; the second must not run
        queue.process(false, false);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // a real tick lets both through, in order
        queue.process(true, false);
        assert_eq!(calls.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn skipped_while_seeking() {
        let queue = EventQueue::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        queue.push(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });
        queue.process(true, true);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        queue.process(true, false);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_can_push_more_events() {
        let queue = Arc::new(EventQueue::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let q = Arc::clone(&queue);
        let c = Arc::clone(&calls);
        queue.push(move |_| {
            let c = Arc::clone(&c);
            q.push(move |_| {
                c.fetch_add(10, Ordering::SeqCst);
                true
            });
            true
        });

        queue.process(true, false);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }
}
