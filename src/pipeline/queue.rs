//! Bounded frame handoff between the reader and the annotator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam::utils::CachePadded;
use flume::{RecvTimeoutError, TrySendError};

use crate::capture::DecodedFrame;

/// Bounded FIFO that trades completeness for freshness: a full queue
/// drops the offered frame instead of blocking the reader.
pub struct FrameQueue {
    tx: flume::Sender<DecodedFrame>,
    rx: flume::Receiver<DecodedFrame>,
    stats: CachePadded<Stats>,
}

#[derive(Default)]
struct Stats {
    frames_offered: AtomicU64,
    frames_dropped: AtomicU64,
    frames_taken: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self {
            tx,
            rx,
            stats: CachePadded::new(Stats::default()),
        }
    }

    /// Producer: non-blocking offer. Returns false when the frame was
    /// dropped because the queue is at capacity.
    pub fn offer(&self, frame: DecodedFrame) -> bool {
        self.stats.frames_offered.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Consumer: wait up to `timeout` for the next frame.
    pub fn take(&self, timeout: Duration) -> Option<DecodedFrame> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => {
                self.stats.frames_taken.fetch_add(1, Ordering::Relaxed);
                Some(frame)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// (offered, dropped, taken)
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.frames_offered.load(Ordering::Relaxed),
            self.stats.frames_dropped.load(Ordering::Relaxed),
            self.stats.frames_taken.load(Ordering::Relaxed),
        )
    }
}
