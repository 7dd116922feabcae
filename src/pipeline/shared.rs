//! Single-slot holder for the latest annotated frame.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::annotate::AnnotatedFrame;

/// Decouples annotator and render cadence: the writer replaces the held
/// frame atomically, the reader sees either the previous or the new one,
/// never a partial update.
#[derive(Default)]
pub struct SharedDisplayState {
    current: ArcSwapOption<AnnotatedFrame>,
}

impl SharedDisplayState {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Replace the held frame. The previous one is reclaimed once the
    /// last reader drops its handle.
    pub fn publish(&self, frame: AnnotatedFrame) {
        self.current.store(Some(Arc::new(frame)));
    }

    /// The most recently published frame, or None before the first publish.
    pub fn snapshot(&self) -> Option<Arc<AnnotatedFrame>> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    fn stamped_frame(seq: u64) -> AnnotatedFrame {
        // Every pixel carries the sequence so a torn frame is detectable.
        let shade = (seq % 251) as u8;
        AnnotatedFrame {
            image: image::RgbImage::from_pixel(16, 16, image::Rgb([shade, shade, shade])),
            annotations: Vec::new(),
            sequence: seq,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn snapshot_is_empty_before_first_publish() {
        let shared = SharedDisplayState::new();
        assert!(shared.snapshot().is_none());
    }

    #[test]
    fn publish_replaces_previous_value() {
        let shared = SharedDisplayState::new();
        shared.publish(stamped_frame(1));
        shared.publish(stamped_frame(2));
        let snap = shared.snapshot().unwrap();
        assert_eq!(snap.sequence, 2);
    }

    #[test]
    fn concurrent_snapshots_are_never_torn() {
        let shared = Arc::new(SharedDisplayState::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let shared = Arc::clone(&shared);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                for seq in 1..=5_000u64 {
                    shared.publish(stamped_frame(seq));
                }
                done.store(true, Ordering::Release);
            })
        };

        let reader = {
            let shared = Arc::clone(&shared);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut last_seen = 0u64;
                while !done.load(Ordering::Acquire) {
                    if let Some(snap) = shared.snapshot() {
                        let expected = (snap.sequence % 251) as u8;
                        assert!(snap
                            .image
                            .pixels()
                            .all(|p| p.0 == [expected, expected, expected]));
                        // Publishes are ordered, so sequences never regress.
                        assert!(snap.sequence >= last_seen);
                        last_seen = snap.sequence;
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
