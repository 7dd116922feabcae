//! Incremental JPEG delimiting over an unbounded MJPEG byte stream.
//!
//! The stream carries back-to-back JPEG images with no length framing;
//! frame boundaries are determined solely by the SOI/EOI marker pairs.

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

/// Image-start marker (SOI).
pub const START_MARKER: [u8; 2] = [0xFF, 0xD8];
/// Image-end marker (EOI).
pub const END_MARKER: [u8; 2] = [0xFF, 0xD9];

/// Hard cap on a single pending frame. A start marker with this many bytes
/// and no end marker means a malformed stream; the pending bytes are
/// discarded so the buffer cannot grow without bound.
const MAX_PENDING_BYTES: usize = 10 * 1024 * 1024;

/// Accumulates stream chunks and yields complete JPEG frames.
///
/// Scan rules per chunk boundary:
/// - no start marker: the buffer holds nothing salvageable and is discarded,
///   except a trailing `0xFF` that may be the first half of a split marker
/// - start marker without end marker: bytes from the start marker on are a
///   frame in progress and are retained; the stray prefix is discarded
/// - both markers: the delimited range is yielded and scanning resumes on
///   the remainder, since one read may carry several frames
#[derive(Default)]
pub struct MjpegAssembler {
    buf: BytesMut,
}

impl MjpegAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64 * 1024),
        }
    }

    /// Append a newly read chunk.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered (stray prefix plus any frame in progress).
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        let Some(start) = find(&self.buf, &START_MARKER) else {
            // Nothing before an unseen start marker can belong to a frame.
            // Keep a trailing 0xFF: it may be a start marker split across reads.
            if self.buf.last() == Some(&0xFF) {
                let tail = self.buf.len() - 1;
                self.buf.advance(tail);
            } else {
                self.buf.clear();
            }
            return None;
        };

        // Drop stray bytes ahead of the frame.
        self.buf.advance(start);

        match find(&self.buf[START_MARKER.len()..], &END_MARKER) {
            Some(pos) => {
                let end = START_MARKER.len() + pos + END_MARKER.len();
                Some(self.buf.split_to(end).freeze())
            }
            None => {
                if self.buf.len() > MAX_PENDING_BYTES {
                    warn!(
                        pending = self.buf.len(),
                        "discarding oversize frame in progress"
                    );
                    self.buf.clear();
                }
                None
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8; 2]) -> Option<usize> {
    haystack
        .windows(2)
        .position(|window| window == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(body: &[u8]) -> Vec<u8> {
        let mut frame = START_MARKER.to_vec();
        frame.extend_from_slice(body);
        frame.extend_from_slice(&END_MARKER);
        frame
    }

    fn drain(assembler: &mut MjpegAssembler) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Some(frame) = assembler.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn preserves_order_regardless_of_chunking() {
        let f1 = framed(b"first");
        let f2 = framed(b"second");
        let f3 = framed(b"third");
        let mut stream = Vec::new();
        stream.extend_from_slice(&f1);
        stream.extend_from_slice(&f2);
        stream.extend_from_slice(&f3);

        // Every chunk size, down to one-byte reads that split the markers.
        for chunk_size in 1..=stream.len() {
            let mut assembler = MjpegAssembler::new();
            let mut out = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                assembler.extend(chunk);
                out.extend(drain(&mut assembler));
            }
            assert_eq!(out.len(), 3, "chunk size {}", chunk_size);
            assert_eq!(&out[0][..], &f1[..]);
            assert_eq!(&out[1][..], &f2[..]);
            assert_eq!(&out[2][..], &f3[..]);
        }
    }

    #[test]
    fn retains_partial_frame_across_reads() {
        let mut assembler = MjpegAssembler::new();

        assembler.extend(&START_MARKER);
        assembler.extend(b"body-part-one");
        assert!(assembler.next_frame().is_none());

        assembler.extend(b"body-part-two");
        assert!(assembler.next_frame().is_none());

        assembler.extend(&END_MARKER);
        let frame = assembler.next_frame().expect("complete frame");
        assert_eq!(&frame[..], &framed(b"body-part-onebody-part-two")[..]);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn discards_buffer_without_start_marker() {
        let mut assembler = MjpegAssembler::new();
        assembler.extend(b"no markers here at all");
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn keeps_trailing_half_marker_on_discard() {
        let mut assembler = MjpegAssembler::new();
        // Chunk ends with the first byte of a start marker.
        assembler.extend(b"garbage\xFF");
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.pending(), 1);

        // Second half arrives with the rest of the frame.
        assembler.extend(b"\xD8body\xFF\xD9");
        let frame = assembler.next_frame().expect("frame split inside marker");
        assert_eq!(&frame[..], &framed(b"body")[..]);
    }

    #[test]
    fn discards_stray_bytes_between_frames() {
        let mut assembler = MjpegAssembler::new();
        let mut stream = b"<garbage>".to_vec();
        stream.extend_from_slice(&framed(b"one"));
        stream.extend_from_slice(b"<garbage2>");
        stream.extend_from_slice(&framed(b"two"));
        assembler.extend(&stream);

        let frames = drain(&mut assembler);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], &framed(b"one")[..]);
        assert_eq!(&frames[1][..], &framed(b"two")[..]);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn yields_multiple_frames_from_one_read() {
        let mut assembler = MjpegAssembler::new();
        let mut stream = framed(b"a");
        stream.extend_from_slice(&framed(b"b"));
        stream.extend_from_slice(&framed(b"c"));
        assembler.extend(&stream);

        assert_eq!(drain(&mut assembler).len(), 3);
    }

    #[test]
    fn oversize_pending_frame_is_discarded_and_recovers() {
        let mut assembler = MjpegAssembler::new();
        assembler.extend(&START_MARKER);
        assembler.extend(&vec![0u8; MAX_PENDING_BYTES + 1]);
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.pending(), 0);

        // A well-formed frame afterwards still comes through.
        assembler.extend(&framed(b"recovered"));
        let frame = assembler.next_frame().expect("frame after discard");
        assert_eq!(&frame[..], &framed(b"recovered")[..]);
    }
}
