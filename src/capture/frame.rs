use std::time::Instant;

use bytes::Bytes;

/// Decoded frame data with zero-copy semantics
#[derive(Clone)]
pub struct DecodedFrame {
    /// Immutable RGB24 pixel data - can be shared across threads without copying
    pub data: Bytes,

    pub width: u32,
    pub height: u32,

    /// Stream arrival order, 1-based
    pub sequence: u64,

    /// Decode timestamp for latency tracking
    pub timestamp: Instant,
}

impl DecodedFrame {
    pub fn new(data: Bytes, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Reconstruct an owned image buffer for annotation.
    pub fn to_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}
