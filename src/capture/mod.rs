pub mod decoder;
pub mod extractor;
pub mod frame;
pub mod mjpeg;

pub use extractor::{read_stream, ExtractorError, FrameExtractor};
pub use frame::DecodedFrame;
pub use mjpeg::MjpegAssembler;
