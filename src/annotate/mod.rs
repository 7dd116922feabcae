pub mod annotator;
pub mod draw;

pub use annotator::{AnnotatedFrame, Annotation, Annotator};
pub use draw::Painter;
