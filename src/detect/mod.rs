pub mod backend;
pub mod backends;
pub mod catalog;

pub use backend::{BoundingBox, DetectParams, FaceDetector, FaceRecognizer, RecognitionResult};
pub use catalog::{load_dataset, IdentityCatalog, TrainingSet};
