//! Built-in capability backends and their name-based factory.

pub mod stub;

use color_eyre::{eyre::eyre, Result};

use crate::detect::backend::{FaceDetector, FaceRecognizer};
use crate::DetectConfig;

pub use stub::{StubDetector, StubRecognizer};

pub fn create_detector(config: &DetectConfig) -> Result<Box<dyn FaceDetector>> {
    match config.detector.as_str() {
        "stub" => Ok(Box::new(StubDetector)),
        other => Err(eyre!("unknown detector backend '{other}'")),
    }
}

pub fn create_recognizer(config: &DetectConfig) -> Result<Box<dyn FaceRecognizer>> {
    match config.recognizer.as_str() {
        "stub" => Ok(Box::new(StubRecognizer)),
        other => Err(eyre!("unknown recognizer backend '{other}'")),
    }
}
