//! Stub capability backends.
//!
//! They keep the pipeline runnable without any model files: the detector
//! reports no faces and the recognizer never crosses a confidence
//! threshold, so every frame passes through unannotated.

use color_eyre::Result;
use image::GrayImage;

use crate::detect::backend::{
    BoundingBox, DetectParams, FaceDetector, FaceRecognizer, RecognitionResult,
};
use crate::detect::catalog::TrainingSet;

#[derive(Default)]
pub struct StubDetector;

impl FaceDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _image: &GrayImage, _params: &DetectParams) -> Result<Vec<BoundingBox>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct StubRecognizer;

impl FaceRecognizer for StubRecognizer {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn train(&mut self, _dataset: &TrainingSet) -> Result<()> {
        Ok(())
    }

    fn predict(&self, _region: &GrayImage) -> Result<RecognitionResult> {
        Ok(RecognitionResult {
            label: 0,
            confidence: f32::INFINITY,
        })
    }
}
