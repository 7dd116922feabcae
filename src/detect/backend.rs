//! Detection and recognition capability seams.
//!
//! The pipeline treats both algorithms as opaque: a detector maps a
//! grayscale image to bounding boxes, a recognizer maps a boxed region to
//! a labeled confidence. Implementations are substitutable and mockable.

use color_eyre::Result;
use image::GrayImage;

use crate::detect::catalog::TrainingSet;
use crate::DetectConfig;

/// Rectangle flagged by a detector, in pixel coordinates of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Recognizer output for one boxed region. Confidence is distance-like:
/// lower means a stronger match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionResult {
    pub label: u32,
    pub confidence: f32,
}

/// Detector tuning, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct DetectParams {
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl From<&DetectConfig> for DetectParams {
    fn from(cfg: &DetectConfig) -> Self {
        Self {
            scale_factor: cfg.scale_factor,
            min_neighbors: cfg.min_neighbors,
            min_width: cfg.min_width,
            min_height: cfg.min_height,
        }
    }
}

/// Face detector capability: grayscale image in, boxes out.
///
/// Zero boxes is a normal result, not an error; an `Err` is a capability
/// fault that costs that frame its annotation.
pub trait FaceDetector: Send {
    fn name(&self) -> &'static str;

    fn detect(&mut self, image: &GrayImage, params: &DetectParams) -> Result<Vec<BoundingBox>>;
}

/// Face recognizer capability: boxed grayscale region in, labeled
/// confidence out. Trained once before the pipeline starts.
pub trait FaceRecognizer: Send {
    fn name(&self) -> &'static str;

    fn train(&mut self, dataset: &TrainingSet) -> Result<()>;

    fn predict(&self, region: &GrayImage) -> Result<RecognitionResult>;
}
