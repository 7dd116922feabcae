pub mod annotate;
pub mod capture;
pub mod detect;
pub mod display;
pub mod pipeline;
pub mod shutdown;

use std::path::PathBuf;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub pipeline: PipelineConfig,
    pub detect: DetectConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera producer command. Its stdout must be a raw MJPEG pipe.
    pub command: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// MJPEG quality parameter passed to the producer.
    pub quality: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: "libcamera-vid".into(),
            width: 640,
            height: 480,
            fps: 30,
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// FrameQueue capacity. Frames offered beyond this are dropped.
    pub queue_capacity: usize,
    /// Bounded wait used by the annotator when the queue is empty, in ms.
    /// Also the shutdown responsiveness bound for that task.
    pub take_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            take_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Detector backend name resolved by `detect::backends::create_detector`.
    pub detector: String,
    /// Recognizer backend name resolved by `detect::backends::create_recognizer`.
    pub recognizer: String,
    /// Dataset root: one subdirectory per identity. Absent means an empty
    /// catalog and every detection labeled "Unknown".
    pub dataset_dir: Option<PathBuf>,
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_width: u32,
    pub min_height: u32,
    /// Recognition confidence threshold. Confidence is distance-like:
    /// lower is a stronger match, so a prediction counts as recognized
    /// when its confidence is strictly below this value.
    pub confidence_threshold: f32,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            detector: "stub".into(),
            recognizer: "stub".into(),
            dataset_dir: None,
            scale_factor: 1.1,
            min_neighbors: 10,
            min_width: 40,
            min_height: 40,
            confidence_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// FPS counter reset interval in ms.
    pub fps_reset_ms: u64,
    /// Explicit font path for overlays. When unset, common system font
    /// locations are searched; no font means boxes without text.
    pub font_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps_reset_ms: 2000,
            font_path: None,
        }
    }
}

/// Load configuration: defaults, overlaid by an optional `argus.toml`,
/// overlaid by `ARGUS_*` environment variables.
pub fn load_config() -> Result<Config> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("argus").required(false))
        .add_source(config::Environment::with_prefix("ARGUS").separator("__"))
        .build()?;
    Ok(settings.try_deserialize()?)
}
