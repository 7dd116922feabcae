//! Frame annotation stage: detect, recognize, draw, publish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::{eyre::eyre, Result};
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::annotate::draw::{Painter, GREEN, RED};
use crate::capture::DecodedFrame;
use crate::detect::{BoundingBox, DetectParams, FaceDetector, FaceRecognizer, IdentityCatalog};
use crate::pipeline::{FrameQueue, SharedDisplayState};
use crate::shutdown::ShutdownSignal;
use crate::{DetectConfig, PipelineConfig};

const BOX_THICKNESS: u32 = 4;
const LABEL_SIZE: f32 = 24.0;

/// One drawn detection: the box plus the resolved label text.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub text: String,
    pub recognized: bool,
}

/// A frame with boxes and labels burned in.
pub struct AnnotatedFrame {
    pub image: RgbImage,
    pub annotations: Vec<Annotation>,
    pub sequence: u64,
    pub timestamp: Instant,
}

/// Consumes decoded frames and publishes annotated ones.
pub struct Annotator {
    detector: Box<dyn FaceDetector>,
    recognizer: Box<dyn FaceRecognizer>,
    catalog: IdentityCatalog,
    params: DetectParams,
    confidence_threshold: f32,
    take_timeout: Duration,
    painter: Painter,
}

impl Annotator {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        recognizer: Box<dyn FaceRecognizer>,
        catalog: IdentityCatalog,
        detect_config: &DetectConfig,
        pipeline_config: &PipelineConfig,
        painter: Painter,
    ) -> Self {
        Self {
            detector,
            recognizer,
            catalog,
            params: DetectParams::from(detect_config),
            confidence_threshold: detect_config.confidence_threshold,
            take_timeout: Duration::from_millis(pipeline_config.take_timeout_ms),
            painter,
        }
    }

    /// Blocking consumer loop. Every wait is bounded by the take timeout,
    /// so shutdown is observed within one cycle.
    pub fn run(
        mut self,
        queue: Arc<FrameQueue>,
        shared: Arc<SharedDisplayState>,
        signal: ShutdownSignal,
    ) {
        info!(
            detector = self.detector.name(),
            recognizer = self.recognizer.name(),
            identities = self.catalog.len(),
            "annotator running"
        );

        let mut published: u64 = 0;
        while !signal.is_shutdown() {
            let Some(frame) = queue.take(self.take_timeout) else {
                continue;
            };
            let sequence = frame.sequence;
            match self.annotate(frame) {
                Ok(annotated) => {
                    shared.publish(annotated);
                    published += 1;
                }
                // A capability fault costs this frame its annotation, nothing more.
                Err(e) => warn!(sequence, "skipping frame: {e}"),
            }
        }
        info!(published, "annotator stopped");
    }

    /// Annotate one frame: detect on the grayscale view, recognize each
    /// boxed region, burn in boxes and labels.
    pub fn annotate(&mut self, frame: DecodedFrame) -> Result<AnnotatedFrame> {
        let mut image = frame
            .to_image()
            .ok_or_else(|| eyre!("frame pixel buffer does not match its dimensions"))?;
        let gray = image::imageops::grayscale(&image);

        let boxes = self.detector.detect(&gray, &self.params)?;
        let mut annotations = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            let region = image::imageops::crop_imm(&gray, bbox.x, bbox.y, bbox.width, bbox.height)
                .to_image();
            let recognition = self.recognizer.predict(&region)?;

            let resolved = if recognition.confidence < self.confidence_threshold {
                self.catalog.resolve(recognition.label)
            } else {
                None
            };

            let (text, recognized) = match resolved {
                Some(name) => {
                    info!(
                        name,
                        confidence = recognition.confidence,
                        "recognized"
                    );
                    (name.to_string(), true)
                }
                None => {
                    debug!(confidence = recognition.confidence, "unknown face");
                    ("Unknown".to_string(), false)
                }
            };

            self.painter.draw_box(&mut image, &bbox, RED, BOX_THICKNESS);
            let label_color = if recognized { GREEN } else { RED };
            let label_y = bbox.y.saturating_sub(LABEL_SIZE as u32 + 2) as i32;
            self.painter
                .draw_text(&mut image, &text, bbox.x as i32, label_y, LABEL_SIZE, label_color);

            annotations.push(Annotation {
                bbox,
                text,
                recognized,
            });
        }

        Ok(AnnotatedFrame {
            image,
            annotations,
            sequence: frame.sequence,
            timestamp: frame.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use color_eyre::eyre::eyre;
    use image::GrayImage;

    use crate::detect::{RecognitionResult, TrainingSet};
    use crate::shutdown::Shutdown;

    struct FixedDetector {
        bbox: BoundingBox,
    }

    impl FaceDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&mut self, _: &GrayImage, _: &DetectParams) -> Result<Vec<BoundingBox>> {
            Ok(vec![self.bbox])
        }
    }

    struct FixedRecognizer {
        label: u32,
        confidence: f32,
    }

    impl FaceRecognizer for FixedRecognizer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn train(&mut self, _: &TrainingSet) -> Result<()> {
            Ok(())
        }

        fn predict(&self, _: &GrayImage) -> Result<RecognitionResult> {
            Ok(RecognitionResult {
                label: self.label,
                confidence: self.confidence,
            })
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn detect(&mut self, _: &GrayImage, _: &DetectParams) -> Result<Vec<BoundingBox>> {
            Err(eyre!("capability fault"))
        }
    }

    fn test_frame(sequence: u64) -> DecodedFrame {
        let image = RgbImage::from_pixel(64, 64, image::Rgb([80, 80, 80]));
        DecodedFrame::new(Bytes::from(image.into_raw()), 64, 64, sequence)
    }

    fn test_bbox() -> BoundingBox {
        BoundingBox {
            x: 10,
            y: 10,
            width: 20,
            height: 20,
        }
    }

    fn annotator_with(confidence: f32, names: Vec<String>) -> Annotator {
        Annotator::new(
            Box::new(FixedDetector { bbox: test_bbox() }),
            Box::new(FixedRecognizer {
                label: 0,
                confidence,
            }),
            IdentityCatalog::from_names(names),
            &DetectConfig::default(),
            &PipelineConfig::default(),
            Painter::without_font(),
        )
    }

    #[test]
    fn confident_match_resolves_to_catalog_name() {
        let mut annotator = annotator_with(10.0, vec!["Alice".into()]);
        let annotated = annotator.annotate(test_frame(1)).unwrap();

        assert_eq!(annotated.annotations.len(), 1);
        assert_eq!(annotated.annotations[0].text, "Alice");
        assert!(annotated.annotations[0].recognized);
        // The box outline is burned in.
        assert_eq!(*annotated.image.get_pixel(10, 10), RED);
    }

    #[test]
    fn weak_match_is_unknown() {
        let mut annotator = annotator_with(80.0, vec!["Alice".into()]);
        let annotated = annotator.annotate(test_frame(1)).unwrap();

        assert_eq!(annotated.annotations[0].text, "Unknown");
        assert!(!annotated.annotations[0].recognized);
    }

    #[test]
    fn unresolvable_label_is_unknown_despite_confidence() {
        // Confident prediction, but the catalog is empty.
        let mut annotator = annotator_with(10.0, Vec::new());
        let annotated = annotator.annotate(test_frame(1)).unwrap();

        assert_eq!(annotated.annotations[0].text, "Unknown");
        assert!(!annotated.annotations[0].recognized);
    }

    #[test]
    fn detector_fault_fails_the_frame_only() {
        let mut annotator = Annotator::new(
            Box::new(FailingDetector),
            Box::new(FixedRecognizer {
                label: 0,
                confidence: 10.0,
            }),
            IdentityCatalog::empty(),
            &DetectConfig::default(),
            &PipelineConfig::default(),
            Painter::without_font(),
        );
        assert!(annotator.annotate(test_frame(1)).is_err());
    }

    #[test]
    fn run_publishes_in_dequeue_order_and_stops_on_signal() {
        let queue = Arc::new(FrameQueue::new(10));
        let shared = Arc::new(SharedDisplayState::new());
        let shutdown = Shutdown::new();

        let annotator = annotator_with(10.0, vec!["Alice".into()]);
        let handle = {
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&shared);
            let signal = shutdown.subscribe();
            std::thread::spawn(move || annotator.run(queue, shared, signal))
        };

        for seq in 1..=3 {
            assert!(queue.offer(test_frame(seq)));
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(snap) = shared.snapshot() {
                if snap.sequence == 3 {
                    assert_eq!(snap.annotations[0].text, "Alice");
                    break;
                }
            }
            assert!(Instant::now() < deadline, "annotator never caught up");
            std::thread::sleep(Duration::from_millis(5));
        }

        shutdown.trigger();
        handle.join().unwrap();
    }
}
