//! End-to-end pipeline test: synthetic MJPEG stream in, annotated frames out.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use image::GrayImage;
use tokio::io::AsyncWriteExt;

use argus::annotate::{Annotator, Painter};
use argus::capture::read_stream;
use argus::detect::{
    BoundingBox, DetectParams, FaceDetector, FaceRecognizer, IdentityCatalog, RecognitionResult,
    TrainingSet,
};
use argus::pipeline::{FrameQueue, SharedDisplayState};
use argus::shutdown::Shutdown;
use argus::{DetectConfig, PipelineConfig};

struct OneBoxDetector;

impl FaceDetector for OneBoxDetector {
    fn name(&self) -> &'static str {
        "one-box"
    }

    fn detect(&mut self, _: &GrayImage, _: &DetectParams) -> Result<Vec<BoundingBox>> {
        Ok(vec![BoundingBox {
            x: 20,
            y: 20,
            width: 40,
            height: 40,
        }])
    }
}

struct ConstRecognizer {
    confidence: f32,
}

impl FaceRecognizer for ConstRecognizer {
    fn name(&self) -> &'static str {
        "const"
    }

    fn train(&mut self, _: &TrainingSet) -> Result<()> {
        Ok(())
    }

    fn predict(&self, _: &GrayImage) -> Result<RecognitionResult> {
        Ok(RecognitionResult {
            label: 0,
            confidence: self.confidence,
        })
    }
}

fn test_jpeg(shade: u8) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(160, 120, image::Rgb([shade, shade, shade]));
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .encode_image(&image)
        .expect("encode test jpeg");
    out
}

/// Feed three JPEG frames through reader, queue, and annotator; every
/// frame must come out annotated with `expected_label`.
async fn run_scenario(confidence: f32, expected_label: &str) {
    let queue = Arc::new(FrameQueue::new(10));
    let shared = Arc::new(SharedDisplayState::new());
    let shutdown = Shutdown::new();

    let annotator = Annotator::new(
        Box::new(OneBoxDetector),
        Box::new(ConstRecognizer { confidence }),
        IdentityCatalog::from_names(vec!["Alice".into()]),
        &DetectConfig::default(),
        &PipelineConfig::default(),
        Painter::without_font(),
    );
    let annotator_handle = {
        let queue = Arc::clone(&queue);
        let shared = Arc::clone(&shared);
        let signal = shutdown.subscribe();
        tokio::task::spawn_blocking(move || annotator.run(queue, shared, signal))
    };

    let (mut producer, consumer) = tokio::io::duplex(64 * 1024);
    let reader_handle = {
        let queue = Arc::clone(&queue);
        let signal = shutdown.subscribe();
        tokio::spawn(async move { read_stream(consumer, &queue, signal).await })
    };

    // Pace the frames so every publish is observable through the
    // single-slot display state.
    for sequence in 1..=3u64 {
        producer
            .write_all(&test_jpeg(sequence as u8 * 60))
            .await
            .expect("write frame");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(snap) = shared.snapshot() {
                if snap.sequence == sequence {
                    assert_eq!(snap.annotations.len(), 1);
                    assert_eq!(snap.annotations[0].text, expected_label);
                    break;
                }
                assert!(snap.sequence < sequence, "sequence skipped");
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "frame {sequence} never published"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // Producer gone: the reader exits on EOF, the annotator on shutdown.
    drop(producer);
    reader_handle.await.expect("reader task");
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), annotator_handle)
        .await
        .expect("annotator join timed out")
        .expect("annotator task");

    let (offered, dropped, taken) = queue.stats();
    assert_eq!(offered, 3);
    assert_eq!(dropped, 0);
    assert_eq!(taken, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn confident_recognition_labels_every_frame() {
    run_scenario(10.0, "Alice").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn weak_recognition_labels_every_frame_unknown() {
    run_scenario(80.0, "Unknown").await;
}
