//! Argus: MJPEG face recognition pipeline with an SDL2 display.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};

use argus::annotate::{Annotator, Painter};
use argus::capture::FrameExtractor;
use argus::detect::{self, backends};
use argus::display::Sdl2Display;
use argus::pipeline::{FrameQueue, SharedDisplayState};
use argus::shutdown::Shutdown;

/// Bounded wait for the annotator task during teardown.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("argus=info")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("argus launching");

    let config = argus::load_config()?;

    // Offline collaborators: catalog and recognizer training happen once,
    // before any pipeline task starts.
    let (catalog, training) = detect::load_dataset(config.detect.dataset_dir.as_deref())?;
    let detector = backends::create_detector(&config.detect)?;
    let mut recognizer = backends::create_recognizer(&config.detect)?;
    recognizer.train(&training)?;

    let painter = Painter::new(config.display.font_path.as_deref());

    let queue = Arc::new(FrameQueue::new(config.pipeline.queue_capacity));
    let shared = Arc::new(SharedDisplayState::new());
    let shutdown = Shutdown::new();

    // External interrupt takes the same teardown path as the quit key.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received");
                shutdown.trigger();
            }
        });
    }

    let mut extractor = FrameExtractor::new(config.capture.clone(), Arc::clone(&queue));
    extractor.start()?;

    let annotator = Annotator::new(
        detector,
        recognizer,
        catalog,
        &config.detect,
        &config.pipeline,
        painter.clone(),
    );
    let annotator_handle = {
        let queue = Arc::clone(&queue);
        let shared = Arc::clone(&shared);
        let signal = shutdown.subscribe();
        tokio::task::spawn_blocking(move || annotator.run(queue, shared, signal))
    };

    // The render surface lives on the main thread.
    let sdl_context = sdl2::init().map_err(|e| eyre!(e))?;
    let mut display = Sdl2Display::new(&sdl_context, config.display.width, config.display.height)?;
    display.run(&sdl_context, &shared, &painter, &config.display, &shutdown)?;

    // Teardown: signal every task, stop the producer, join the annotator.
    shutdown.trigger();
    extractor.stop().await;
    if tokio::time::timeout(JOIN_TIMEOUT, annotator_handle)
        .await
        .is_err()
    {
        warn!("annotator did not stop within the join timeout");
    }

    let (offered, dropped, taken) = queue.stats();
    info!(offered, dropped, taken, "argus shutting down");
    Ok(())
}
