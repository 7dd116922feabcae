//! Camera producer process ownership and the stream reading task.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::capture::{decoder, mjpeg::MjpegAssembler};
use crate::pipeline::FrameQueue;
use crate::shutdown::{Shutdown, ShutdownSignal};
use crate::CaptureConfig;

/// Bounded chunk size for producer stdout reads.
const READ_CHUNK: usize = 4096;

/// Grace period for producer wait and reader join during stop.
const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extractor already started")]
    AlreadyStarted,
    #[error("failed to spawn producer `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("producer has no stdout pipe")]
    NoStdout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Owns the external camera process and the task that turns its stdout
/// into decoded frames on the queue.
pub struct FrameExtractor {
    config: CaptureConfig,
    queue: Arc<FrameQueue>,
    state: State,
    shutdown: Option<Shutdown>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
}

impl FrameExtractor {
    pub fn new(config: CaptureConfig, queue: Arc<FrameQueue>) -> Self {
        Self {
            config,
            queue,
            state: State::Stopped,
            shutdown: None,
            child: None,
            reader: None,
        }
    }

    /// Launch the producer and the reading task.
    ///
    /// Valid only from the stopped state. A spawn failure is a startup
    /// resource-acquisition error and propagates.
    pub fn start(&mut self) -> Result<(), ExtractorError> {
        if self.state != State::Stopped {
            return Err(ExtractorError::AlreadyStarted);
        }
        self.state = State::Starting;

        let command = self.config.command.clone();
        let spawned = Command::new(&command)
            .args(["-t", "0"])
            .args(["--width", &self.config.width.to_string()])
            .args(["--height", &self.config.height.to_string()])
            .args(["--framerate", &self.config.fps.to_string()])
            .args(["--codec", "mjpeg"])
            .args(["--quality", &self.config.quality.to_string()])
            .args(["--output", "-"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                self.state = State::Stopped;
                return Err(ExtractorError::Spawn { command, source });
            }
        };

        let Some(stdout) = child.stdout.take() else {
            self.state = State::Stopped;
            return Err(ExtractorError::NoStdout);
        };

        info!(command = %command, width = self.config.width, height = self.config.height,
              fps = self.config.fps, "producer started");

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let queue = Arc::clone(&self.queue);
        self.reader = Some(tokio::spawn(async move {
            read_stream(stdout, &queue, signal).await;
        }));
        self.child = Some(child);
        self.shutdown = Some(shutdown);
        self.state = State::Running;
        Ok(())
    }

    /// True while the reading task is alive. The producer closing its
    /// output ends the task without any call to [`stop`].
    pub fn is_running(&self) -> bool {
        self.state == State::Running
            && self
                .reader
                .as_ref()
                .map(|handle| !handle.is_finished())
                .unwrap_or(false)
    }

    /// Halt reading and terminate the producer. Idempotent; completes
    /// cleanly even when the producer already died on its own.
    pub async fn stop(&mut self) {
        if self.state == State::Stopped {
            return;
        }
        self.state = State::Stopping;

        if let Some(shutdown) = self.shutdown.take() {
            shutdown.trigger();
        }

        if let Some(mut child) = self.child.take() {
            // Non-blocking kill signal, then a bounded wait for the exit.
            if let Err(e) = child.start_kill() {
                debug!("producer kill: {e}");
            }
            match tokio::time::timeout(STOP_GRACE, child.wait()).await {
                Ok(Ok(status)) => info!(%status, "producer exited"),
                Ok(Err(e)) => warn!("producer wait failed: {e}"),
                Err(_) => warn!("producer did not exit within grace period"),
            }
        }

        if let Some(handle) = self.reader.take() {
            if tokio::time::timeout(STOP_GRACE, handle).await.is_err() {
                warn!("reader task did not finish within grace period");
            }
        }

        self.state = State::Stopped;
    }
}

/// Pump an MJPEG byte stream into decoded frames on the queue.
///
/// Exits on shutdown, on EOF (producer terminated), or on a read error.
/// Decode failures and queue overflow are absorbed here: a corrupt
/// candidate is skipped, a full queue drops the frame, and in both cases
/// scanning continues with the next bytes.
pub async fn read_stream<R>(mut reader: R, queue: &FrameQueue, mut signal: ShutdownSignal)
where
    R: AsyncRead + Unpin,
{
    let mut assembler = MjpegAssembler::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut sequence: u64 = 0;

    loop {
        let n = tokio::select! {
            _ = signal.recv() => break,
            read = reader.read(&mut chunk) => match read {
                Ok(0) => {
                    info!("producer output closed, reader exiting");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("producer read failed: {e}");
                    break;
                }
            },
        };

        assembler.extend(&chunk[..n]);
        while let Some(jpeg) = assembler.next_frame() {
            sequence += 1;
            match decoder::decode_frame(&jpeg, sequence) {
                Ok(frame) => {
                    if !queue.offer(frame) {
                        trace!(sequence, "queue full, frame dropped");
                    }
                }
                Err(e) => debug!(sequence, "skipping undecodable frame: {e}"),
            }
        }
    }
}
