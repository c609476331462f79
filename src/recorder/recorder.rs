//! Recorder
//!
//! Drives an acquired stream into periodic chunks and assembles them into a
//! single recording on stop. Chunk emission order is preserved through
//! assembly.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::state::{RecorderState, Recording, RecordingOptions};
use crate::capture::{CaptureConstraints, CaptureError, CaptureSource, MediaStream};

/// Errors that can occur while recording
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unsupported recording format: {0}")]
    UnsupportedFormat(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording worker failed: {0}")]
    Worker(String),
}

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Recording started
    Started,
    /// A chunk was cut from the stream
    Chunk { index: usize, len: usize },
    /// Recording stopped and was assembled
    Stopped { chunk_count: usize, bytes: usize },
    /// Error occurred while reading the stream
    Error(String),
}

struct Worker {
    handle: JoinHandle<Vec<Vec<u8>>>,
    stop_tx: oneshot::Sender<()>,
    options: RecordingOptions,
    started: Instant,
}

/// Records one stream at a time into timed chunks
pub struct Recorder {
    state: Arc<RwLock<RecorderState>>,
    event_tx: broadcast::Sender<RecorderEvent>,
    worker: Option<Worker>,
}

impl Recorder {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(RecorderState::Idle)),
            event_tx,
            worker: None,
        }
    }

    /// Get the current recorder state
    pub fn state(&self) -> RecorderState {
        *self.state.read()
    }

    /// Subscribe to recorder events
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    /// Start recording from the source.
    ///
    /// The requested media type is verified before anything is acquired;
    /// an unsupported type fails explicitly and leaves state untouched.
    pub async fn start(
        &mut self,
        source: &dyn CaptureSource,
        constraints: &CaptureConstraints,
        options: RecordingOptions,
    ) -> Result<(), RecordError> {
        if *self.state.read() != RecorderState::Idle {
            return Err(RecordError::AlreadyRecording);
        }

        if !options.media_type.is_supported_source() {
            return Err(RecordError::UnsupportedFormat(options.media_type.to_string()));
        }

        let stream = source.acquire(constraints, &options).await?;
        tracing::info!("recording {} stream as {}", stream.label(), options.media_type);

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(chunk_loop(
            stream,
            options.timeslice,
            stop_rx,
            self.event_tx.clone(),
        ));

        self.worker = Some(Worker {
            handle,
            stop_tx,
            options,
            started: Instant::now(),
        });
        *self.state.write() = RecorderState::Recording;
        let _ = self.event_tx.send(RecorderEvent::Started);

        Ok(())
    }

    /// Stop recording and assemble the chunks, in emission order, into one
    /// recording tagged with the source media type. The chunk buffer is
    /// consumed by assembly.
    pub async fn stop(&mut self) -> Result<Recording, RecordError> {
        if *self.state.read() != RecorderState::Recording {
            return Err(RecordError::NotRecording);
        }
        let Some(worker) = self.worker.take() else {
            return Err(RecordError::NotRecording);
        };

        *self.state.write() = RecorderState::Stopping;
        let _ = worker.stop_tx.send(());

        let chunks = match worker.handle.await {
            Ok(chunks) => chunks,
            Err(e) => {
                *self.state.write() = RecorderState::Idle;
                return Err(RecordError::Worker(e.to_string()));
            }
        };

        let chunk_count = chunks.len();
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }
        drop(chunks);

        let recording = Recording {
            data,
            media_type: worker.options.media_type.clone(),
            chunk_count,
            duration: worker.started.elapsed(),
        };

        *self.state.write() = RecorderState::Idle;
        let _ = self.event_tx.send(RecorderEvent::Stopped {
            chunk_count,
            bytes: recording.len(),
        });
        tracing::info!(
            "recording stopped: {} chunks, {} bytes, {:?}",
            chunk_count,
            recording.len(),
            recording.duration
        );

        Ok(recording)
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the stream continuously, cutting the buffered bytes into a chunk on
/// every timeslice tick. Returns the ordered chunk list.
async fn chunk_loop(
    mut stream: MediaStream,
    timeslice: std::time::Duration,
    mut stop_rx: oneshot::Receiver<()>,
    event_tx: broadcast::Sender<RecorderEvent>,
) -> Vec<Vec<u8>> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    let mut eof = false;

    let mut ticker = tokio::time::interval(timeslice);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.reset();

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                if !current.is_empty() {
                    let index = chunks.len();
                    let len = current.len();
                    chunks.push(std::mem::take(&mut current));
                    let _ = event_tx.send(RecorderEvent::Chunk { index, len });
                }
            }
            read = stream.read(&mut buf), if !eof => {
                match read {
                    Ok(0) => eof = true,
                    Ok(n) => current.extend_from_slice(&buf[..n]),
                    Err(e) => {
                        let _ = event_tx.send(RecorderEvent::Error(e.to_string()));
                        eof = true;
                    }
                }
            }
        }
    }

    if !current.is_empty() {
        let index = chunks.len();
        let len = current.len();
        chunks.push(current);
        let _ = event_tx.send(RecorderEvent::Chunk { index, len });
    }

    stream.stop().await;
    chunks
}
