//! Capture/convert orchestration
//!
//! Drives the full session flow: acquire a stream, record it into chunks,
//! assemble on stop, convert through the toolkit, attach the preview. A
//! single-entry gate covers each session from start through preview attach;
//! the overlap policy decides what a new start does while it is held.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::capture::{CaptureConstraints, CaptureSource};
use crate::media::MediaType;
use crate::preview::PreviewRenderer;
use crate::recorder::{Recorder, RecorderEvent, RecorderState, RecordingOptions};
use crate::remux::TranscodeAdapter;
use crate::session::{OverlapPolicy, SessionId, VfsNames};
use crate::toolkit::{ToolkitConfig, ToolkitLoader};
use crate::utils::{AppError, AppResult};

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub constraints: CaptureConstraints,
    pub options: RecordingOptions,
    pub toolkit: ToolkitConfig,
    pub overlap: OverlapPolicy,
    pub preview_dir: PathBuf,
    pub open_preview: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            options: RecordingOptions::default(),
            toolkit: ToolkitConfig::default(),
            overlap: OverlapPolicy::default(),
            preview_dir: PathBuf::from("previews"),
            open_preview: false,
        }
    }
}

/// Summary of one completed session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session: SessionId,
    pub started_at: DateTime<Utc>,
    pub recorded_bytes: usize,
    pub chunk_count: usize,
    pub recorded_duration_ms: u64,
    pub converted_bytes: usize,
    pub preview_path: PathBuf,
}

/// Handle for an in-flight conversion
pub type ConversionTask = JoinHandle<AppResult<SessionReport>>;

struct ActiveSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    permit: OwnedMutexGuard<()>,
}

/// Ties the recorder, the toolkit, and the preview renderer together
pub struct Orchestrator {
    config: OrchestratorConfig,
    loader: Arc<ToolkitLoader>,
    recorder: Recorder,
    preview: Arc<Mutex<PreviewRenderer>>,
    gate: Arc<Mutex<()>>,
    active: Option<ActiveSession>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let loader = Arc::new(ToolkitLoader::ffmpeg(config.toolkit.clone()));
        Self::with_loader(loader, config)
    }

    /// Build with an externally provided loader. Used by tests.
    pub fn with_loader(loader: Arc<ToolkitLoader>, config: OrchestratorConfig) -> Self {
        let preview = PreviewRenderer::new(&config.preview_dir, config.open_preview);
        Self {
            config,
            loader,
            recorder: Recorder::new(),
            preview: Arc::new(Mutex::new(preview)),
            gate: Arc::new(Mutex::new(())),
            active: None,
        }
    }

    /// Start loading the toolkit now, independent of whether a recording
    /// ever happens.
    pub fn warm_up(&self) {
        let loader = self.loader.clone();
        tokio::spawn(async move {
            if let Err(e) = loader.ensure_loaded().await {
                tracing::warn!("toolkit warm-up failed: {}", e);
            }
        });
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.recorder.subscribe()
    }

    /// Start a new session.
    ///
    /// While a previous session's conversion holds the gate, the overlap
    /// policy applies: `Reject` fails, `Queue` waits for it to finish.
    pub async fn start(&mut self, source: &dyn CaptureSource) -> AppResult<SessionId> {
        let permit = match self.config.overlap {
            OverlapPolicy::Reject => self
                .gate
                .clone()
                .try_lock_owned()
                .map_err(|_| AppError::ConversionInFlight)?,
            OverlapPolicy::Queue => self.gate.clone().lock_owned().await,
        };

        self.recorder
            .start(source, &self.config.constraints, self.config.options.clone())
            .await?;

        let id = SessionId::new();
        tracing::info!("session {} started ({})", id, source.id());
        self.active = Some(ActiveSession {
            id,
            started_at: Utc::now(),
            permit,
        });
        Ok(id)
    }

    /// Stop recording and kick off the conversion.
    ///
    /// Assembly happens inline; the convert-and-preview tail runs as a task
    /// that releases the session gate when it finishes. The returned handle
    /// resolves to the session report.
    pub async fn stop(&mut self) -> AppResult<ConversionTask> {
        let Some(active) = self.active.take() else {
            return Err(AppError::Record(crate::recorder::RecordError::NotRecording));
        };

        let recording = match self.recorder.stop().await {
            Ok(recording) => recording,
            Err(e) => return Err(e.into()),
        };

        let adapter = TranscodeAdapter::new(self.loader.clone());
        let preview = self.preview.clone();

        let handle = tokio::spawn(async move {
            let names = VfsNames::for_session(active.id, &recording.media_type, &MediaType::mp4());
            let buffer = adapter.convert(&recording, &names).await?;
            let preview_path = preview.lock().await.attach(&buffer, active.id).await?;

            let report = SessionReport {
                session: active.id,
                started_at: active.started_at,
                recorded_bytes: recording.len(),
                chunk_count: recording.chunk_count,
                recorded_duration_ms: recording.duration.as_millis() as u64,
                converted_bytes: buffer.data.len(),
                preview_path,
            };
            tracing::info!(
                "session {} complete: {} bytes recorded, {} bytes converted",
                report.session,
                report.recorded_bytes,
                report.converted_bytes
            );
            drop(active.permit);
            Ok(report)
        });

        Ok(handle)
    }

    /// Run one full session: start, wait for the stop signal, convert, and
    /// return the report.
    pub async fn run_session(
        &mut self,
        source: &dyn CaptureSource,
        stop_signal: impl Future<Output = ()>,
    ) -> AppResult<SessionReport> {
        self.start(source).await?;
        stop_signal.await;
        let task = self.stop().await?;
        task.await
            .map_err(|e| AppError::ConversionTask(e.to_string()))?
    }
}
