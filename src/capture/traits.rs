//! Capture trait definitions
//!
//! Source-agnostic traits for acquiring a live media stream.

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::Child;

use super::constraints::CaptureConstraints;
use crate::recorder::RecordingOptions;

/// Errors that can occur while acquiring a stream
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No capture source available: {0}")]
    NoCaptureSource(String),

    #[error("Capture not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Capture process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A live media stream: an ordered byte stream of container data.
///
/// The stream is backed either by a capture subprocess (killed when the
/// stream is stopped or dropped) or by an arbitrary async reader in tests.
pub struct MediaStream {
    label: String,
    reader: Box<dyn AsyncRead + Send + Unpin>,
    child: Option<Child>,
}

impl MediaStream {
    /// Wrap an async reader as a stream. Used by in-process sources and tests.
    pub fn from_reader(label: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            label: label.into(),
            reader: Box::new(reader),
            child: None,
        }
    }

    /// Wrap a capture subprocess; the stream reads the child's stdout and
    /// owns the child for teardown.
    pub fn from_child(label: impl Into<String>, mut child: Child) -> CaptureResult<Self> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Process("capture process has no stdout".to_string()))?;
        Ok(Self {
            label: label.into(),
            reader: Box::new(stdout),
            child: Some(child),
        })
    }

    /// Human-readable stream label (e.g. "display", "synthetic")
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stop the stream, killing the backing process if there is one.
    pub async fn stop(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("capture process already gone: {}", e);
            }
        }
    }
}

impl AsyncRead for MediaStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Trait for stream acquisition
///
/// An implementation turns a constraint set plus encoding options into a
/// live stream, or fails with a typed error that propagates to the caller.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Source identifier (e.g. "display", "synthetic")
    fn id(&self) -> &str;

    /// Acquire a live stream honoring the constraints, producing container
    /// data per the recording options.
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
        options: &RecordingOptions,
    ) -> CaptureResult<MediaStream>;
}
