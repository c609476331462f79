//! Error types and handling
//!
//! Common error types used across the application.

use thiserror::Error;

use crate::capture::CaptureError;
use crate::preview::PreviewError;
use crate::recorder::RecordError;
use crate::remux::ConvertError;
use crate::toolkit::ToolkitError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording error: {0}")]
    Record(#[from] RecordError),

    #[error("Toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    #[error("A conversion is already in flight")]
    ConversionInFlight,

    #[error("Conversion task failed: {0}")]
    ConversionTask(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
