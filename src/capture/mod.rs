//! Stream acquisition
//!
//! This module provides the capture constraint types, the source trait, and
//! the FFmpeg-backed display and synthetic sources.

pub mod constraints;
pub mod ffmpeg;
pub mod traits;

pub use constraints::{CaptureConstraints, CursorMode, WidthRange};
pub use ffmpeg::{DisplaySource, SyntheticSource};
pub use traits::{CaptureError, CaptureResult, CaptureSource, MediaStream};
