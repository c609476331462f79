//! Container conversion
//!
//! Pure remux of a finished recording into the target container: the video
//! stream is copied, never re-encoded; only the wrapping changes.

pub mod adapter;

pub use adapter::{remux_args, ConvertError, TranscodeAdapter, TranscodedBuffer};
