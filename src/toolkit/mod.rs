//! External transcoding toolkit
//!
//! The toolkit boundary is: load once, write bytes into a sandboxed virtual
//! filesystem, invoke a command over entries by name, read the result back,
//! unlink entries. `FfmpegToolkit` backs this with an FFmpeg subprocess and
//! a scratch directory; the loader shares one loaded instance process-wide.

pub mod ffmpeg;
pub mod loader;

use async_trait::async_trait;
use thiserror::Error;

pub use ffmpeg::FfmpegToolkit;
pub use loader::{LoadPhase, ToolkitConfig, ToolkitLoader};

/// Errors from toolkit loading and use
#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("Toolkit load failed: {0}")]
    Load(String),

    #[error("Invalid virtual filesystem entry name: \"{0}\"")]
    InvalidEntryName(String),

    #[error("Virtual filesystem IO error: {0}")]
    FilesystemIo(String),

    #[error("Toolkit command failed (exit {code:?}): {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The toolkit boundary: a virtual filesystem plus command invocation.
///
/// Entry names are flat — no path separators, no traversal.
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Write bytes into the virtual filesystem under `name`
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), ToolkitError>;

    /// Read an entry's bytes back
    async fn read(&self, name: &str) -> Result<Vec<u8>, ToolkitError>;

    /// Delete an entry
    async fn unlink(&self, name: &str) -> Result<(), ToolkitError>;

    /// Invoke the toolkit with an argument list; entry names in the args
    /// resolve inside the virtual filesystem
    async fn run(&self, args: &[String]) -> Result<(), ToolkitError>;
}
