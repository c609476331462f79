//! Toolkit loader
//!
//! Loads the toolkit lazily, exactly once, sharing the single in-flight
//! initialization across all callers. Lifecycle:
//! `Uninitialized -> Loading -> Ready | Failed`, where a failed load is
//! retriable — only a success is cached.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::ffmpeg::FfmpegToolkit;
use super::{Toolkit, ToolkitError};

/// Toolkit configuration: where the binary lives and whether its output is
/// forwarded to the logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolkitConfig {
    pub binary: PathBuf,
    pub log_output: bool,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            log_output: false,
        }
    }
}

/// Observable load lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

type InitFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn Toolkit>, ToolkitError>> + Send>>;
type InitFn = Box<dyn Fn() -> InitFuture + Send + Sync>;

/// Process-wide toolkit loader with single-flight memoization
pub struct ToolkitLoader {
    cell: OnceCell<Arc<dyn Toolkit>>,
    init: InitFn,
    phase: Mutex<LoadPhase>,
}

impl ToolkitLoader {
    /// Loader backed by the FFmpeg toolkit
    pub fn ffmpeg(config: ToolkitConfig) -> Self {
        Self::with_init(Box::new(move || {
            let config = config.clone();
            Box::pin(async move {
                FfmpegToolkit::load(&config)
                    .await
                    .map(|toolkit| Arc::new(toolkit) as Arc<dyn Toolkit>)
            })
        }))
    }

    /// Loader with a custom initializer. Used by tests.
    pub fn with_init(init: InitFn) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
            phase: Mutex::new(LoadPhase::Uninitialized),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> LoadPhase {
        self.phase.lock().clone()
    }

    /// Ensure the toolkit is loaded, sharing one in-flight initialization
    /// across concurrent callers. A previous failure is not cached: the next
    /// call starts a fresh initialization.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn Toolkit>, ToolkitError> {
        let result = self
            .cell
            .get_or_try_init(|| {
                *self.phase.lock() = LoadPhase::Loading;
                (self.init)()
            })
            .await;

        match result {
            Ok(toolkit) => {
                *self.phase.lock() = LoadPhase::Ready;
                Ok(toolkit.clone())
            }
            Err(e) => {
                *self.phase.lock() = LoadPhase::Failed(e.to_string());
                Err(e)
            }
        }
    }
}
