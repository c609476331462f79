//! Recast - record the screen, remux to MP4, preview the result.
//!
//! The pipeline records a capture stream into timed chunks, assembles them
//! into a WebM recording on stop, rewraps it as a fast-start MP4 through the
//! toolkit (video copied, never re-encoded), and attaches a preview
//! artifact. A separate binary serves static assets with the cross-origin
//! isolation headers.

pub mod capture;
pub mod media;
pub mod orchestrator;
pub mod preview;
pub mod recorder;
pub mod remux;
pub mod server;
pub mod session;
pub mod toolkit;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for a binary
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
