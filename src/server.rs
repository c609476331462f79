//! Static asset server
//!
//! Serves files from a root directory on a fixed port, attaching the two
//! cross-origin isolation headers to every response. No routing beyond
//! static file resolution, no authentication, no configuration.

use axum::http::header::{HeaderName, HeaderValue};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

/// The server always binds this port
pub const PORT: u16 = 3000;

/// Build the router: static files from `root`, COOP/COEP on every path
pub fn router(root: impl Into<PathBuf>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root.into()))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-embedder-policy"),
            HeaderValue::from_static("require-corp"),
        ))
}

/// Bind once and serve until the process exits
pub async fn serve(root: PathBuf) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], PORT));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("serving {:?} at http://localhost:{}", root, PORT);
    axum::serve(listener, router(root)).await
}
