//! Static asset server binary
//!
//! Serves the working directory over plain HTTP on port 3000. Every
//! response carries the COOP/COEP isolation headers pages need to use the
//! toolkit's shared-memory features. Binds once at startup and terminates
//! only with the process.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    recast::init_tracing();
    let root = std::env::current_dir()?;
    recast::server::serve(root).await?;
    Ok(())
}
