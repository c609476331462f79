//! Preview rendering
//!
//! Wraps a converted buffer as a playable artifact on disk and keeps track
//! of what is attached: attaching a new preview revokes the superseded one,
//! and `revoke_all` clears everything the renderer created.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::remux::TranscodedBuffer;
use crate::session::SessionId;

/// Errors from preview rendering
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders converted buffers into tracked artifact files
pub struct PreviewRenderer {
    dir: PathBuf,
    attached: Option<PathBuf>,
    open_with_player: bool,
}

impl PreviewRenderer {
    pub fn new(dir: impl Into<PathBuf>, open_with_player: bool) -> Self {
        Self {
            dir: dir.into(),
            attached: None,
            open_with_player,
        }
    }

    /// Currently attached artifact, if any
    pub fn attached(&self) -> Option<&Path> {
        self.attached.as_deref()
    }

    /// Write the buffer as this session's preview artifact and attach it,
    /// revoking whatever was attached before.
    pub async fn attach(
        &mut self,
        buffer: &TranscodedBuffer,
        session: SessionId,
    ) -> Result<PathBuf, PreviewError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!(
            "preview-{}.{}",
            session,
            buffer.media_type.container.extension()
        ));
        tokio::fs::write(&path, &buffer.data).await?;
        tracing::info!("preview attached: {:?} ({} bytes)", path, buffer.data.len());

        if let Some(previous) = self.attached.replace(path.clone()) {
            if previous != path {
                if let Err(e) = tokio::fs::remove_file(&previous).await {
                    tracing::warn!("failed to revoke superseded preview {:?}: {}", previous, e);
                }
            }
        }

        if self.open_with_player {
            open_with_system_player(&path);
        }

        Ok(path)
    }

    /// Remove the attached artifact, if any
    pub async fn revoke_all(&mut self) {
        if let Some(path) = self.attached.take() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("failed to revoke preview {:?}: {}", path, e);
            }
        }
    }
}

/// Hand the artifact to the platform's default player. Best-effort: a
/// missing handler only logs.
fn open_with_system_player(path: &Path) {
    #[cfg(target_os = "linux")]
    let mut command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(path);
        c
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = std::process::Command::new("open");
        c.arg(path);
        c
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    };

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = path;
        tracing::warn!("no system player handler for this platform");
        return;
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    match command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(_) => tracing::debug!("opened {:?} with system player", path),
        Err(e) => tracing::warn!("failed to open {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;

    fn buffer(data: &[u8]) -> TranscodedBuffer {
        TranscodedBuffer {
            data: data.to_vec(),
            media_type: MediaType::mp4(),
        }
    }

    #[tokio::test]
    async fn attach_writes_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = PreviewRenderer::new(dir.path(), false);

        let path = renderer.attach(&buffer(b"mp4 bytes"), SessionId::new()).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"mp4 bytes");
        assert_eq!(renderer.attached(), Some(path.as_path()));
        assert_eq!(path.extension().unwrap(), "mp4");
    }

    #[tokio::test]
    async fn superseded_preview_is_revoked() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = PreviewRenderer::new(dir.path(), false);

        let first = renderer.attach(&buffer(b"one"), SessionId::new()).await.unwrap();
        let second = renderer.attach(&buffer(b"two"), SessionId::new()).await.unwrap();

        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(renderer.attached(), Some(second.as_path()));
    }

    #[tokio::test]
    async fn revoke_all_removes_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = PreviewRenderer::new(dir.path(), false);

        let path = renderer.attach(&buffer(b"bytes"), SessionId::new()).await.unwrap();
        renderer.revoke_all().await;

        assert!(!path.exists());
        assert_eq!(renderer.attached(), None);
    }
}
