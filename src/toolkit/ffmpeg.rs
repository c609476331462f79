//! FFmpeg toolkit backend
//!
//! The virtual filesystem is a scratch directory removed with the toolkit;
//! commands run with the scratch directory as working directory so entry
//! names in the argument list resolve inside the sandbox.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use super::loader::ToolkitConfig;
use super::{Toolkit, ToolkitError};

pub struct FfmpegToolkit {
    binary: PathBuf,
    workdir: TempDir,
    log_output: bool,
}

impl FfmpegToolkit {
    /// Load the toolkit: set up the scratch directory and verify the binary
    /// actually runs.
    pub async fn load(config: &ToolkitConfig) -> Result<Self, ToolkitError> {
        let workdir = tempfile::Builder::new()
            .prefix("recast-vfs-")
            .tempdir()
            .map_err(|e| ToolkitError::Load(format!("scratch directory: {}", e)))?;

        let output = Command::new(&config.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ToolkitError::Load(format!("{} failed to start: {}", config.binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(ToolkitError::Load(format!(
                "{} -version exited with {:?}",
                config.binary.display(),
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().next().unwrap_or("unknown version");
        tracing::info!("toolkit ready: {}", version);

        Ok(Self {
            binary: config.binary.clone(),
            workdir,
            log_output: config.log_output,
        })
    }

    /// Resolve an entry name inside the sandbox, rejecting anything that
    /// could escape it.
    fn entry_path(&self, name: &str) -> Result<PathBuf, ToolkitError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(ToolkitError::InvalidEntryName(name.to_string()));
        }
        Ok(self.workdir.path().join(name))
    }
}

#[async_trait]
impl Toolkit for FfmpegToolkit {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), ToolkitError> {
        let path = self.entry_path(name)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ToolkitError::FilesystemIo(format!("write {}: {}", name, e)))?;
        tracing::debug!("vfs write {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, ToolkitError> {
        let path = self.entry_path(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ToolkitError::FilesystemIo(format!("read {}: {}", name, e)))?;
        tracing::debug!("vfs read {} ({} bytes)", name, bytes.len());
        Ok(bytes)
    }

    async fn unlink(&self, name: &str) -> Result<(), ToolkitError> {
        let path = self.entry_path(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ToolkitError::FilesystemIo(format!("unlink {}: {}", name, e)))?;
        tracing::debug!("vfs unlink {}", name);
        Ok(())
    }

    async fn run(&self, args: &[String]) -> Result<(), ToolkitError> {
        tracing::debug!("toolkit run: {:?}", args);

        let output = Command::new(&self.binary)
            .current_dir(self.workdir.path())
            .args(["-hide_banner", "-y"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if self.log_output {
            for line in stderr.lines() {
                tracing::debug!("[toolkit] {}", line);
            }
        }

        if !output.status.success() {
            // the tail of stderr carries the actual failure
            let tail: Vec<&str> = stderr.lines().rev().take(4).collect();
            return Err(ToolkitError::CommandFailed {
                code: output.status.code(),
                stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
            });
        }

        Ok(())
    }
}
