//! Transcode adapter
//!
//! Converts a source-container recording into the target container through
//! the toolkit: write input entry, run the remux command, read the output
//! entry back. Both entries are unlinked on every exit path once the input
//! has been written.

use std::sync::Arc;
use thiserror::Error;

use crate::media::MediaType;
use crate::recorder::Recording;
use crate::session::VfsNames;
use crate::toolkit::{Toolkit, ToolkitError, ToolkitLoader};

/// Errors from the convert pipeline
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Toolkit unavailable: {0}")]
    ToolkitUnavailable(String),

    #[error("Remux failed: {0}")]
    RemuxFailed(String),

    #[error("Virtual filesystem error: {0}")]
    FilesystemIo(String),
}

/// Raw bytes of the converted container, tagged with the target media type
#[derive(Debug, Clone)]
pub struct TranscodedBuffer {
    pub data: Vec<u8>,
    pub media_type: MediaType,
}

/// The remux argument list: read the input, place index metadata at the
/// front of the file, copy the video stream, write the output.
pub fn remux_args(input: &str, output: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string(),
        "-movflags".to_string(),
        "faststart".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        output.to_string(),
    ]
}

/// Converts recordings through the shared toolkit
pub struct TranscodeAdapter {
    loader: Arc<ToolkitLoader>,
    target: MediaType,
}

impl TranscodeAdapter {
    pub fn new(loader: Arc<ToolkitLoader>) -> Self {
        Self {
            loader,
            target: MediaType::mp4(),
        }
    }

    /// Convert one recording. Steps are strictly sequential; cleanup of both
    /// virtual filesystem entries happens whether the remux succeeds or not.
    pub async fn convert(
        &self,
        recording: &Recording,
        names: &VfsNames,
    ) -> Result<TranscodedBuffer, ConvertError> {
        let toolkit = self
            .loader
            .ensure_loaded()
            .await
            .map_err(|e| ConvertError::ToolkitUnavailable(e.to_string()))?;

        tracing::info!(
            "converting {} -> {} ({} bytes, input {})",
            recording.media_type,
            self.target,
            recording.len(),
            names.input
        );

        toolkit
            .write(&names.input, &recording.data)
            .await
            .map_err(|e| ConvertError::FilesystemIo(e.to_string()))?;

        let result = self.remux_and_read(toolkit.as_ref(), names).await;

        if let Err(e) = toolkit.unlink(&names.input).await {
            tracing::warn!("failed to unlink {}: {}", names.input, e);
        }
        if let Err(e) = toolkit.unlink(&names.output).await {
            // the output entry does not exist when the remux itself failed
            tracing::debug!("failed to unlink {}: {}", names.output, e);
        }

        if let Ok(buffer) = &result {
            tracing::info!("conversion done: {} bytes of {}", buffer.data.len(), buffer.media_type);
        }
        result
    }

    async fn remux_and_read(
        &self,
        toolkit: &dyn Toolkit,
        names: &VfsNames,
    ) -> Result<TranscodedBuffer, ConvertError> {
        toolkit
            .run(&remux_args(&names.input, &names.output))
            .await
            .map_err(|e| match e {
                ToolkitError::CommandFailed { .. } => ConvertError::RemuxFailed(e.to_string()),
                other => ConvertError::ToolkitUnavailable(other.to_string()),
            })?;

        let data = toolkit
            .read(&names.output)
            .await
            .map_err(|e| ConvertError::FilesystemIo(e.to_string()))?;

        Ok(TranscodedBuffer {
            data,
            media_type: self.target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Write(String),
        Read(String),
        Unlink(String),
        Run(Vec<String>),
    }

    /// In-memory toolkit with a call log; `run` performs a byte-identical
    /// copy from the input entry to the output entry, like a remux that
    /// never touches the payload.
    struct MockToolkit {
        entries: Mutex<HashMap<String, Vec<u8>>>,
        calls: Mutex<Vec<Call>>,
        fail_run: bool,
    }

    impl MockToolkit {
        fn new(fail_run: bool) -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                fail_run,
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn unlinks_of(&self, name: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Unlink(n) if n == name))
                .count()
        }
    }

    #[async_trait]
    impl Toolkit for MockToolkit {
        async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), ToolkitError> {
            self.calls.lock().push(Call::Write(name.to_string()));
            self.entries.lock().insert(name.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn read(&self, name: &str) -> Result<Vec<u8>, ToolkitError> {
            self.calls.lock().push(Call::Read(name.to_string()));
            self.entries
                .lock()
                .get(name)
                .cloned()
                .ok_or_else(|| ToolkitError::FilesystemIo(format!("no entry {}", name)))
        }

        async fn unlink(&self, name: &str) -> Result<(), ToolkitError> {
            self.calls.lock().push(Call::Unlink(name.to_string()));
            self.entries
                .lock()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| ToolkitError::FilesystemIo(format!("no entry {}", name)))
        }

        async fn run(&self, args: &[String]) -> Result<(), ToolkitError> {
            self.calls.lock().push(Call::Run(args.to_vec()));
            if self.fail_run {
                return Err(ToolkitError::CommandFailed {
                    code: Some(1),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }

            let input = args
                .iter()
                .position(|a| a == "-i")
                .and_then(|i| args.get(i + 1))
                .cloned()
                .expect("remux args carry an input");
            let output = args.last().cloned().expect("remux args carry an output");

            let mut entries = self.entries.lock();
            let data = entries
                .get(&input)
                .cloned()
                .ok_or_else(|| ToolkitError::FilesystemIo(format!("no entry {}", input)))?;
            entries.insert(output, data);
            Ok(())
        }
    }

    fn loader_for(toolkit: Arc<MockToolkit>) -> Arc<ToolkitLoader> {
        Arc::new(ToolkitLoader::with_init(Box::new(move || {
            let toolkit = toolkit.clone();
            Box::pin(async move { Ok(toolkit as Arc<dyn Toolkit>) })
        })))
    }

    fn recording(data: &[u8]) -> Recording {
        Recording {
            data: data.to_vec(),
            media_type: MediaType::webm_h264(),
            chunk_count: 1,
            duration: Duration::from_secs(1),
        }
    }

    fn names() -> VfsNames {
        VfsNames::for_session(SessionId::new(), &MediaType::webm_h264(), &MediaType::mp4())
    }

    #[test]
    fn remux_args_are_a_pure_copy_remux() {
        let args = remux_args("in.webm", "out.mp4");
        assert_eq!(
            args,
            vec!["-i", "in.webm", "-movflags", "faststart", "-c:v", "copy", "out.mp4"]
        );
    }

    #[tokio::test]
    async fn convert_copies_payload_and_retags() {
        let toolkit = MockToolkit::new(false);
        let adapter = TranscodeAdapter::new(loader_for(toolkit.clone()));
        let names = names();

        let buffer = adapter.convert(&recording(b"h264 payload"), &names).await.unwrap();

        // copy-codec: the payload bytes come through unaltered
        assert_eq!(buffer.data, b"h264 payload");
        assert_eq!(buffer.media_type, MediaType::mp4());
    }

    #[tokio::test]
    async fn convert_unlinks_both_entries_exactly_once() {
        let toolkit = MockToolkit::new(false);
        let adapter = TranscodeAdapter::new(loader_for(toolkit.clone()));
        let names = names();

        adapter.convert(&recording(b"data"), &names).await.unwrap();

        assert_eq!(toolkit.unlinks_of(&names.input), 1);
        assert_eq!(toolkit.unlinks_of(&names.output), 1);
        assert!(toolkit.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn failed_remux_surfaces_and_still_cleans_up() {
        let toolkit = MockToolkit::new(true);
        let adapter = TranscodeAdapter::new(loader_for(toolkit.clone()));
        let names = names();

        let err = adapter.convert(&recording(b"data"), &names).await.unwrap_err();
        assert!(matches!(err, ConvertError::RemuxFailed(_)));

        // input entry was written, so it gets unlinked even on failure
        assert_eq!(toolkit.unlinks_of(&names.input), 1);
        assert_eq!(toolkit.unlinks_of(&names.output), 1);
        assert!(toolkit.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn empty_recording_converts_without_panicking() {
        let toolkit = MockToolkit::new(false);
        let adapter = TranscodeAdapter::new(loader_for(toolkit.clone()));

        let buffer = adapter.convert(&recording(b""), &names()).await.unwrap();
        assert!(buffer.data.is_empty());
    }

    #[tokio::test]
    async fn unavailable_toolkit_is_reported_before_any_write() {
        let loader = Arc::new(ToolkitLoader::with_init(Box::new(|| {
            Box::pin(async { Err(ToolkitError::Load("no binary".to_string())) })
        })));
        let adapter = TranscodeAdapter::new(loader);

        let err = adapter.convert(&recording(b"data"), &names()).await.unwrap_err();
        assert!(matches!(err, ConvertError::ToolkitUnavailable(_)));
    }

    #[tokio::test]
    async fn pipeline_steps_run_in_order() {
        let toolkit = MockToolkit::new(false);
        let adapter = TranscodeAdapter::new(loader_for(toolkit.clone()));
        let names = names();

        adapter.convert(&recording(b"data"), &names).await.unwrap();

        let calls = toolkit.calls();
        assert!(matches!(&calls[0], Call::Write(n) if *n == names.input));
        assert!(matches!(&calls[1], Call::Run(_)));
        assert!(matches!(&calls[2], Call::Read(n) if *n == names.output));
        assert!(matches!(&calls[3], Call::Unlink(n) if *n == names.input));
        assert!(matches!(&calls[4], Call::Unlink(n) if *n == names.output));
    }
}
