//! FFmpeg-backed capture sources
//!
//! Display capture goes through FFmpeg's platform device demuxers (x11grab,
//! avfoundation, gdigrab); the synthetic source generates a test pattern and
//! tone through lavfi. Both encode H.264 into a WebM (matroska) stream on
//! stdout at the configured bitrates.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::constraints::{CaptureConstraints, CursorMode};
use super::traits::{CaptureError, CaptureResult, CaptureSource, MediaStream};
use crate::recorder::RecordingOptions;

/// Screen capture through the platform's FFmpeg device demuxer
pub struct DisplaySource {
    binary: PathBuf,
}

impl DisplaySource {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for DisplaySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for DisplaySource {
    fn id(&self) -> &str {
        "display"
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
        options: &RecordingOptions,
    ) -> CaptureResult<MediaStream> {
        let mut args = display_input_args(constraints)?;
        args.extend(encode_args(constraints, options));
        spawn_capture(&self.binary, args, "display").await
    }
}

/// Test pattern plus tone through lavfi; used by demos and end-to-end tests
/// where no display is available.
pub struct SyntheticSource {
    binary: PathBuf,
    /// Stop generating after this long; None streams until killed
    duration: Option<Duration>,
}

impl SyntheticSource {
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            duration,
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>, duration: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            duration,
        }
    }
}

#[async_trait]
impl CaptureSource for SyntheticSource {
    fn id(&self) -> &str {
        "synthetic"
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
        options: &RecordingOptions,
    ) -> CaptureResult<MediaStream> {
        let (width, height) = constraints.target_size();

        let mut args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "testsrc2=size={}x{}:rate={}",
                width, height, constraints.frame_rate
            ),
        ];

        if constraints.audio {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                "sine=frequency=440:sample_rate=48000".to_string(),
            ]);
        }

        if let Some(duration) = self.duration {
            args.extend(["-t".to_string(), format!("{:.3}", duration.as_secs_f64())]);
        }

        args.extend(encode_args(constraints, options));
        spawn_capture(&self.binary, args, "synthetic").await
    }
}

/// Platform device input section of the FFmpeg invocation
fn display_input_args(constraints: &CaptureConstraints) -> CaptureResult<Vec<String>> {
    let draw_mouse = match constraints.cursor {
        CursorMode::Always => "1",
        CursorMode::Never => "0",
    };

    #[cfg(target_os = "linux")]
    {
        let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
        let mut args = vec![
            "-f".to_string(),
            "x11grab".to_string(),
            "-framerate".to_string(),
            constraints.frame_rate.to_string(),
            "-draw_mouse".to_string(),
            draw_mouse.to_string(),
            "-i".to_string(),
            display,
        ];
        if constraints.audio {
            args.extend([
                "-f".to_string(),
                "pulse".to_string(),
                "-i".to_string(),
                "default".to_string(),
            ]);
        }
        Ok(args)
    }

    #[cfg(target_os = "macos")]
    {
        // avfoundation takes a combined video:audio device spec; screen
        // devices are listed after cameras, "1" is the first screen on a
        // single-camera machine.
        let input = if constraints.audio { "1:0" } else { "1:none" };
        Ok(vec![
            "-f".to_string(),
            "avfoundation".to_string(),
            "-framerate".to_string(),
            constraints.frame_rate.to_string(),
            "-capture_cursor".to_string(),
            draw_mouse.to_string(),
            "-i".to_string(),
            input.to_string(),
        ])
    }

    #[cfg(target_os = "windows")]
    {
        if constraints.audio {
            // dshow audio devices are named per machine; no portable default
            tracing::warn!("audio capture not wired up on Windows, recording video only");
        }
        Ok(vec![
            "-f".to_string(),
            "gdigrab".to_string(),
            "-framerate".to_string(),
            constraints.frame_rate.to_string(),
            "-draw_mouse".to_string(),
            draw_mouse.to_string(),
            "-i".to_string(),
            "desktop".to_string(),
        ])
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = draw_mouse;
        Err(CaptureError::Unsupported(
            "no display capture backend for this platform".to_string(),
        ))
    }
}

/// Encoding tail shared by all sources: scale to the constrained size,
/// H.264 at the configured bitrates, muxed per the source media type.
fn encode_args(constraints: &CaptureConstraints, options: &RecordingOptions) -> Vec<String> {
    let (width, height) = constraints.target_size();

    let mut args = vec![
        "-vf".to_string(),
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = width,
            h = height
        ),
        "-r".to_string(),
        constraints.frame_rate.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-b:v".to_string(),
        options.video_bits_per_second.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];

    if constraints.audio {
        args.extend([
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            options.audio_bits_per_second.to_string(),
        ]);
    } else {
        args.push("-an".to_string());
    }

    args.extend([
        "-f".to_string(),
        options.media_type.container.muxer().to_string(),
        "pipe:1".to_string(),
    ]);

    args
}

/// Spawn the capture process and wrap its stdout as a stream.
///
/// A process that exits within the grace period is treated as an acquisition
/// failure and its stderr is classified into a typed error.
async fn spawn_capture(
    binary: &PathBuf,
    args: Vec<String>,
    label: &str,
) -> CaptureResult<MediaStream> {
    tracing::debug!("spawning {} capture: {:?} {:?}", label, binary, args);

    let mut child = Command::new(binary)
        .arg("-hide_banner")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CaptureError::NoCaptureSource(format!("{} not found", binary.display()))
            } else {
                CaptureError::Io(e)
            }
        })?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    if child.try_wait()?.is_some() {
        let mut stderr_text = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_string(&mut stderr_text).await;
        }
        return Err(classify_failure(&stderr_text));
    }

    // Drain stderr into the logs so the pipe never fills up.
    if let Some(stderr) = child.stderr.take() {
        let label = label.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("[{} capture] {}", label, line);
            }
        });
    }

    MediaStream::from_child(label, child)
}

fn classify_failure(stderr: &str) -> CaptureError {
    let detail = stderr
        .lines()
        .last()
        .unwrap_or("capture process exited immediately")
        .to_string();

    let lowered = stderr.to_lowercase();
    if lowered.contains("permission denied")
        || lowered.contains("operation not permitted")
        || lowered.contains("cannot open display")
    {
        CaptureError::PermissionDenied(detail)
    } else {
        CaptureError::NoCaptureSource(detail)
    }
}
