//! End-to-end pipeline test against a real toolkit
//!
//! Records a few seconds of the synthetic source, converts, and checks the
//! preview artifact. Skipped when no usable FFmpeg is on the PATH.

use std::process::Command;
use std::time::Duration;

use recast::capture::SyntheticSource;
use recast::orchestrator::{Orchestrator, OrchestratorConfig};

fn usable_ffmpeg() -> bool {
    let Ok(output) = Command::new("ffmpeg").args(["-hide_banner", "-encoders"]).output() else {
        return false;
    };
    let listing = String::from_utf8_lossy(&output.stdout);
    output.status.success() && listing.contains("libx264") && listing.contains("libopus")
}

#[tokio::test]
async fn synthetic_session_round_trips_to_mp4() {
    if !usable_ffmpeg() {
        eprintln!("skipping: no usable ffmpeg on PATH");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let config = OrchestratorConfig {
        preview_dir: dir.path().join("previews"),
        ..Default::default()
    };
    let mut orchestrator = Orchestrator::new(config);
    orchestrator.warm_up();

    let source = SyntheticSource::new(Some(Duration::from_secs(3)));
    let report = orchestrator
        .run_session(&source, tokio::time::sleep(Duration::from_secs(4)))
        .await
        .unwrap();

    assert!(report.recorded_bytes > 0);
    assert!(report.chunk_count > 1);

    // 2.5 Mbps video + 128 kbps audio for ~3 s; the encoder may undershoot
    // on the test pattern but must not blow past the target
    let expected_bytes = (2_500_000 + 128_000) / 8 * 3;
    assert!(
        report.recorded_bytes < expected_bytes * 4,
        "recording larger than expected: {} bytes",
        report.recorded_bytes
    );

    // fast-start MP4 leads with the ftyp box
    let preview = std::fs::read(&report.preview_path).unwrap();
    assert!(preview.len() > 8);
    assert_eq!(&preview[4..8], b"ftyp");

    // copy-codec remux: only the wrapping changes, payload size is comparable
    let ratio = report.converted_bytes as f64 / report.recorded_bytes as f64;
    assert!(
        ratio > 0.5 && ratio < 2.0,
        "unexpected converted/recorded size ratio {:.2}",
        ratio
    );
}
