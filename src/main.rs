//! Capture/convert orchestrator binary
//!
//! Records the screen (or a synthetic test stream), stops on Ctrl-C or
//! after a fixed duration, converts the recording to a fast-start MP4, and
//! attaches the preview.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use recast::capture::{CaptureConstraints, CaptureSource, DisplaySource, SyntheticSource};
use recast::orchestrator::{Orchestrator, OrchestratorConfig};
use recast::session::OverlapPolicy;
use recast::toolkit::ToolkitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Display,
    Synthetic,
}

fn parse_source(s: &str) -> Result<SourceKind, String> {
    match s {
        "display" => Ok(SourceKind::Display),
        "synthetic" => Ok(SourceKind::Synthetic),
        other => Err(format!(
            "invalid source \"{}\" (expected display or synthetic)",
            other
        )),
    }
}

fn parse_policy(s: &str) -> Result<OverlapPolicy, String> {
    s.parse()
}

#[derive(Parser, Debug)]
#[clap(name = "recast", about = "Record the screen and remux to a fast-start MP4", version)]
struct Args {
    /// Capture source: display or synthetic
    #[clap(long, default_value = "display", value_parser = parse_source)]
    source: SourceKind,

    /// Stop automatically after this many seconds; omit to stop on Ctrl-C
    #[clap(long)]
    duration: Option<f64>,

    /// Directory preview artifacts are written to
    #[clap(long, default_value = "previews")]
    preview_dir: PathBuf,

    /// Open the preview with the system player when done
    #[clap(long)]
    open: bool,

    /// What a new start does while a conversion is in flight: reject or queue
    #[clap(long, default_value = "reject", value_parser = parse_policy)]
    on_overlap: OverlapPolicy,

    /// Path to the toolkit binary
    #[clap(long, default_value = "ffmpeg")]
    toolkit: PathBuf,

    /// Forward toolkit output to the logs
    #[clap(long)]
    toolkit_log: bool,

    /// Record video only
    #[clap(long)]
    no_audio: bool,

    /// Print the session report as JSON
    #[clap(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    recast::init_tracing();
    let args = Args::parse();

    let config = OrchestratorConfig {
        constraints: CaptureConstraints {
            audio: !args.no_audio,
            ..Default::default()
        },
        toolkit: ToolkitConfig {
            binary: args.toolkit.clone(),
            log_output: args.toolkit_log,
        },
        overlap: args.on_overlap,
        preview_dir: args.preview_dir.clone(),
        open_preview: args.open,
        ..Default::default()
    };

    let mut orchestrator = Orchestrator::new(config);
    orchestrator.warm_up();

    let duration = args.duration.map(Duration::from_secs_f64);
    let source: Box<dyn CaptureSource> = match args.source {
        SourceKind::Display => Box::new(DisplaySource::with_binary(args.toolkit.clone())),
        SourceKind::Synthetic => Box::new(SyntheticSource::with_binary(args.toolkit.clone(), duration)),
    };

    let stop_signal = async move {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to listen for Ctrl-C: {}", e);
                }
            }
        }
    };

    let report = orchestrator.run_session(source.as_ref(), stop_signal).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.preview_path.display());
    }

    Ok(())
}
