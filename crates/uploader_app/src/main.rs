//! `video-upload`: drives one upload session from the command line.
//!
//! Status lines go to stdout as the session changes; the process exits
//! non-zero when the session ends in an error or is interrupted.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use uploader_core::{SessionView, VideoAsset};
use uploader_engine::{
    CompressSettings, Compressor, ControllerSettings, FfmpegCompressor, PassthroughCompressor,
    UploadController, UploadServices,
};
use uploader_logging::{upload_error, upload_info, upload_warn};

mod cli;
mod render;

use cli::Args;

/// Exit status for a run cancelled with Ctrl+C.
const INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    uploader_logging::initialize(args.log_destination(), args.log_level());

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            upload_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

enum Outcome {
    Done(SessionView),
    Failed(SessionView),
    Interrupted,
    Stopped,
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args
        .upload_config()
        .context("Invalid upload configuration")?;
    let metadata = tokio::fs::metadata(&args.file)
        .await
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let asset = VideoAsset::new(&args.file).with_size(metadata.len());

    let mut compress = CompressSettings::new(&args.work_dir);
    compress.max_bytes = config.max_video_bytes;
    let compressor: Arc<dyn Compressor> = if args.no_transcode {
        Arc::new(PassthroughCompressor::new(compress))
    } else {
        Arc::new(FfmpegCompressor::new(compress))
    };

    let services = UploadServices::from_config(&config, compressor)
        .context("Failed to build HTTP client")?;
    let controller = UploadController::spawn(
        services,
        ControllerSettings::new(args.did.clone(), config.poll_settings()),
    );
    upload_info!(
        "Uploading {} to {} for {}",
        args.file.display(),
        config.upload_base_url,
        args.did
    );

    let mut views = controller.subscribe();
    controller.select_video(asset);

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_line = String::new();

    let outcome = loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break Outcome::Stopped;
                }
                let view = views.borrow_and_update().clone();
                let line = render::status_line(&view);
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
                if view.is_done() {
                    break Outcome::Done(view);
                }
                if view.is_failed() {
                    break Outcome::Failed(view);
                }
            }
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    upload_warn!("Ctrl+C handler failed: {}", err);
                }
                controller.reset_video();
                break Outcome::Interrupted;
            }
        }
    };
    controller.shutdown().await;

    Ok(match outcome {
        Outcome::Done(view) => {
            upload_info!(
                "Job {} completed",
                view.job_id.as_deref().unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        Outcome::Failed(view) => {
            eprintln!("{}", view.error.as_deref().unwrap_or_default());
            ExitCode::FAILURE
        }
        Outcome::Interrupted => {
            upload_warn!("Upload cancelled");
            ExitCode::from(INTERRUPTED)
        }
        Outcome::Stopped => {
            upload_error!("Upload controller stopped unexpectedly");
            ExitCode::FAILURE
        }
    })
}
