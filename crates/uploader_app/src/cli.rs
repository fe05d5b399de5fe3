use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use uploader_engine::{UploadConfig, BASE_URL_ENV, SECRET_HEADER_ENV};
use uploader_logging::{LogDestination, DEFAULT_LOG_FILE};

/// Compresses a local video, uploads it, and waits for server-side processing.
#[derive(Parser, Debug)]
#[command(name = "video-upload")]
#[command(version)]
pub struct Args {
    /// Video file to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Account identity the upload is made for
    #[arg(long)]
    pub did: String,

    /// Root endpoint of the video service
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: String,

    /// Secret sent with every upload
    #[arg(long, env = SECRET_HEADER_ENV, hide_env_values = true)]
    pub secret: String,

    /// Directory for compressed artifacts
    #[arg(long, default_value_os_t = std::env::temp_dir().join("video-upload"))]
    pub work_dir: PathBuf,

    /// Prefix for the uploaded file name (letters, digits, `_` and `-`)
    #[arg(long)]
    pub name_prefix: Option<String>,

    /// Delay between job status requests
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Upload the file as-is instead of re-encoding it with ffmpeg
    #[arg(long)]
    pub no_transcode: bool,

    /// Also write logs to a file
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_LOG_FILE
    )]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn upload_config(&self) -> anyhow::Result<UploadConfig> {
        let mut config = UploadConfig::new(&self.base_url, &self.secret)?;
        if let Some(prefix) = &self.name_prefix {
            config = config.with_filename_prefix(prefix)?;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }
        Ok(config)
    }
}
