//! FFmpeg-backed compressor.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use uploader_core::{CompressedVideo, VideoAsset};
use uploader_logging::{upload_debug, upload_info, upload_warn};

use crate::compress::{
    check_size_ceiling, file_stem, finish_output, CompressSettings, Compressor,
};
use crate::{CompressError, EngineEvent, EventSink};

/// Encoder parameters for the mp4 the service expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegProfile {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    /// Longest edge in pixels; larger inputs are scaled down.
    pub max_dimension: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for FfmpegProfile {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 28,
            max_dimension: 1920,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegCompressor {
    settings: CompressSettings,
    profile: FfmpegProfile,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegCompressor {
    pub fn new(settings: CompressSettings) -> Self {
        Self {
            settings,
            profile: FfmpegProfile::default(),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }

    pub fn with_profile(mut self, profile: FfmpegProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_binaries(
        mut self,
        ffmpeg: impl Into<PathBuf>,
        ffprobe: impl Into<PathBuf>,
    ) -> Self {
        self.ffmpeg = ffmpeg.into();
        self.ffprobe = ffprobe.into();
        self
    }

    async fn probe_duration_ms(&self, input: &Path) -> Result<u64, CompressError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(input)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| CompressError::failed(format!("ffprobe: {err}")))?;
        if !output.status.success() {
            return Err(CompressError::failed(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_duration_ms(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| CompressError::failed("ffprobe reported no duration"))
    }
}

#[async_trait::async_trait]
impl Compressor for FfmpegCompressor {
    async fn compress(
        &self,
        asset: &VideoAsset,
        sink: &dyn EventSink,
    ) -> Result<CompressedVideo, CompressError> {
        let input = asset.path();
        let duration_ms = self.probe_duration_ms(input).await?;
        let output = self.settings.output_file(&file_stem(input)).await?;
        let args = build_args(input, &output, &self.profile);
        upload_debug!("Running {:?} {}", self.ffmpeg, args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| CompressError::failed(format!("ffmpeg: {err}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CompressError::failed("ffmpeg stderr not captured"))?;
        let mut lines = BufReader::new(stderr).lines();
        let mut parser = ProgressParser::new(duration_ms);
        let mut tail = VecDeque::with_capacity(ERROR_TAIL);

        sink.emit(EngineEvent::CompressionProgress(0.0));
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(fraction) = parser.feed(&line) {
                sink.emit(EngineEvent::CompressionProgress(fraction));
            } else if !is_progress_line(&line) {
                if tail.len() == ERROR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|err| CompressError::failed(format!("ffmpeg: {err}")))?;
        if !status.success() {
            let detail = tail.into_iter().collect::<Vec<_>>().join("; ");
            upload_warn!("ffmpeg failed for {:?}: {} {}", input, status, detail);
            return Err(CompressError::failed(format!("ffmpeg exited with {status}")));
        }

        let size = tokio::fs::metadata(&*output)
            .await
            .map_err(|err| CompressError::failed(err.to_string()))?
            .len();
        check_size_ceiling(size, self.settings.max_bytes)?;
        let output = finish_output(output)?;
        sink.emit(EngineEvent::CompressionProgress(1.0));
        upload_info!("Compressed {:?} to {:?} ({} bytes)", input, output, size);

        Ok(CompressedVideo::mp4(output, size))
    }
}

const ERROR_TAIL: usize = 5;

pub fn build_args(input: &Path, output: &Path, profile: &FfmpegProfile) -> Vec<String> {
    let max = profile.max_dimension;
    let scale = format!(
        "scale='if(gt(iw,ih),min({max},iw),-2)':'if(gt(iw,ih),-2,min({max},ih))'"
    );
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-progress".to_string(),
        "pipe:2".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        scale,
        "-c:v".to_string(),
        profile.video_codec.clone(),
        "-preset".to_string(),
        profile.preset.clone(),
        "-crf".to_string(),
        profile.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        profile.audio_codec.clone(),
        "-b:a".to_string(),
        profile.audio_bitrate.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

fn parse_duration_ms(stdout: &str) -> Option<u64> {
    let seconds: f64 = stdout.lines().next()?.trim().parse().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Some((seconds * 1000.0).round() as u64)
}

fn is_progress_line(line: &str) -> bool {
    line.split_once('=').is_some_and(|(key, _)| {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    })
}

/// Folds `-progress` key/value lines into a completed fraction.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    duration_ms: u64,
    out_time_ms: u64,
}

impl ProgressParser {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            out_time_ms: 0,
        }
    }

    /// Returns a fraction on each `progress=` line, which closes a block.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both keys are microseconds despite the name.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = (us.max(0) / 1000) as u64;
                }
                None
            }
            "progress" if value == "end" => Some(1.0),
            "progress" => Some(self.fraction()),
            _ => None,
        }
    }

    fn fraction(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 / self.duration_ms as f64).min(1.0)
    }
}
