use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::StreamExt;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uploader_core::{CompressedVideo, VideoAsset, DEFAULT_MAX_VIDEO_BYTES};
use uploader_logging::upload_debug;

use crate::{CompressError, EngineEvent, EventSink};

/// Turns a selected asset into an uploadable mp4.
///
/// Implementations report progress through the sink as
/// [`EngineEvent::CompressionProgress`]. The returned future may be dropped
/// at any await point to cancel the work.
#[async_trait::async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        asset: &VideoAsset,
        sink: &dyn EventSink,
    ) -> Result<CompressedVideo, CompressError>;
}

#[derive(Debug, Clone)]
pub struct CompressSettings {
    /// Directory that receives compressed artifacts.
    pub work_dir: PathBuf,
    pub max_bytes: u64,
}

impl CompressSettings {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            max_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }

    /// Reserves a fresh `.mp4` in the work dir.
    ///
    /// The file is deleted when the returned path is dropped, so partial
    /// output never outlives a failed or cancelled compression; call
    /// [`finish_output`] to keep it.
    pub(crate) async fn output_file(&self, stem: &str) -> Result<TempPath, CompressError> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|err| CompressError::failed(format!("work dir: {err}")))?;
        let file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(".mp4")
            .tempfile_in(&self.work_dir)
            .map_err(|err| CompressError::failed(format!("work dir: {err}")))?;
        Ok(file.into_temp_path())
    }
}

pub(crate) fn finish_output(output: TempPath) -> Result<PathBuf, CompressError> {
    output
        .keep()
        .map_err(|err| CompressError::failed(format!("keep output: {err}")))
}

pub fn check_size_ceiling(actual: u64, max_bytes: u64) -> Result<(), CompressError> {
    if actual > max_bytes {
        return Err(CompressError::TooLarge { max_bytes, actual });
    }
    Ok(())
}

const COPY_CHUNK: usize = 256 * 1024;

/// Copies an already-encoded mp4 into the work directory unchanged.
#[derive(Debug, Clone)]
pub struct PassthroughCompressor {
    settings: CompressSettings,
}

impl PassthroughCompressor {
    pub fn new(settings: CompressSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl Compressor for PassthroughCompressor {
    async fn compress(
        &self,
        asset: &VideoAsset,
        sink: &dyn EventSink,
    ) -> Result<CompressedVideo, CompressError> {
        let source = tokio::fs::File::open(asset.path())
            .await
            .map_err(|err| CompressError::failed(format!("open {:?}: {err}", asset.path)))?;
        let total = source
            .metadata()
            .await
            .map_err(|err| CompressError::failed(err.to_string()))?
            .len();
        check_size_ceiling(total, self.settings.max_bytes)?;

        let target = self.settings.output_file(&file_stem(asset.path())).await?;
        upload_debug!("Copying {:?} to {:?} ({} bytes)", asset.path, target, total);
        let mut out = tokio::fs::File::create(&*target)
            .await
            .map_err(|err| CompressError::failed(format!("create {target:?}: {err}")))?;

        sink.emit(EngineEvent::CompressionProgress(0.0));
        let mut copied = 0u64;
        let mut stream = ReaderStream::with_capacity(source, COPY_CHUNK);
        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk.map_err(|err| CompressError::failed(err.to_string()))?;
            out.write_all(&chunk)
                .await
                .map_err(|err| CompressError::failed(err.to_string()))?;
            copied += chunk.len() as u64;
            if total > 0 {
                sink.emit(EngineEvent::CompressionProgress(copied as f64 / total as f64));
            }
        }
        out.flush()
            .await
            .map_err(|err| CompressError::failed(err.to_string()))?;
        drop(out);
        let path = finish_output(target)?;
        sink.emit(EngineEvent::CompressionProgress(1.0));

        Ok(CompressedVideo::mp4(path, copied))
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("video")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
