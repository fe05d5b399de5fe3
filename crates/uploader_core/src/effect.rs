use crate::{AttemptId, CompressedVideo, JobId, VideoAsset};

/// Side effects requested by [`crate::update`], executed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Compress { attempt: AttemptId, asset: VideoAsset },
    Upload { attempt: AttemptId, video: CompressedVideo },
    StartPolling { attempt: AttemptId, job_id: JobId },
    StopPolling,
    /// Cancel any in-flight compression, upload and polling.
    CancelAll,
    /// Delete an artifact that no attempt will upload.
    DiscardVideo { video: CompressedVideo },
}
