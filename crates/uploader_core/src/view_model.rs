use crate::{AttemptId, CompressedVideo, JobId, JobStatus, UploadStatus, VideoAsset};

/// Read-only snapshot of an [`crate::UploadSession`] for the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub status: UploadStatus,
    pub progress: f64,
    pub asset: Option<VideoAsset>,
    pub video: Option<CompressedVideo>,
    pub job_id: Option<JobId>,
    pub job_status: Option<JobStatus>,
    pub error: Option<String>,
    pub attempt: AttemptId,
}

impl SessionView {
    /// Failed sessions end in `Idle` with an error; there is no separate failed state.
    pub fn is_failed(&self) -> bool {
        self.status == UploadStatus::Idle && self.error.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.status == UploadStatus::Done
    }

    pub fn progress_percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
