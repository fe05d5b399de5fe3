use std::fmt;

use crate::view_model::SessionView;
use crate::{AttemptId, CompressedVideo, JobId, JobStatus, VideoAsset};

/// Workflow stage of an upload session.
///
/// `Uploading` is entered as soon as compression succeeds, before any job
/// exists; `Processing` means the server accepted the upload and returned a
/// job id that is now being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Compressing,
    Uploading,
    Processing,
    Done,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Compressing => "compressing",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Processing => "processing",
            UploadStatus::Done => "done",
        }
    }

    /// True while some compression, upload or poll may still be running.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            UploadStatus::Compressing | UploadStatus::Uploading | UploadStatus::Processing
        )
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user attempt to compress and upload a single video.
///
/// Fields are private: the session only changes through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadSession {
    status: UploadStatus,
    progress: f64,
    asset: Option<VideoAsset>,
    video: Option<CompressedVideo>,
    job_id: Option<JobId>,
    job_status: Option<JobStatus>,
    error: Option<String>,
    attempt: AttemptId,
    dirty: bool,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            status: self.status,
            progress: self.progress,
            asset: self.asset.clone(),
            video: self.video.clone(),
            job_id: self.job_id.clone(),
            job_status: self.job_status.clone(),
            error: self.error.clone(),
            attempt: self.attempt,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn accepts(&self, attempt: AttemptId, expected: UploadStatus) -> bool {
        self.attempt == attempt && self.status == expected
    }

    /// Drops everything from the previous attempt and starts compressing `asset`.
    pub(crate) fn begin_attempt(&mut self, asset: VideoAsset) -> AttemptId {
        self.clear();
        self.asset = Some(asset);
        self.status = UploadStatus::Compressing;
        self.attempt
    }

    pub(crate) fn reset(&mut self) {
        self.clear();
    }

    /// Progress is clamped to `[0, 1]` and never moves backwards within an attempt.
    pub(crate) fn set_progress(&mut self, progress: f64) {
        if progress.is_nan() {
            return;
        }
        let clamped = progress.clamp(0.0, 1.0);
        if clamped > self.progress {
            self.progress = clamped;
            self.dirty = true;
        }
    }

    pub(crate) fn compression_succeeded(&mut self, video: CompressedVideo) {
        self.video = Some(video);
        self.status = UploadStatus::Uploading;
        self.dirty = true;
    }

    pub(crate) fn job_accepted(&mut self, job_id: JobId) {
        self.job_id = Some(job_id);
        self.status = UploadStatus::Processing;
        self.dirty = true;
    }

    /// Records the status; returns true if it was terminal.
    pub(crate) fn observe_job_status(&mut self, status: JobStatus) -> bool {
        let completed = status.is_completed();
        if completed {
            self.status = UploadStatus::Done;
        }
        self.job_status = Some(status);
        self.dirty = true;
        completed
    }

    /// Back to idle with an error; asset, video and job details are kept.
    pub(crate) fn fail(&mut self, message: String) {
        self.status = UploadStatus::Idle;
        self.error = Some(message);
        self.dirty = true;
    }

    fn clear(&mut self) {
        *self = Self {
            attempt: self.attempt + 1,
            dirty: true,
            ..Self::default()
        };
    }
}
