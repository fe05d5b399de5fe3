use crate::{
    AttemptId, CompressedVideo, CompressionFailure, JobId, JobStatus, UploadFailure, VideoAsset,
};

/// Every event that can move an upload session.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked a video; starts a new attempt.
    VideoSelected(VideoAsset),
    /// User cleared the selection.
    ResetClicked,
    /// Compressor progress, a fraction in `[0, 1]`.
    CompressionProgress { attempt: AttemptId, progress: f64 },
    CompressionFinished {
        attempt: AttemptId,
        result: Result<CompressedVideo, CompressionFailure>,
    },
    /// Upload finished; on success carries the server job id.
    UploadFinished {
        attempt: AttemptId,
        result: Result<JobId, UploadFailure>,
    },
    /// A status response from the poller, terminal or not.
    JobStatusObserved { attempt: AttemptId, status: JobStatus },
    /// The poller gave up after repeated request failures.
    PollFailed { attempt: AttemptId, reason: String },
}
