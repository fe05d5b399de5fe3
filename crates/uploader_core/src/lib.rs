//! Uploader core: pure upload-session state machine and view-model helpers.
mod effect;
mod messages;
mod msg;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use messages::{
    compression_failed_message, poll_failed_message, too_large_message, upload_failed_message,
    BYTES_PER_MB, DEFAULT_MAX_VIDEO_BYTES,
};
pub use msg::Msg;
pub use state::{UploadSession, UploadStatus};
pub use types::{
    AttemptId, CompressedVideo, CompressionFailure, JobId, JobState, JobStatus, UploadFailure,
    VideoAsset, VIDEO_MP4,
};
pub use update::update;
pub use view_model::SessionView;
