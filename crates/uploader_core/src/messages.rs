//! User-facing error messages.

use crate::CompressionFailure;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Size ceiling for a compressed video.
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 100 * BYTES_PER_MB;

pub fn too_large_message(max_bytes: u64) -> String {
    format!("The selected video is larger than {}MB.", max_bytes / BYTES_PER_MB)
}

pub fn compression_failed_message() -> String {
    "An error occurred while compressing the video.".to_string()
}

pub fn upload_failed_message() -> String {
    "An error occurred while uploading the video.".to_string()
}

pub fn poll_failed_message() -> String {
    "An error occurred while checking the video's processing status.".to_string()
}

pub(crate) fn compression_message(failure: &CompressionFailure) -> String {
    match failure {
        CompressionFailure::TooLarge { max_bytes, .. } => too_large_message(*max_bytes),
        CompressionFailure::Failed { .. } => compression_failed_message(),
    }
}
