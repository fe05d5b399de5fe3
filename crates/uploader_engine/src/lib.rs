//! Uploader engine: IO invokers and the controller that executes core effects.
mod compress;
mod config;
mod controller;
mod ffmpeg;
mod filename;
mod http;
mod poll;
mod types;
mod upload;

pub use compress::{check_size_ceiling, CompressSettings, Compressor, PassthroughCompressor};
pub use config::{ConfigError, UploadConfig, BASE_URL_ENV, SECRET_HEADER_ENV};
pub use controller::{ControllerSettings, UploadController, UploadServices};
pub use ffmpeg::{build_args, FfmpegCompressor, FfmpegProfile, ProgressParser};
pub use filename::{random_id, upload_filename, UPLOAD_ID_LEN};
pub use http::HttpSettings;
pub use poll::{
    JobPoller, PollHandle, PollOutcome, PollSettings, ReqwestStatusFetcher, StatusFetcher,
};
pub use types::{CompressError, EngineEvent, EventSink, RequestError};
pub use upload::{ReqwestUploader, UploadVideoResponse, Uploader, DEV_KEY_HEADER};
