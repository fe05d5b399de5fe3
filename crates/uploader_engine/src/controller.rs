use std::path::Path;
use std::sync::Arc;

use tempfile::TempPath;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uploader_core::{
    update, AttemptId, CompressedVideo, Effect, JobId, Msg, SessionView, UploadFailure,
    UploadSession, VideoAsset,
};
use uploader_logging::{upload_debug, upload_error, upload_info, upload_trace, upload_warn};

use crate::poll::{JobPoller, PollHandle, PollSettings};
use crate::{
    CompressError, Compressor, EngineEvent, EventSink, ReqwestStatusFetcher, ReqwestUploader,
    RequestError, StatusFetcher, UploadConfig, Uploader,
};

/// The external operations a controller drives.
#[derive(Clone)]
pub struct UploadServices {
    pub compressor: Arc<dyn Compressor>,
    pub uploader: Arc<dyn Uploader>,
    pub status: Arc<dyn StatusFetcher>,
}

impl UploadServices {
    /// HTTP-backed uploader and status fetcher for the configured service.
    pub fn from_config(
        config: &UploadConfig,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self, RequestError> {
        Ok(Self {
            compressor,
            uploader: Arc::new(ReqwestUploader::new(config)?),
            status: Arc::new(ReqwestStatusFetcher::new(config)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Stable identity of the uploading account.
    pub did: String,
    pub poll: PollSettings,
}

impl ControllerSettings {
    pub fn new(did: impl Into<String>, poll: PollSettings) -> Self {
        Self {
            did: did.into(),
            poll,
        }
    }
}

/// Drives one upload session: owns the state, runs effects, publishes snapshots.
///
/// Must be created inside a tokio runtime. Dropping the controller tears the
/// session down and cancels all in-flight work.
pub struct UploadController {
    msg_tx: mpsc::UnboundedSender<Msg>,
    view_rx: watch::Receiver<SessionView>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl UploadController {
    pub fn spawn(services: UploadServices, settings: ControllerSettings) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let session = UploadSession::new();
        let (view_tx, view_rx) = watch::channel(session.view());
        let shutdown = CancellationToken::new();
        let runner = EffectRunner {
            services,
            settings,
            msg_tx: msg_tx.clone(),
            root: shutdown.child_token(),
            attempt: None,
            poller: None,
        };

        let task = tokio::spawn(run_loop(session, msg_rx, runner, view_tx, shutdown.clone()));

        Self {
            msg_tx,
            view_rx,
            shutdown,
            task: Some(task),
        }
    }

    /// Starts a new attempt for `asset`; failures show up in the session, not here.
    pub fn select_video(&self, asset: VideoAsset) {
        self.send(Msg::VideoSelected(asset));
    }

    /// Clears the session and cancels whatever is still running.
    pub fn reset_video(&self) {
        self.send(Msg::ResetClicked);
    }

    pub fn state(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Cancels in-flight work and waits for the event loop to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, msg: Msg) {
        if self.msg_tx.send(msg).is_err() {
            upload_warn!("Upload controller is stopped; dropping message");
        }
    }
}

impl Drop for UploadController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_loop(
    mut session: UploadSession,
    mut msg_rx: mpsc::UnboundedReceiver<Msg>,
    mut runner: EffectRunner,
    view_tx: watch::Sender<SessionView>,
    shutdown: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            msg = msg_rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        upload_trace!("Msg {:?}", msg);

        let previous = session.status();
        let (next, effects) = update(session, msg);
        session = next;
        if session.status() != previous {
            upload_info!(
                "Upload status {} -> {} (attempt {})",
                previous,
                session.status(),
                session.attempt()
            );
        }

        for effect in effects {
            runner.run(effect);
        }

        if session.consume_dirty() {
            view_tx.send_replace(session.view());
        }
    }

    runner.cancel_all();
    upload_debug!("Upload controller stopped");
}

struct EffectRunner {
    services: UploadServices,
    settings: ControllerSettings,
    msg_tx: mpsc::UnboundedSender<Msg>,
    root: CancellationToken,
    /// Cancels the compression and upload of the current attempt.
    attempt: Option<CancellationToken>,
    poller: Option<PollHandle>,
}

impl EffectRunner {
    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Compress { attempt, asset } => self.start_compression(attempt, asset),
            Effect::Upload { attempt, video } => self.start_upload(attempt, video),
            Effect::StartPolling { attempt, job_id } => self.start_polling(attempt, job_id),
            Effect::StopPolling => self.stop_polling(),
            Effect::CancelAll => self.cancel_all(),
            Effect::DiscardVideo { video } => {
                upload_debug!("Discarding unused artifact {:?}", video.path);
                drop(artifact_guard(&video.path));
            }
        }
    }

    fn attempt_token(&mut self) -> CancellationToken {
        self.attempt
            .get_or_insert_with(|| self.root.child_token())
            .clone()
    }

    fn start_compression(&mut self, attempt: AttemptId, asset: VideoAsset) {
        self.cancel_all();
        let token = self.attempt_token();
        let compressor = self.services.compressor.clone();
        let msg_tx = self.msg_tx.clone();
        upload_info!("Compressing {:?} (attempt {})", asset.path, attempt);

        tokio::spawn(async move {
            let sink = AttemptSink::new(attempt, msg_tx.clone());
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(CompressError::Cancelled),
                result = compressor.compress(&asset, &sink) => result,
            };
            let result = match result {
                Ok(video) => Ok(video),
                Err(CompressError::Cancelled) => {
                    upload_debug!("Compression for attempt {} cancelled", attempt);
                    return;
                }
                Err(err @ CompressError::TooLarge { .. }) => {
                    upload_warn!("Rejected {:?}: {}", asset.path, err);
                    Err(err.to_failure())
                }
                Err(err) => {
                    upload_error!("Error compressing video {:?}: {}", asset.path, err);
                    Err(err.to_failure())
                }
            };
            let _ = msg_tx.send(Msg::CompressionFinished { attempt, result });
        });
    }

    fn start_upload(&mut self, attempt: AttemptId, video: CompressedVideo) {
        let token = self.attempt_token();
        let uploader = self.services.uploader.clone();
        let did = self.settings.did.clone();
        let msg_tx = self.msg_tx.clone();
        upload_info!("Uploading {:?} (attempt {})", video.path, attempt);

        tokio::spawn(async move {
            // The artifact is only needed for this one request.
            let _artifact = artifact_guard(&video.path);
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = uploader.upload(&video, &did) => Some(result),
            };
            let Some(result) = result else {
                upload_debug!("Upload for attempt {} cancelled", attempt);
                return;
            };
            let result: Result<JobId, UploadFailure> = match result {
                Ok(response) => Ok(response.job_id),
                Err(err) => {
                    upload_error!("Error uploading video {:?}: {}", video.path, err);
                    Err(UploadFailure::new(err.to_string()))
                }
            };
            let _ = msg_tx.send(Msg::UploadFinished { attempt, result });
        });
    }

    fn start_polling(&mut self, attempt: AttemptId, job_id: JobId) {
        self.stop_polling();
        let token = self.attempt_token().child_token();
        let sink = Arc::new(AttemptSink::new(attempt, self.msg_tx.clone()));
        upload_info!("Polling job {} (attempt {})", job_id, attempt);
        self.poller = Some(JobPoller::spawn(
            self.services.status.clone(),
            job_id,
            self.settings.poll.clone(),
            sink,
            token,
        ));
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(token) = self.attempt.take() {
            token.cancel();
        }
        self.stop_polling();
    }
}

/// Deletes the compressed artifact at `path` when dropped.
fn artifact_guard(path: &Path) -> Option<TempPath> {
    TempPath::try_from_path(path).ok()
}

/// Tags engine events with the attempt they belong to.
struct AttemptSink {
    attempt: AttemptId,
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl AttemptSink {
    fn new(attempt: AttemptId, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self { attempt, msg_tx }
    }
}

impl EventSink for AttemptSink {
    fn emit(&self, event: EngineEvent) {
        let attempt = self.attempt;
        let msg = match event {
            EngineEvent::CompressionProgress(progress) => {
                Msg::CompressionProgress { attempt, progress }
            }
            EngineEvent::JobStatus(status) => Msg::JobStatusObserved { attempt, status },
            EngineEvent::PollFailed(err) => Msg::PollFailed {
                attempt,
                reason: err.to_string(),
            },
        };
        let _ = self.msg_tx.send(msg);
    }
}
