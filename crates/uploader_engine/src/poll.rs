use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uploader_core::JobStatus;
use uploader_logging::{upload_debug, upload_info, upload_warn};

use crate::http::{build_client, endpoint, HttpSettings};
use crate::{EngineEvent, EventSink, RequestError, UploadConfig};

#[async_trait::async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, RequestError>;
}

/// `GET {base}/job/{id}/status`.
#[derive(Debug, Clone)]
pub struct ReqwestStatusFetcher {
    settings: HttpSettings,
    client: reqwest::Client,
}

impl ReqwestStatusFetcher {
    pub fn new(config: &UploadConfig) -> Result<Self, RequestError> {
        let settings = HttpSettings::from_config(config);
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl StatusFetcher for ReqwestStatusFetcher {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, RequestError> {
        let url = endpoint(&self.settings.base_url, &["job", job_id, "status"], &[])?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive failed requests tolerated before the poller gives up.
    pub max_consecutive_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            max_consecutive_failures: 3,
        }
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(JobStatus),
    Failed(RequestError),
    Cancelled,
}

pub struct JobPoller;

impl JobPoller {
    /// Starts polling `job_id` on the current tokio runtime.
    ///
    /// The first request goes out immediately, then one per interval. Every
    /// status is forwarded to `sink`; polling stops after the completed
    /// state, after too many consecutive failures, or when `cancel` fires.
    pub fn spawn(
        fetcher: Arc<dyn StatusFetcher>,
        job_id: impl Into<String>,
        settings: PollSettings,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> PollHandle {
        let job_id = job_id.into();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            poll_loop(fetcher.as_ref(), &job_id, &settings, sink.as_ref(), &token).await
        });
        PollHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns a running poller; dropping the handle cancels it.
pub struct PollHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the poller to stop on its own (or through [`PollHandle::cancel`]).
    pub async fn wait(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    fetcher: &dyn StatusFetcher,
    job_id: &str,
    settings: &PollSettings,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> PollOutcome {
    let max_failures = settings.max_consecutive_failures.max(1);
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(job_id),
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(job_id),
            result = fetcher.fetch_status(job_id) => result,
        };

        match result {
            Ok(status) => {
                failures = 0;
                upload_debug!("Job {} state {}", job_id, status.state);
                let completed = status.is_completed();
                sink.emit(EngineEvent::JobStatus(status.clone()));
                if completed {
                    upload_info!("Job {} completed", job_id);
                    return PollOutcome::Completed(status);
                }
            }
            Err(err) => {
                failures += 1;
                upload_warn!(
                    "Status request for job {} failed ({}/{}): {}",
                    job_id,
                    failures,
                    max_failures,
                    err
                );
                if failures >= max_failures {
                    sink.emit(EngineEvent::PollFailed(err.clone()));
                    return PollOutcome::Failed(err);
                }
            }
        }
    }
}

fn cancelled(job_id: &str) -> PollOutcome {
    upload_debug!("Polling for job {} cancelled", job_id);
    PollOutcome::Cancelled
}
