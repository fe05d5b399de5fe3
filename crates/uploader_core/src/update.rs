use crate::messages::{compression_message, poll_failed_message, upload_failed_message};
use crate::{Effect, Msg, UploadSession, UploadStatus};

/// Pure update function: applies a message to the session and returns any effects.
///
/// Results that belong to a superseded attempt, or that arrive in a stage
/// that no longer expects them, leave the session untouched. A compressed
/// video nobody will upload is handed back for deletion.
pub fn update(mut state: UploadSession, msg: Msg) -> (UploadSession, Vec<Effect>) {
    let effects = match msg {
        Msg::VideoSelected(asset) => {
            let cancel_previous = state.status().is_in_flight();
            let attempt = state.begin_attempt(asset.clone());
            let mut effects = Vec::with_capacity(2);
            if cancel_previous {
                effects.push(Effect::CancelAll);
            }
            effects.push(Effect::Compress { attempt, asset });
            effects
        }
        Msg::ResetClicked => {
            let cancel_previous = state.status().is_in_flight();
            state.reset();
            if cancel_previous {
                vec![Effect::CancelAll]
            } else {
                Vec::new()
            }
        }
        Msg::CompressionProgress { attempt, progress } => {
            if state.accepts(attempt, UploadStatus::Compressing) {
                state.set_progress(progress);
            }
            Vec::new()
        }
        Msg::CompressionFinished { attempt, result } => {
            if !state.accepts(attempt, UploadStatus::Compressing) {
                let effects = match result {
                    Ok(video) => vec![Effect::DiscardVideo { video }],
                    Err(_) => Vec::new(),
                };
                return (state, effects);
            }
            match result {
                Ok(video) => {
                    state.compression_succeeded(video.clone());
                    vec![Effect::Upload { attempt, video }]
                }
                Err(failure) => {
                    state.fail(compression_message(&failure));
                    Vec::new()
                }
            }
        }
        Msg::UploadFinished { attempt, result } => {
            if !state.accepts(attempt, UploadStatus::Uploading) {
                return (state, Vec::new());
            }
            match result {
                Ok(job_id) => {
                    state.job_accepted(job_id.clone());
                    vec![Effect::StartPolling { attempt, job_id }]
                }
                Err(_) => {
                    state.fail(upload_failed_message());
                    Vec::new()
                }
            }
        }
        Msg::JobStatusObserved { attempt, status } => {
            if !state.accepts(attempt, UploadStatus::Processing) {
                return (state, Vec::new());
            }
            if state.observe_job_status(status) {
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
        Msg::PollFailed { attempt, .. } => {
            if !state.accepts(attempt, UploadStatus::Processing) {
                return (state, Vec::new());
            }
            state.fail(poll_failed_message());
            vec![Effect::StopPolling]
        }
    };

    (state, effects)
}
