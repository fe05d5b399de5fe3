use uploader_core::{SessionView, UploadStatus};

/// One line of terminal output for a session snapshot.
pub fn status_line(view: &SessionView) -> String {
    match view.status {
        UploadStatus::Idle => match &view.error {
            Some(error) => format!("failed: {error}"),
            None => "idle".to_string(),
        },
        UploadStatus::Compressing => format!("compressing {:>3}%", view.progress_percent()),
        UploadStatus::Uploading => match &view.video {
            Some(video) => format!(
                "uploading {} ({})",
                video.path.display(),
                size(video.size_bytes)
            ),
            None => "uploading".to_string(),
        },
        UploadStatus::Processing => {
            let job = view.job_id.as_deref().unwrap_or("?");
            match &view.job_status {
                Some(status) => format!("processing job {job}: {}", status.state),
                None => format!("processing job {job}"),
            }
        }
        UploadStatus::Done => format!("done: job {}", view.job_id.as_deref().unwrap_or("?")),
    }
}

fn size(bytes: u64) -> String {
    const KB: u64 = 1024;
    if bytes >= KB * KB {
        format!("{:.1} MB", bytes as f64 / (KB * KB) as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uploader_core::{CompressedVideo, JobStatus};

    use super::*;

    fn view(status: UploadStatus) -> SessionView {
        SessionView {
            status,
            ..SessionView::default()
        }
    }

    #[test]
    fn idle_and_failed() {
        assert_eq!(status_line(&view(UploadStatus::Idle)), "idle");
        let failed = SessionView {
            error: Some("The selected video is larger than 100MB.".to_string()),
            ..view(UploadStatus::Idle)
        };
        assert_eq!(
            status_line(&failed),
            "failed: The selected video is larger than 100MB."
        );
    }

    #[test]
    fn compressing_shows_percent() {
        let v = SessionView {
            progress: 0.5,
            ..view(UploadStatus::Compressing)
        };
        assert_eq!(status_line(&v), "compressing  50%");
    }

    #[test]
    fn uploading_shows_artifact() {
        let v = SessionView {
            video: Some(CompressedVideo::mp4("/tmp/clip.mp4", 3 * 1024 * 1024 / 2)),
            ..view(UploadStatus::Uploading)
        };
        assert_eq!(status_line(&v), "uploading /tmp/clip.mp4 (1.5 MB)");
    }

    #[test]
    fn processing_and_done_show_job() {
        let processing = SessionView {
            job_id: Some("abc123".to_string()),
            job_status: Some(JobStatus::new("JOB_STATE_PROCESSING")),
            ..view(UploadStatus::Processing)
        };
        assert_eq!(
            status_line(&processing),
            "processing job abc123: JOB_STATE_PROCESSING"
        );

        let done = SessionView {
            job_id: Some("abc123".to_string()),
            ..view(UploadStatus::Done)
        };
        assert_eq!(status_line(&done), "done: job abc123");
    }

    #[test]
    fn sizes() {
        assert_eq!(size(512), "512 B");
        assert_eq!(size(2048), "2.0 KB");
    }
}
