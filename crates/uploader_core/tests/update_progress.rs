use uploader_core::{update, Msg, UploadSession, UploadStatus, VideoAsset};

fn compressing() -> UploadSession {
    let (state, _) = update(
        UploadSession::new(),
        Msg::VideoSelected(VideoAsset::new("clip.mov")),
    );
    state
}

fn apply_progress(state: UploadSession, values: &[f64]) -> (UploadSession, Vec<f64>) {
    let attempt = state.attempt();
    let mut observed = Vec::with_capacity(values.len());
    let mut state = state;
    for &progress in values {
        let (next, _) = update(state, Msg::CompressionProgress { attempt, progress });
        observed.push(next.view().progress);
        state = next;
    }
    (state, observed)
}

#[test]
fn progress_never_decreases_within_an_attempt() {
    let (_, observed) = apply_progress(compressing(), &[0.2, 0.6, 0.4, 0.6, 0.9]);

    assert_eq!(observed, vec![0.2, 0.6, 0.6, 0.6, 0.9]);
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn progress_is_clamped_to_unit_interval() {
    let (state, observed) = apply_progress(compressing(), &[-0.5, 1.7, f64::NAN]);

    assert_eq!(observed, vec![0.0, 1.0, 1.0]);
    assert_eq!(state.view().progress_percent(), 100);
}

#[test]
fn unchanged_progress_does_not_mark_dirty() {
    let (mut state, _) = apply_progress(compressing(), &[0.5]);
    assert!(state.consume_dirty());

    let (mut state, _) = apply_progress(state, &[0.5, 0.3]);
    assert!(!state.consume_dirty());
}

#[test]
fn progress_outside_compression_is_ignored() {
    let (state, _) = update(UploadSession::new(), Msg::ResetClicked);
    let attempt = state.attempt();
    let (state, _) = update(
        state,
        Msg::CompressionProgress {
            attempt,
            progress: 0.5,
        },
    );

    assert_eq!(state.status(), UploadStatus::Idle);
    assert_eq!(state.view().progress, 0.0);
}

#[test]
fn progress_resets_after_reset() {
    let (state, _) = apply_progress(compressing(), &[0.3, 0.8]);
    let (state, _) = update(state, Msg::ResetClicked);

    assert_eq!(state.view().progress, 0.0);
    assert_eq!(state.status(), UploadStatus::Idle);
}
