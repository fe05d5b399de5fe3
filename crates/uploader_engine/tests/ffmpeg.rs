#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use common::TestSink;
use pretty_assertions::assert_eq;
use uploader_core::{VideoAsset, VIDEO_MP4};
use uploader_engine::{CompressError, CompressSettings, Compressor, FfmpegCompressor};

const FFPROBE: &str = r#"#!/bin/sh
echo 10.000000
"#;

const FFPROBE_BROKEN: &str = r#"#!/bin/sh
echo "moov atom not found" >&2
exit 1
"#;

const FFMPEG_OK: &str = r#"#!/bin/sh
for out; do :; done
echo "frame=12" >&2
echo "out_time_us=2500000" >&2
echo "progress=continue" >&2
echo "out_time_us=10000000" >&2
echo "progress=end" >&2
printf 'encoded' > "$out"
"#;

const FFMPEG_FAIL: &str = r#"#!/bin/sh
for out; do :; done
printf 'partial' > "$out"
echo "Invalid data found when processing input" >&2
exit 1
"#;

const FFMPEG_HUGE: &str = r#"#!/bin/sh
for out; do :; done
head -c 4096 /dev/zero > "$out"
echo "progress=end" >&2
"#;

/// Writes every stand-in once, before any test spawns a process.
fn scripts() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("ffmpeg-stand-ins");
        std::fs::create_dir_all(&dir).unwrap();
        for (name, body) in [
            ("ffprobe", FFPROBE),
            ("ffprobe-broken", FFPROBE_BROKEN),
            ("ffmpeg-ok", FFMPEG_OK),
            ("ffmpeg-fail", FFMPEG_FAIL),
            ("ffmpeg-huge", FFMPEG_HUGE),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
}

fn compressor(work_dir: &Path, ffmpeg: &str, ffprobe: &str, max_bytes: u64) -> FfmpegCompressor {
    let settings = CompressSettings {
        max_bytes,
        ..CompressSettings::new(work_dir)
    };
    FfmpegCompressor::new(settings)
        .with_binaries(scripts().join(ffmpeg), scripts().join(ffprobe))
}

fn source(dir: &tempfile::TempDir) -> VideoAsset {
    let path = dir.path().join("holiday.mov");
    std::fs::write(&path, b"raw camera bytes").unwrap();
    VideoAsset::new(path)
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

#[tokio::test]
async fn encodes_and_forwards_progress() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let sink = TestSink::new();

    let video = compressor(work.path(), "ffmpeg-ok", "ffprobe", 1024)
        .compress(&source(&src), &sink)
        .await
        .expect("encode ok");

    assert_eq!(sink.progress(), vec![0.0, 0.25, 1.0, 1.0]);
    assert_eq!(video.mime_type, VIDEO_MP4);
    assert_eq!(video.size_bytes, 7);
    assert!(video.path.starts_with(work.path()));
    assert!(video
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("holiday-") && n.ends_with(".mp4")));
    assert_eq!(std::fs::read(&video.path).unwrap(), b"encoded");
}

#[tokio::test]
async fn nonzero_exit_fails_and_removes_partial_output() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let sink = TestSink::new();

    let err = compressor(work.path(), "ffmpeg-fail", "ffprobe", 1024)
        .compress(&source(&src), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, CompressError::Failed(_)), "{err:?}");
    assert_eq!(entries(work.path()), 0);
}

#[tokio::test]
async fn oversized_output_is_rejected_and_removed() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let sink = TestSink::new();

    let err = compressor(work.path(), "ffmpeg-huge", "ffprobe", 1024)
        .compress(&source(&src), &sink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CompressError::TooLarge {
            max_bytes: 1024,
            actual: 4096
        }
    );
    assert_eq!(entries(work.path()), 0);
    // Only the encoder's own end marker; no success report.
    assert_eq!(sink.progress(), vec![0.0, 1.0]);
}

#[tokio::test]
async fn probe_failure_is_reported_before_encoding() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let sink = TestSink::new();

    let err = compressor(work.path(), "ffmpeg-ok", "ffprobe-broken", 1024)
        .compress(&source(&src), &sink)
        .await
        .unwrap_err();

    assert!(
        matches!(err, CompressError::Failed(ref msg) if msg.contains("ffprobe")),
        "{err:?}"
    );
    assert!(sink.progress().is_empty());
    assert_eq!(entries(work.path()), 0);
}

#[tokio::test]
async fn missing_binary_fails() {
    let src = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let sink = TestSink::new();

    let err = compressor(work.path(), "no-such-ffmpeg", "ffprobe", 1024)
        .compress(&source(&src), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, CompressError::Failed(_)), "{err:?}");
    assert_eq!(entries(work.path()), 0);
}
