use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use ffmpeg_cmdline_utils::{FfmpegFrameReaderBuilder, VideoInfo};
use tempfile::TempDir;
use vidhash::*;

// Synthesize a short test clip with ffmpeg's lavfi test source.
fn make_clip(dir: &Path, name: &str, size: &str, seconds: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc2=size={size}:rate=25:duration={seconds}"))
        .args(["-c:v", "mpeg4", "-q:v", "2"])
        .arg(&path)
        .stdin(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());
    path
}

// Returns None (and the test passes vacuously) on machines without ffmpeg.
fn test_clips() -> Option<(TempDir, PathBuf, PathBuf)> {
    if !ffmpeg_and_ffprobe_are_callable() {
        eprintln!("ffmpeg/ffprobe not found, skipping");
        return None;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = make_clip(dir.path(), "clip.mp4", "640x360", 4);
    let small = make_clip(dir.path(), "clip_small.mp4", "320x180", 4);
    Some((dir, clip, small))
}

#[test]
fn test_hash_video_samples_at_fps() {
    let Some((_dir, clip, _small)) = test_clips() else {
        return;
    };

    let hash = hash_video(&clip, &HashOptions::default()).unwrap();

    assert!((18..=22).contains(&hash.len()), "{} frames", hash.len());
    assert!((hash.duration() - 4.0).abs() < 0.5, "{}s", hash.duration());
    assert_eq!(hash.hash_options(), &HashOptions::default());
    assert!(hash.frame_hashes().iter().all(|frame| frame.num_bits() == 64));
}

#[test]
fn test_frame_reader_streams_downscaled_frames() {
    let Some((_dir, clip, _small)) = test_clips() else {
        return;
    };

    let (mut frames, info) = FfmpegFrameReaderBuilder::new(&clip)
        .fps(5.0)
        .max_dimension(200)
        .spawn_gray()
        .unwrap();
    assert_eq!(info.resolution(), (640, 360));
    assert_eq!(frames.frame_dimensions(), (200, 112));

    let mut count = 0;
    for frame in &mut frames {
        assert_eq!(frame.dimensions(), (200, 112));
        count += 1;
    }
    assert_eq!(frames.finish().unwrap(), count);
    assert!((18..=22).contains(&count), "{count} frames");

    //stopping early is not a failure.
    let info = VideoInfo::new(&clip).unwrap();
    let mut frames = FfmpegFrameReaderBuilder::new(&clip)
        .fps(5.0)
        .spawn_gray_with_info(&info)
        .unwrap();
    assert_eq!(frames.by_ref().take(3).count(), 3);
    assert_eq!(frames.frames_read(), 3);
    assert_eq!(frames.finish().unwrap(), 3);
}

// The second stream is larger, so ffmpeg would pick it by default.
fn make_two_stream_clip(dir: &Path) -> PathBuf {
    let path = dir.join("two_streams.mkv");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i", "testsrc2=size=320x180:rate=25:duration=4"])
        .args(["-f", "lavfi", "-i", "mandelbrot=size=640x360:rate=25"])
        .args(["-map", "0:v", "-map", "1:v", "-t", "4", "-c:v", "mpeg4", "-q:v", "2"])
        .arg(&path)
        .stdin(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());
    path
}

#[test]
fn test_frames_come_from_the_first_video_stream() {
    let Some((dir, _clip, small)) = test_clips() else {
        return;
    };
    let two_streams = make_two_stream_clip(dir.path());

    let (mut frames, info) = FfmpegFrameReaderBuilder::new(&two_streams)
        .fps(5.0)
        .spawn_gray()
        .unwrap();
    assert_eq!(info.resolution(), (320, 180));

    let mut count = 0;
    for frame in &mut frames {
        assert_eq!(frame.dimensions(), (320, 180));
        count += 1;
    }
    assert_eq!(frames.finish().unwrap(), count);
    assert!((18..=22).contains(&count), "{count} frames");

    let options = HashOptions::default();
    let expected = hash_video(&small, &options).unwrap();
    let actual = hash_video(&two_streams, &options).unwrap();
    assert!(FrameCountMatch::default().check_match(&expected, &actual).unwrap());
}

#[test]
fn test_hashing_is_deterministic() {
    let Some((_dir, clip, _small)) = test_clips() else {
        return;
    };

    let options = HashOptions::new(2.0, PHash::default());
    let first = hash_video(&clip, &options).unwrap();
    let second = hash_video(&clip, &options).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_video_matches_itself_and_a_downscaled_copy() {
    let Some((_dir, clip, small)) = test_clips() else {
        return;
    };

    let options = HashOptions::default();
    let hash = hash_video(&clip, &options).unwrap();
    let small_hash = hash_video(&small, &options).unwrap();

    let policies = [
        MatchOptions::default(),
        FrameCountMatch::default().into(),
        DurationMatch::default().into(),
    ];
    for policy in policies {
        assert!(policy.check_match(&hash, &hash).unwrap(), "{policy:?}");
    }

    assert!(check_match(&clip, &small, &options, &MatchOptions::default()).unwrap());
    assert!(MatchOptions::default().check_match(&hash, &small_hash).unwrap());
}

#[test]
fn test_missing_file_is_an_error() {
    if !ffmpeg_and_ffprobe_are_callable() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.mp4");

    let err = hash_video(&missing, &HashOptions::default()).unwrap_err();
    assert!(matches!(err, HashCreationErrorKind::DetermineVideo { .. }));
    assert_eq!(err.src_path(), missing.as_path());

    let err = check_match(&missing, &missing, &HashOptions::default(), &MatchOptions::default());
    assert!(matches!(err, Err(Error::Hash(_))));
}

#[test]
fn test_non_video_file_is_an_error() {
    if !ffmpeg_and_ffprobe_are_callable() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let text_file = dir.path().join("notes.txt");
    std::fs::write(&text_file, "not a video").unwrap();

    assert!(hash_video(&text_file, &HashOptions::default()).is_err());
}
