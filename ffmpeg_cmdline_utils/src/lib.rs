#![allow(clippy::let_and_return)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]

//! Thin wrapper around the `ffmpeg` and `ffprobe` command line tools.
//!
//! Frames are decoded by a child `ffmpeg` process, sampled at a fixed rate, downscaled and
//! streamed back over stdout as raw grayscale buffers. Nothing is written to disk, so any number
//! of readers may run at the same time.
//!
//! `ffmpeg` and `ffprobe` must be installed and visible on the command line.

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{
    ffmpeg_and_ffprobe_are_callable, get_video_stats, scaled_resolution, FfmpegFrameIterGray,
    FfmpegFrameReaderBuilder,
};
pub use ffmpeg_stats::{VideoInfo, VideoInfoError};
