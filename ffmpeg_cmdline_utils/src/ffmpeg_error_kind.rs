use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

/// Reasons an ffmpeg or ffprobe invocation can fail.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FfmpegError {
    /// The ffmpeg or ffprobe executable could not be started.
    #[error("ffmpeg/ffprobe not found. Install ffmpeg and make sure both tools are on the PATH")]
    FfmpegNotFound,

    /// Spawning the process, or reading from its pipes, failed.
    #[error("Ffmpeg IO error: {0}")]
    Io(String),

    /// The process exited unsuccessfully. Holds the start of whatever it printed to stderr,
    /// truncated since ffmpeg can be very verbose.
    #[error("Ffmpeg exited with an error: {0}")]
    FfmpegInternal(String),

    /// Process output was not valid utf8.
    #[error("ffmpeg output was not valid utf8")]
    Utf8Conversion,

    /// No video stream, or a video stream with a zero dimension. Audio-only files end up here.
    #[error("File contains no video stream with a valid resolution")]
    InvalidResolution,

    /// Frames were still being decoded when the deadline passed.
    #[error("Ffmpeg timed out after {0} seconds")]
    Timeout(u64),

    /// ffprobe ran but its report could not be understood.
    #[error("Failed to get video properties: {0}")]
    Info(#[from] VideoInfoError),
}
