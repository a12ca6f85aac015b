use std::path::{Path, PathBuf};

use ffmpeg_cmdline_utils::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a [`VideoHash`][crate::VideoHash] could not be created for a file.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum HashCreationErrorKind {
    /// ffprobe could not read duration, resolution or frame rate from the file. Usually the file
    /// is missing, unreadable, or not a video.
    #[error("Could not read video information from {src_path}: {error}")]
    DetermineVideo {
        src_path: PathBuf,
        error: FfmpegError,
    },

    /// ffmpeg failed or timed out while decoding frames, or the file has no usable video stream.
    #[error("Frame extraction failed for {src_path}: {error}")]
    VideoProcessing {
        src_path: PathBuf,
        error: FfmpegError,
    },
}

impl HashCreationErrorKind {
    /// The file that could not be hashed.
    pub fn src_path(&self) -> &Path {
        match self {
            Self::DetermineVideo { src_path, .. } | Self::VideoProcessing { src_path, .. } => {
                src_path
            }
        }
    }
}
