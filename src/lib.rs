#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]

//! # Overview
//! vidhash is a library for fingerprinting video files and deciding whether two videos share
//! content: the same scene, a clip cut from a longer video, or a re-encode of the same footage.
//!
//! # How it works
//! * Frames are sampled from the video at a fixed rate (5 per second by default), and
//!   downscaled by ffmpeg.
//! * Each sampled frame is reduced to a small perceptual hash (a [`FrameHash`]). Frames which
//!   look the same have hashes which differ in only a few bits, even after re-encoding or
//!   resizing.
//! * The hashes of all frames, in order, together with the video's duration form a [`VideoHash`].
//! * Two video hashes are compared with a match policy ([`MatchOptions`]):
//!     * [`PercentageMatch`]: a percentage of distinct frames appear in both videos, in any order.
//!     * [`FrameCountMatch`]: a fixed number of distinct frames appear in both videos.
//!     * [`DurationMatch`]: both videos contain the same contiguous scene of a given length.
//!
//! # High Level API
//! ```rust,no_run
//! use vidhash::{DurationMatch, HashOptions, MatchOptions};
//!
//! let options = HashOptions::default();
//!
//! // Do the two videos share at least 30% of their frames?
//! let shared = vidhash::check_match("movie.mp4", "trailer.mp4", &options, &MatchOptions::default())?;
//!
//! // Or hash once and compare many times. Is there a 10 second scene in common?
//! let movie = vidhash::hash_video("movie.mp4", &options)?;
//! let trailer = vidhash::hash_video("trailer.mp4", &options)?;
//! let policy = MatchOptions::from(DurationMatch {
//!     time_overlap: 10.0,
//!     ..Default::default()
//! });
//! let shared_scene = movie.matches_hash(&trailer, &policy)?;
//! # Ok::<(), vidhash::Error>(())
//! ```
//!
//! Hashes can only be compared when they were created with the same [`HashOptions`]. Comparing
//! hashes created with different options is an error, never a silent non-match.
//!
//! # Black frames
//! Fades, title cards and gaps between scenes are often completely black, and a black frame
//! in one video looks just like a black frame in any other. By default the overlap policies
//! ignore frames which hash exactly to the blank hash.
//!
//! # Prerequisites
//! This crate calls Ffmpeg from the command line. You must make Ffmpeg and Ffprobe available
//! on the command line, for example:
//!
//! * Debian-based systems: ```# apt-get install ffmpeg```
//! * Yum-based systems: ```# yum install ffmpeg```
//! * Windows:
//!     1) Download the correct installer from <https://ffmpeg.org/download.html>
//!     2) Run the installer and install ffmpeg to any directory
//!     3) Add the directory into the PATH environment variable

pub(crate) mod definitions;
pub(crate) mod utils;
pub(crate) mod video_hashing;

use std::path::Path;

use log::info;

pub use ffmpeg_cmdline_utils::{ffmpeg_and_ffprobe_are_callable, FfmpegError};
pub use video_hashing::{
    frame_hash::FrameHash,
    hash_creation_error_kind::HashCreationErrorKind,
    hash_options::HashOptions,
    hash_settings::{DHash, FrameHasher, HashSettings, PHash},
    invalid_hash_data::InvalidHashData,
    matches::{DurationMatch, FrameCountMatch, MatchError, MatchOptions, PercentageMatch},
    video_hash::VideoHash,
    video_hash_builder::VideoHashBuilder,
    Error,
};

#[doc(hidden)]
pub use video_hashing::video_hash::test_util;

/// Sample and hash the video at `src_path`.
///
/// # Errors
/// Returns an error if the file could not be read as a video, or ffmpeg failed while extracting
/// frames.
pub fn hash_video(
    src_path: impl AsRef<Path>,
    hash_options: &HashOptions,
) -> Result<VideoHash, HashCreationErrorKind> {
    VideoHashBuilder::from_options(*hash_options).hash(src_path)
}

/// Hash two videos and compare them with the given match policy. The videos are hashed
/// concurrently.
///
/// # Errors
/// Returns an error if either video could not be hashed. If both videos fail, the error for
/// `path_a` is returned.
pub fn check_match(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
    hash_options: &HashOptions,
    match_options: &MatchOptions,
) -> Result<bool, Error> {
    let (path_a, path_b) = (path_a.as_ref(), path_b.as_ref());
    info!(
        target: "matching",
        "comparing {} and {}",
        path_a.display(),
        path_b.display()
    );

    let (hash_a, hash_b) = rayon::join(
        || hash_video(path_a, hash_options),
        || hash_video(path_b, hash_options),
    );

    let is_match = match_options.check_match(&hash_a?, &hash_b?)?;
    info!(
        target: "matching",
        "{} and {}: {}",
        path_a.display(),
        path_b.display(),
        if is_match { "match" } else { "no match" }
    );

    Ok(is_match)
}
