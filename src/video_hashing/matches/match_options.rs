use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

/// Error type for comparisons between two [`VideoHash`]es.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchError {
    /// The two hashes were created with different [`HashOptions`], so their frame hashes
    /// cannot be compared.
    #[error("Cannot compare hashes created with different options: {left:?} and {right:?}")]
    HashOptionsMismatch {
        left: HashOptions,
        right: HashOptions,
    },
}

/// A rule that decides whether two videos share content.
///
/// * [`PercentageMatch`] and [`FrameCountMatch`] count frames of one video that look like any
///   frame of the other, ignoring order. They find repeated content anywhere in either video.
/// * [`DurationMatch`] looks for a single contiguous scene that appears in both videos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchOptions {
    Percentage(PercentageMatch),
    FrameCount(FrameCountMatch),
    Duration(DurationMatch),
}

impl Default for MatchOptions {
    /// [`PercentageMatch::default`]: 30% of frames within 3 bits.
    fn default() -> Self {
        Self::Percentage(PercentageMatch::default())
    }
}

impl From<PercentageMatch> for MatchOptions {
    fn from(options: PercentageMatch) -> Self {
        Self::Percentage(options)
    }
}

impl From<FrameCountMatch> for MatchOptions {
    fn from(options: FrameCountMatch) -> Self {
        Self::FrameCount(options)
    }
}

impl From<DurationMatch> for MatchOptions {
    fn from(options: DurationMatch) -> Self {
        Self::Duration(options)
    }
}

impl MatchOptions {
    /// The maximum number of differing bits for two frame hashes to be considered the same frame.
    pub fn hamming_dist(&self) -> u32 {
        match self {
            Self::Percentage(options) => options.hamming_dist,
            Self::FrameCount(options) => options.hamming_dist,
            Self::Duration(options) => options.hamming_dist,
        }
    }

    /// Decide whether the two videos match under this policy.
    ///
    /// # Errors
    /// Returns [`MatchError::HashOptionsMismatch`] if the hashes were created with different
    /// [`HashOptions`]. This is checked before any frames are compared.
    pub fn check_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> Result<bool, MatchError> {
        if hash1.hash_options() != hash2.hash_options() {
            return Err(MatchError::HashOptionsMismatch {
                left: *hash1.hash_options(),
                right: *hash2.hash_options(),
            });
        }

        let is_match = match self {
            Self::Percentage(options) => options.is_match(hash1, hash2),
            Self::FrameCount(options) => options.is_match(hash1, hash2),
            Self::Duration(options) => options.is_match(hash1, hash2),
        };

        debug!(
            target: "matching",
            "{self:?} over {} and {} frames: {}",
            hash1.len(),
            hash2.len(),
            if is_match { "match" } else { "no match" }
        );

        Ok(is_match)
    }
}
