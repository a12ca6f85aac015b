use log::debug;
use serde::{Deserialize, Serialize};

use crate::{definitions::*, *};

/// Match if both videos contain the same contiguous scene, at least `time_overlap` seconds long.
///
/// Unlike [`PercentageMatch`] and [`FrameCountMatch`], frame order matters: the shared frames
/// must appear as an unbroken run, in the same order, in both videos. If either video is shorter
/// than `time_overlap` then the whole of the shorter sequence must be found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationMatch {
    /// Frames within this many bits of each other are considered the same frame.
    pub hamming_dist: u32,

    /// Length of the shared scene, in seconds.
    pub time_overlap: f64,
}

impl Default for DurationMatch {
    fn default() -> Self {
        Self {
            hamming_dist: DEFAULT_HAMMING_DIST,
            time_overlap: DEFAULT_TIME_OVERLAP,
        }
    }
}

impl DurationMatch {
    /// # Errors
    /// Returns [`MatchError::HashOptionsMismatch`] if the hashes were created with different
    /// [`HashOptions`].
    pub fn check_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> Result<bool, MatchError> {
        MatchOptions::from(*self).check_match(hash1, hash2)
    }

    // the length of the window, in frames, at hash1's sampling rate.
    fn frame_count(&self, hash1: &VideoHash, hash2: &VideoHash) -> usize {
        let wanted = (hash1.hash_options().fps * self.time_overlap).ceil() as usize;
        wanted.min(hash1.len()).min(hash2.len())
    }

    pub(crate) fn is_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> bool {
        let (shorter, longer) = if hash2.duration() < hash1.duration() {
            (hash2, hash1)
        } else {
            (hash1, hash2)
        };
        let (shorter, longer) = (shorter.frame_hashes(), longer.frame_hashes());

        let frame_count = self.frame_count(hash1, hash2);
        debug!(target: "matching", "required overlap: {frame_count} consecutive frames");

        //an empty window fits at the first offset pair, if there is one.
        if frame_count == 0 {
            return !shorter.is_empty() && !longer.is_empty();
        }

        shorter.windows(frame_count).any(|shorter_window| {
            longer.windows(frame_count).any(|longer_window| {
                shorter_window
                    .iter()
                    .zip(longer_window)
                    .all(|(x, y)| x.similar_to(y, self.hamming_dist))
            })
        })
    }
}
