use log::debug;
use serde::{Deserialize, Serialize};

use crate::{definitions::*, *};

/// Match if enough of the distinct frames of the shorter video also appear in the longer one.
///
/// The number of frames required is `percentage_overlap` percent of the number of distinct
/// frames in whichever video has fewer of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentageMatch {
    /// Frames within this many bits of each other are considered the same frame.
    pub hamming_dist: u32,

    /// Percentage (0 to 100) of distinct frames that must be shared.
    pub percentage_overlap: f64,

    /// Do not count black frames, which tend to appear in otherwise unrelated videos.
    pub ignore_blank: bool,
}

impl Default for PercentageMatch {
    fn default() -> Self {
        Self {
            hamming_dist: DEFAULT_HAMMING_DIST,
            percentage_overlap: DEFAULT_PERCENTAGE_OVERLAP,
            ignore_blank: true,
        }
    }
}

impl PercentageMatch {
    /// # Errors
    /// Returns [`MatchError::HashOptionsMismatch`] if the hashes were created with different
    /// [`HashOptions`].
    pub fn check_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> Result<bool, MatchError> {
        MatchOptions::from(*self).check_match(hash1, hash2)
    }

    pub(crate) fn is_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> bool {
        let (shorter, longer) = if hash2.duration() < hash1.duration() {
            (hash2, hash1)
        } else {
            (hash1, hash2)
        };

        let smallest_set = hash1.hash_set().len().min(hash2.hash_set().len());
        let required_overlap = self.percentage_overlap * smallest_set as f64 / 100.0;

        has_overlap(
            shorter.unique_hashes(self.ignore_blank),
            longer,
            required_overlap,
            self.hamming_dist,
            self.ignore_blank,
        )
    }
}

/// Match if at least `count_overlap` distinct frames of the first video also appear in the
/// second. If either video has fewer distinct frames than that, all of them must be shared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameCountMatch {
    /// Frames within this many bits of each other are considered the same frame.
    pub hamming_dist: u32,

    /// Number of distinct frames that must be shared.
    pub count_overlap: usize,

    /// Do not count black frames, which tend to appear in otherwise unrelated videos.
    pub ignore_blank: bool,
}

impl Default for FrameCountMatch {
    fn default() -> Self {
        Self {
            hamming_dist: DEFAULT_HAMMING_DIST,
            count_overlap: DEFAULT_COUNT_OVERLAP,
            ignore_blank: true,
        }
    }
}

impl FrameCountMatch {
    /// # Errors
    /// Returns [`MatchError::HashOptionsMismatch`] if the hashes were created with different
    /// [`HashOptions`].
    pub fn check_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> Result<bool, MatchError> {
        MatchOptions::from(*self).check_match(hash1, hash2)
    }

    pub(crate) fn is_match(&self, hash1: &VideoHash, hash2: &VideoHash) -> bool {
        let required_overlap = self
            .count_overlap
            .min(hash1.hash_set().len())
            .min(hash2.hash_set().len());

        has_overlap(
            hash1.unique_hashes(self.ignore_blank),
            hash2,
            required_overlap as f64,
            self.hamming_dist,
            self.ignore_blank,
        )
    }
}

// Count the candidates that appear in `other`, stopping as soon as there are enough.
fn has_overlap<'a>(
    candidates: impl IntoIterator<Item = &'a FrameHash>,
    other: &VideoHash,
    required_overlap: f64,
    hamming_dist: u32,
    ignore_blank: bool,
) -> bool {
    debug!(target: "matching", "required overlap: {required_overlap} frames");

    if required_overlap <= 0.0 {
        return true;
    }

    let mut overlap = 0usize;
    for candidate in candidates {
        if other.contains_hash(candidate, hamming_dist, ignore_blank) {
            overlap += 1;
            if overlap as f64 >= required_overlap {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;

    fn blank() -> FrameHash {
        HashOptions::default().settings.blank_hash()
    }

    fn random_frames(rng: &mut StdRng, count: usize) -> Vec<FrameHash> {
        (0..count).map(|_| FrameHash::random(rng, 64)).collect()
    }

    // two videos that share exactly `shared` frames, each with `own` frames of their own.
    fn overlapping_pair(rng: &mut StdRng, shared: usize, own: usize) -> (VideoHash, VideoHash) {
        let shared_frames = random_frames(rng, shared);
        let mut frames_1 = random_frames(rng, own);
        frames_1.extend(shared_frames.iter().cloned());
        let mut frames_2 = shared_frames;
        frames_2.extend(random_frames(rng, own));

        (
            VideoHash::from_frames_at_fps(frames_1, 5.0),
            VideoHash::from_frames_at_fps(frames_2, 5.0),
        )
    }

    #[test]
    fn test_zero_required_overlap_is_satisfied_immediately() {
        let empty = VideoHash::from_frames_at_fps(vec![], 5.0);
        assert!(has_overlap(std::iter::empty(), &empty, 0.0, 0, true));

        let mut rng = StdRng::seed_from_u64(1);
        let video = VideoHash::random_with_len(&mut rng, 10, 5.0);
        for policy in [
            MatchOptions::from(PercentageMatch::default()),
            FrameCountMatch::default().into(),
        ] {
            assert!(policy.check_match(&empty, &video).unwrap());
            assert!(policy.check_match(&video, &empty).unwrap());
            assert!(policy.check_match(&empty, &empty).unwrap());
        }

        let zero_count = FrameCountMatch {
            count_overlap: 0,
            ..Default::default()
        };
        let unrelated = VideoHash::random_with_len(&mut rng, 10, 5.0);
        assert!(zero_count.check_match(&video, &unrelated).unwrap());
    }

    #[test]
    fn test_fractional_requirement_rounds_up() {
        let mut rng = StdRng::seed_from_u64(2);
        // 10 distinct frames each, 30% => 3 frames required
        let (hash1, hash2) = overlapping_pair(&mut rng, 3, 7);
        let (hash3, hash4) = overlapping_pair(&mut rng, 2, 8);

        let options = PercentageMatch::default();
        assert!(options.check_match(&hash1, &hash2).unwrap());
        assert!(!options.check_match(&hash3, &hash4).unwrap());

        // 25% of 10 is 2.5, so 2 shared frames are not enough
        let options = PercentageMatch {
            percentage_overlap: 25.0,
            ..Default::default()
        };
        assert!(!options.check_match(&hash3, &hash4).unwrap());
        assert!(options.check_match(&hash1, &hash2).unwrap());
    }

    #[test]
    fn test_percentage_is_relative_to_the_smaller_set() {
        let mut rng = StdRng::seed_from_u64(3);
        let long = VideoHash::random_with_len(&mut rng, 100, 5.0);

        //a 10 frame clip of the long video shares 100% of its frames, but only 10% of the long one's.
        let clip = long.clip(50, 60);
        let options = PercentageMatch {
            percentage_overlap: 100.0,
            ..Default::default()
        };
        assert!(options.check_match(&clip, &long).unwrap());
        assert!(options.check_match(&long, &clip).unwrap());
    }

    #[test]
    fn test_repeated_frames_count_once() {
        let mut rng = StdRng::seed_from_u64(4);
        let shared = FrameHash::random(&mut rng, 64);
        let hash1 = VideoHash::from_frames_at_fps(vec![shared.clone(); 10], 5.0);
        let mut frames_2 = random_frames(&mut rng, 9);
        frames_2.push(shared);
        let hash2 = VideoHash::from_frames_at_fps(frames_2, 5.0);

        //only one distinct frame in hash1, so the requirement is capped to one.
        let options = FrameCountMatch {
            count_overlap: 5,
            ..Default::default()
        };
        assert!(options.check_match(&hash1, &hash2).unwrap());

        let options = FrameCountMatch {
            count_overlap: 2,
            ..Default::default()
        };
        let hash3 = hash1.with_duration(100.0);
        let (hash4, _) = overlapping_pair(&mut rng, 1, 5);
        assert!(!options.check_match(&hash3, &hash4).unwrap());
    }

    #[test]
    fn test_near_duplicate_frames_count_as_shared() {
        let mut rng = StdRng::seed_from_u64(5);
        let frames = random_frames(&mut rng, 10);
        let noisy_frames = frames
            .iter()
            .map(|frame| frame.with_distance(3, &mut rng))
            .collect::<Vec<_>>();

        let hash1 = VideoHash::from_frames_at_fps(frames, 5.0);
        let hash2 = VideoHash::from_frames_at_fps(noisy_frames, 5.0);

        let options = FrameCountMatch {
            count_overlap: 10,
            ..Default::default()
        };
        assert!(options.check_match(&hash1, &hash2).unwrap());

        let strict = FrameCountMatch {
            hamming_dist: 2,
            ..options
        };
        assert!(!strict.check_match(&hash1, &hash2).unwrap());
    }

    #[test]
    fn test_blank_frames_are_ignored_on_request() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut frames_1 = random_frames(&mut rng, 5);
        frames_1.push(blank());
        let mut frames_2 = random_frames(&mut rng, 5);
        frames_2.push(blank());

        let hash1 = VideoHash::from_frames_at_fps(frames_1, 5.0);
        let hash2 = VideoHash::from_frames_at_fps(frames_2, 5.0);

        let keep_blank = FrameCountMatch {
            hamming_dist: 0,
            count_overlap: 1,
            ignore_blank: false,
        };
        let ignore_blank = FrameCountMatch {
            ignore_blank: true,
            ..keep_blank
        };
        assert!(keep_blank.check_match(&hash1, &hash2).unwrap());
        assert!(!ignore_blank.check_match(&hash1, &hash2).unwrap());

        let keep_blank = PercentageMatch {
            hamming_dist: 0,
            percentage_overlap: 10.0,
            ignore_blank: false,
        };
        let ignore_blank = PercentageMatch {
            ignore_blank: true,
            ..keep_blank
        };
        assert!(keep_blank.check_match(&hash1, &hash2).unwrap());
        assert!(!ignore_blank.check_match(&hash1, &hash2).unwrap());
    }
}
