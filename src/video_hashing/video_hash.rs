use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::*;

/// The fingerprint of a whole video: the hash of every sampled frame, in temporal order, along
/// with the duration of the video and the options that were used to create it.
///
/// A `VideoHash` is immutable. The de-duplicated set of frame hashes and the blank frame hash
/// are computed once at construction and never drift from the sequence.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "VideoHashParts", into = "VideoHashParts")]
pub struct VideoHash {
    frame_hashes: Vec<FrameHash>,
    duration: f64,
    hash_options: HashOptions,

    hash_set: HashSet<FrameHash>,
    blank_hash: FrameHash,
}

//only the source fields are serialized. The caches are rebuilt when deserializing.
#[derive(Serialize, Deserialize)]
struct VideoHashParts {
    frame_hashes: Vec<FrameHash>,
    duration: f64,
    hash_options: HashOptions,
}

impl From<VideoHashParts> for VideoHash {
    fn from(parts: VideoHashParts) -> Self {
        Self::new(parts.frame_hashes, parts.duration, parts.hash_options)
    }
}

impl From<VideoHash> for VideoHashParts {
    fn from(hash: VideoHash) -> Self {
        Self {
            frame_hashes: hash.frame_hashes,
            duration: hash.duration,
            hash_options: hash.hash_options,
        }
    }
}

impl VideoHash {
    /// Assemble a hash from the frame hashes of a video (in temporal order), its duration in
    /// seconds, and the options the frame hashes were created with.
    pub fn new(frame_hashes: Vec<FrameHash>, duration: f64, hash_options: HashOptions) -> Self {
        let hash_set = frame_hashes.iter().cloned().collect();
        let blank_hash = hash_options.settings.blank_hash();

        Self {
            frame_hashes,
            duration,
            hash_options,
            hash_set,
            blank_hash,
        }
    }

    /// The hash of each sampled frame, in the order the frames appear in the video.
    pub fn frame_hashes(&self) -> &[FrameHash] {
        &self.frame_hashes
    }

    /// The duration of the video, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn hash_options(&self) -> &HashOptions {
        &self.hash_options
    }

    /// The distinct frame hashes of the video, ignoring order and repetition.
    pub fn hash_set(&self) -> &HashSet<FrameHash> {
        &self.hash_set
    }

    /// The hash of a black frame under this video's hash settings.
    pub fn blank_hash(&self) -> &FrameHash {
        &self.blank_hash
    }

    /// The number of sampled frames.
    pub fn len(&self) -> usize {
        self.frame_hashes.len()
    }

    /// True if any sampled frame hashed exactly to the blank hash.
    pub fn has_blank_frame(&self) -> bool {
        self.hash_set.contains(&self.blank_hash)
    }

    /// The distinct frame hashes of this video, excluding the blank hash if `ignore_blank` is set.
    pub fn unique_hashes(&self, ignore_blank: bool) -> impl Iterator<Item = &FrameHash> + '_ {
        self.hash_set
            .iter()
            .filter(move |hash| !(ignore_blank && **hash == self.blank_hash))
    }

    /// Every distinct frame hash of this video that is within `hamming_dist` bits of `target`.
    ///
    /// If `ignore_blank` is set, this video's blank hash is never returned. `target` itself is
    /// always compared, even if it is blank. The order of the results is unspecified.
    pub fn matching_hashes<'a>(
        &'a self,
        target: &'a FrameHash,
        hamming_dist: u32,
        ignore_blank: bool,
    ) -> impl Iterator<Item = &'a FrameHash> + 'a {
        self.unique_hashes(ignore_blank)
            .filter(move |hash| hash.similar_to(target, hamming_dist))
    }

    /// True if any distinct frame hash of this video is within `hamming_dist` bits of `target`.
    /// `ignore_blank` behaves as in [`VideoHash::matching_hashes`].
    pub fn contains_hash(&self, target: &FrameHash, hamming_dist: u32, ignore_blank: bool) -> bool {
        self.matching_hashes(target, hamming_dist, ignore_blank)
            .next()
            .is_some()
    }

    /// Compare this video with another using the given match policy.
    ///
    /// # Errors
    /// Returns [`MatchError::HashOptionsMismatch`] if the two hashes were created with different
    /// [`HashOptions`].
    pub fn matches_hash(
        &self,
        other: &VideoHash,
        match_options: &MatchOptions,
    ) -> Result<bool, MatchError> {
        match_options.check_match(self, other)
    }
}

//Utilities for testing
#[doc(hidden)]
pub mod test_util {
    use rand::prelude::*;

    use super::VideoHash;
    use crate::{FrameHash, FrameHasher, HashOptions};

    #[doc(hidden)]
    impl FrameHash {
        pub fn random(rng: &mut StdRng, num_bits: u32) -> Self {
            FrameHash::from_bits((0..num_bits).map(|_| rng.gen::<bool>()))
        }

        //flip exactly target_distance distinct bits, chosen at random.
        pub fn with_distance(&self, target_distance: u32, rng: &mut StdRng) -> Self {
            assert!(target_distance <= self.num_bits());

            let mut bit_positions = (0..self.num_bits() as usize).collect::<Vec<_>>();
            bit_positions.shuffle(rng);
            let flipped = &bit_positions[..target_distance as usize];

            let ret_hash = FrameHash::from_bits(
                self.bits()
                    .iter()
                    .by_vals()
                    .enumerate()
                    .map(|(pos, bit)| bit ^ flipped.contains(&pos)),
            );
            assert_eq!(self.hamming_distance(&ret_hash), target_distance);
            ret_hash
        }
    }

    #[doc(hidden)]
    impl VideoHash {
        /// A hash of `frames` sampled at `fps` with default settings, lasting exactly as long as
        /// the frames do.
        pub fn from_frames_at_fps(frames: Vec<FrameHash>, fps: f64) -> Self {
            let duration = frames.len() as f64 / fps;
            let options = HashOptions {
                fps,
                ..HashOptions::default()
            };
            Self::new(frames, duration, options)
        }

        pub fn random_with_len(rng: &mut StdRng, len: usize, fps: f64) -> Self {
            let num_bits = HashOptions::default().settings.blank_hash().num_bits();
            let frames = (0..len).map(|_| FrameHash::random(rng, num_bits)).collect();
            Self::from_frames_at_fps(frames, fps)
        }

        pub fn with_duration(&self, duration: f64) -> Self {
            Self::new(self.frame_hashes.clone(), duration, self.hash_options)
        }

        pub fn with_hash_options(&self, hash_options: HashOptions) -> Self {
            Self::new(self.frame_hashes.clone(), self.duration, hash_options)
        }

        /// The same frames played backwards.
        pub fn reversed(&self) -> Self {
            let frames = self.frame_hashes.iter().rev().cloned().collect();
            Self::new(frames, self.duration, self.hash_options)
        }

        /// Frames `start..end` of this video, as if cut out into their own clip.
        pub fn clip(&self, start: usize, end: usize) -> Self {
            let frames = self.frame_hashes[start..end].to_vec();
            Self::from_frames_at_fps(frames, self.hash_options.fps)
                .with_hash_options(self.hash_options)
        }
    }
}
