use std::fmt;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::InvalidHashData;

/// The perceptual hash of a single sampled video frame.
///
/// A `FrameHash` is a fixed-width bit pattern. Two hashes are equal only if every bit is
/// identical; the weaker notion of "looking the same" is [`FrameHash::similar_to`], which
/// tolerates a small number of differing bits.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "FrameHashParts")]
pub struct FrameHash {
    // bits past num_bits are always zero, so derived Eq and Hash only see the pattern itself.
    words: Vec<u64>,
    num_bits: u32,
}

#[derive(Deserialize)]
struct FrameHashParts {
    words: Vec<u64>,
    num_bits: u32,
}

impl TryFrom<FrameHashParts> for FrameHash {
    type Error = InvalidHashData;

    fn try_from(FrameHashParts { words, num_bits }: FrameHashParts) -> Result<Self, Self::Error> {
        if words.len() != (num_bits as usize).div_ceil(64) {
            return Err(InvalidHashData::WordCount {
                num_bits,
                words: words.len(),
            });
        }

        let used_bits = num_bits % 64;
        if let Some(last) = words.last() {
            if used_bits != 0 && last >> used_bits != 0 {
                return Err(InvalidHashData::Padding { num_bits });
            }
        }

        Ok(Self { words, num_bits })
    }
}

impl FrameHash {
    /// Pack a sequence of bits into a hash. The first bit is the least significant bit of the
    /// first word.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut bits = bits.into_iter().collect::<BitVec<u64, Lsb0>>();
        let num_bits = bits.len() as u32;
        bits.set_uninitialized(false);

        Self {
            words: bits.into_vec(),
            num_bits,
        }
    }

    /// A hash of `num_bits` bits which are all unset.
    pub fn zeroed(num_bits: u32) -> Self {
        Self {
            words: vec![0; (num_bits as usize).div_ceil(64)],
            num_bits,
        }
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    pub fn bits(&self) -> &BitSlice<u64, Lsb0> {
        &self.words.view_bits::<Lsb0>()[..self.num_bits as usize]
    }

    /// The number of bits which differ between the two hashes.
    ///
    /// Hashes of different widths should never be compared, but if they are then every bit that
    /// is present in only one of the two hashes counts as a difference.
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        if self.num_bits == other.num_bits {
            return self.words.iter().zip(other.words.iter()).fold(0, |acc, (x, y)| {
                let difference = x ^ y;
                let set_bits = difference.count_ones();
                acc + set_bits
            });
        }

        let shared_bits = self.num_bits.min(other.num_bits) as usize;
        let shared_distance = self.bits()[..shared_bits]
            .iter()
            .by_vals()
            .zip(other.bits()[..shared_bits].iter().by_vals())
            .filter(|(x, y)| x != y)
            .count() as u32;

        shared_distance + self.num_bits.abs_diff(other.num_bits)
    }

    /// True if no more than `hamming_dist` bits differ. A distance of 0 means an exact match.
    pub fn similar_to(&self, other: &Self, hamming_dist: u32) -> bool {
        self.hamming_distance(other) <= hamming_dist
    }
}

impl fmt::Display for FrameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_digits = (self.num_bits as usize).div_ceil(4);
        let all_digits = self
            .words
            .iter()
            .rev()
            .map(|word| format!("{word:016x}"))
            .collect::<String>();

        write!(f, "{}", &all_digits[all_digits.len() - num_digits..])
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rand::prelude::*;

    use super::*;

    #[test]
    fn test_from_bits_packs_lsb_first() {
        let hash = FrameHash::from_bits([true, false, true, true]);
        assert_eq!(hash.num_bits(), 4);
        assert_eq!(hash.to_string(), "d");

        let bits = hash.bits().iter().by_vals().collect::<Vec<_>>();
        assert_eq!(bits, vec![true, false, true, true]);
    }

    #[test]
    fn test_malformed_stored_hashes_are_rejected() {
        let parse = |json: &str| serde_json::from_str::<FrameHash>(json);

        let stored = parse(r#"{"words":[15],"num_bits":4}"#).unwrap();
        assert_eq!(stored, FrameHash::from_bits([true; 4]));
        assert_eq!(stored.to_string(), "f");

        assert!(parse(r#"{"words":[255],"num_bits":4}"#).is_err());
        assert!(parse(r#"{"words":[],"num_bits":8}"#).is_err());
        assert!(parse(r#"{"words":[0,0],"num_bits":64}"#).is_err());
        assert!(parse(r#"{"words":[0],"num_bits":0}"#).is_err());

        let full_width = format!(r#"{{"words":[{}],"num_bits":64}}"#, u64::MAX);
        assert_eq!(parse(&full_width).unwrap().hamming_distance(&FrameHash::zeroed(64)), 64);
    }

    #[test]
    fn test_display_is_zero_padded_hex() {
        let hash = FrameHash::from_bits((0..64).map(|i| i == 0));
        assert_eq!(hash.to_string(), "0000000000000001");

        let wide = FrameHash::from_bits((0..100).map(|i| i == 64));
        assert_eq!(wide.to_string(), "0000000010000000000000000");
    }

    #[test]
    fn test_zeroed_equals_all_false_bits() {
        for num_bits in [4, 36, 64, 100, 256] {
            let from_bits = FrameHash::from_bits(std::iter::repeat(false).take(num_bits as usize));
            assert_eq!(FrameHash::zeroed(num_bits), from_bits);
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let hash = FrameHash::random(&mut rng, 64);
            assert_eq!(hash.hamming_distance(&hash), 0);
            assert!(hash.similar_to(&hash, 0));
        }
    }

    #[test]
    fn test_distance_is_symmetric_and_obeys_triangle_inequality() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1_000 {
            let h1 = FrameHash::random(&mut rng, 100);
            let h2 = FrameHash::random(&mut rng, 100);
            let h3 = FrameHash::random(&mut rng, 100);

            let d12 = h1.hamming_distance(&h2);
            let d13 = h1.hamming_distance(&h3);
            let d23 = h2.hamming_distance(&h3);

            assert_eq!(d12, h2.hamming_distance(&h1));
            assert!(d12 <= d13 + d23);
        }
    }

    #[test]
    fn test_similarity_threshold_is_inclusive() {
        let mut rng = StdRng::seed_from_u64(3);
        let base = FrameHash::random(&mut rng, 64);

        for distance in 0..=10 {
            let other = base.with_distance(distance, &mut rng);
            assert_eq!(base.hamming_distance(&other), distance);
            assert!(base.similar_to(&other, distance));
            if distance > 0 {
                assert!(!base.similar_to(&other, distance - 1));
            }
        }
    }

    #[test]
    fn test_mismatched_widths_count_missing_bits_as_different() {
        let short = FrameHash::zeroed(36);
        let long = FrameHash::zeroed(64);
        assert_eq!(short.hamming_distance(&long), 28);
        assert_eq!(long.hamming_distance(&short), 28);

        let long_with_bit = FrameHash::from_bits((0..64).map(|i| i == 3));
        assert_eq!(short.hamming_distance(&long_with_bit), 29);
    }

    #[test]
    fn test_equal_hashes_deduplicate_in_sets() {
        let mut rng = StdRng::seed_from_u64(4);
        let hash = FrameHash::random(&mut rng, 64);
        let near = hash.with_distance(1, &mut rng);

        let set = [hash.clone(), hash.clone(), near.clone()]
            .into_iter()
            .collect::<HashSet<_>>();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&hash));
        assert!(set.contains(&near));
    }

    #[test]
    fn test_serde_round_trip_preserves_equality() {
        let mut rng = StdRng::seed_from_u64(5);
        let hash = FrameHash::random(&mut rng, 100);
        let json = serde_json::to_string(&hash).unwrap();
        let parsed: FrameHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, parsed);
    }
}
