use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definitions::MIN_HASH_SIZE;

/// Stored hash data that could not have been produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvalidHashData {
    #[error("a {num_bits} bit frame hash cannot be stored in {words} words")]
    WordCount { num_bits: u32, words: usize },

    #[error("frame hash has bits set past its width of {num_bits}")]
    Padding { num_bits: u32 },

    #[error("hash_size must be at least {min}, got {0}", min = MIN_HASH_SIZE)]
    HashSize(u32),

    #[error("fps must be a positive number, got {0}")]
    Fps(f64),
}
