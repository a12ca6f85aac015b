// Frame sampling
pub const DEFAULT_FPS: f64 = 5.0;

// Frame hash definitions
pub const DEFAULT_HASH_SIZE: u32 = 8;
pub const MIN_HASH_SIZE: u32 = 2;

//Frames are downscaled by ffmpeg before hashing so that this many pixels along the longest
//edge are handed to the hash function for each bit along the edge of the hash.
pub const VIDEO_SIZE_MULTIPLIER: u32 = 25;

//PHash takes its DCT over a square this many times larger than the hash itself.
pub const PHASH_HIGHFREQ_FACTOR: u32 = 4;

// Matching defaults
pub const DEFAULT_HAMMING_DIST: u32 = 3;
pub const DEFAULT_PERCENTAGE_OVERLAP: f64 = 30.0;
pub const DEFAULT_COUNT_OVERLAP: usize = 3;
pub const DEFAULT_TIME_OVERLAP: f64 = 3.0;

// ffmpeg is killed if a single video takes longer than this to decode.
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60 * 60;
