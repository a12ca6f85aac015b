use image::{imageops, imageops::FilterType, GrayImage};
use serde::{Deserialize, Serialize};

use crate::{definitions::*, utils::dct_ops, FrameHash, InvalidHashData};

/// A perceptual hash algorithm that turns one video frame into a [`FrameHash`].
///
/// New algorithms can be added by implementing this trait and adding a variant to
/// [`HashSettings`]. Nothing in [`crate::VideoHash`] or the match policies depends on the
/// algorithm that produced the hashes.
pub trait FrameHasher {
    /// Hash a single frame. Content-identical frames always produce identical hashes.
    fn hash_image(&self, image: &GrayImage) -> FrameHash;

    /// The hash of an entirely black frame.
    fn blank_hash(&self) -> FrameHash;

    /// Frames are downscaled so that neither dimension exceeds this many pixels before they
    /// are handed to [`FrameHasher::hash_image`].
    fn video_size(&self) -> u32;
}

/// Difference hash: one bit for each pair of horizontally adjacent pixels in a
/// `(hash_size + 1) x hash_size` thumbnail, set if the right pixel is brighter than the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "HasherParts")]
pub struct DHash {
    hash_size: u32,
    video_size: Option<u32>,
}

impl DHash {
    /// Create a dhash producing `hash_size * hash_size` bits per frame.
    ///
    /// # Panics
    /// Panics if `hash_size` is less than 2.
    pub fn new(hash_size: u32) -> Self {
        match check_hash_size(hash_size) {
            Ok(hash_size) => Self {
                hash_size,
                video_size: None,
            },
            Err(e) => panic!("{e}"),
        }
    }

    /// Override the size that frames are downscaled to before hashing.
    pub fn with_video_size(self, video_size: u32) -> Self {
        Self {
            video_size: Some(video_size),
            ..self
        }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

impl TryFrom<HasherParts> for DHash {
    type Error = InvalidHashData;

    fn try_from(parts: HasherParts) -> Result<Self, Self::Error> {
        Ok(Self {
            hash_size: check_hash_size(parts.hash_size)?,
            video_size: parts.video_size,
        })
    }
}

impl Default for DHash {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_SIZE)
    }
}

impl FrameHasher for DHash {
    fn hash_image(&self, image: &GrayImage) -> FrameHash {
        let size = self.hash_size;
        let thumb = imageops::resize(image, size + 1, size, FilterType::Lanczos3);
        let thumb = &thumb;

        let bits = (0..size).flat_map(move |y| {
            (0..size).map(move |x| thumb.get_pixel(x + 1, y)[0] > thumb.get_pixel(x, y)[0])
        });

        FrameHash::from_bits(bits)
    }

    fn blank_hash(&self) -> FrameHash {
        FrameHash::zeroed(self.hash_size * self.hash_size)
    }

    fn video_size(&self) -> u32 {
        default_video_size(self.hash_size, self.video_size)
    }
}

/// DCT hash: the low frequency `hash_size x hash_size` corner of the 2D DCT of a
/// `4 * hash_size` square thumbnail, with one bit per coefficient set if it is above the median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "HasherParts")]
pub struct PHash {
    hash_size: u32,
    video_size: Option<u32>,
}

impl PHash {
    /// Create a phash producing `hash_size * hash_size` bits per frame.
    ///
    /// # Panics
    /// Panics if `hash_size` is less than 2.
    pub fn new(hash_size: u32) -> Self {
        match check_hash_size(hash_size) {
            Ok(hash_size) => Self {
                hash_size,
                video_size: None,
            },
            Err(e) => panic!("{e}"),
        }
    }

    /// Override the size that frames are downscaled to before hashing.
    pub fn with_video_size(self, video_size: u32) -> Self {
        Self {
            video_size: Some(video_size),
            ..self
        }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

impl TryFrom<HasherParts> for PHash {
    type Error = InvalidHashData;

    fn try_from(parts: HasherParts) -> Result<Self, Self::Error> {
        Ok(Self {
            hash_size: check_hash_size(parts.hash_size)?,
            video_size: parts.video_size,
        })
    }
}

impl Default for PHash {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_SIZE)
    }
}

impl FrameHasher for PHash {
    fn hash_image(&self, image: &GrayImage) -> FrameHash {
        let size = self.hash_size as usize;
        let dct_size = self.hash_size * PHASH_HIGHFREQ_FACTOR;

        let thumb = imageops::resize(image, dct_size, dct_size, FilterType::Lanczos3);
        let pixels = thumb.into_raw().into_iter().map(f64::from).collect();

        let coeffs = dct_ops::perform_dct(pixels, dct_size as usize);
        let low_freqs = dct_ops::low_frequency_window(&coeffs, dct_size as usize, size);
        let median = median(&low_freqs);

        FrameHash::from_bits(low_freqs.into_iter().map(|coeff| coeff > median))
    }

    fn blank_hash(&self) -> FrameHash {
        FrameHash::zeroed(self.hash_size * self.hash_size)
    }

    fn video_size(&self) -> u32 {
        default_video_size(self.hash_size, self.video_size)
    }
}

// Stored form of both algorithms' parameters.
#[derive(Deserialize)]
struct HasherParts {
    hash_size: u32,
    video_size: Option<u32>,
}

fn check_hash_size(hash_size: u32) -> Result<u32, InvalidHashData> {
    if hash_size < MIN_HASH_SIZE {
        return Err(InvalidHashData::HashSize(hash_size));
    }
    Ok(hash_size)
}

fn default_video_size(hash_size: u32, video_size: Option<u32>) -> u32 {
    video_size.unwrap_or_else(|| hash_size.saturating_mul(VIDEO_SIZE_MULTIPLIER))
}

fn median(vals: &[f64]) -> f64 {
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => 0.0,
        len if len % 2 == 0 => (sorted[mid - 1] + sorted[mid]) / 2.0,
        _ => sorted[mid],
    }
}

/// The perceptual hash algorithm, and its parameters, used to hash each frame of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashSettings {
    DHash(DHash),
    PHash(PHash),
}

impl Default for HashSettings {
    /// An 8x8 dhash (64 bits per frame), with frames downscaled to 200 pixels.
    fn default() -> Self {
        Self::DHash(DHash::default())
    }
}

impl From<DHash> for HashSettings {
    fn from(settings: DHash) -> Self {
        Self::DHash(settings)
    }
}

impl From<PHash> for HashSettings {
    fn from(settings: PHash) -> Self {
        Self::PHash(settings)
    }
}

impl HashSettings {
    pub fn hash_size(&self) -> u32 {
        match self {
            Self::DHash(settings) => settings.hash_size(),
            Self::PHash(settings) => settings.hash_size(),
        }
    }

    fn hasher(&self) -> &dyn FrameHasher {
        match self {
            Self::DHash(settings) => settings,
            Self::PHash(settings) => settings,
        }
    }
}

impl FrameHasher for HashSettings {
    fn hash_image(&self, image: &GrayImage) -> FrameHash {
        self.hasher().hash_image(image)
    }

    fn blank_hash(&self) -> FrameHash {
        self.hasher().blank_hash()
    }

    fn video_size(&self) -> u32 {
        self.hasher().video_size()
    }
}

#[cfg(test)]
mod test {
    use std::f64::consts::PI;

    use image::Luma;
    use rand::prelude::*;

    use super::*;

    fn all_settings() -> Vec<HashSettings> {
        vec![
            DHash::new(8).into(),
            DHash::new(6).into(),
            DHash::new(16).into(),
            PHash::new(8).into(),
            PHash::new(6).into(),
        ]
    }

    //a smooth diagonal wave, identical in content at any resolution.
    fn wave_image(x_size: u32, y_size: u32) -> GrayImage {
        GrayImage::from_fn(x_size, y_size, |x, y| {
            let u = f64::from(x) / f64::from(x_size);
            let v = f64::from(y) / f64::from(y_size);
            let val = 128.0 + 100.0 * (2.0 * PI * (1.3 * u + 0.7 * v)).sin();
            Luma([val.round() as u8])
        })
    }

    fn noise_image(x_size: u32, y_size: u32, rng: &mut StdRng) -> GrayImage {
        GrayImage::from_fn(x_size, y_size, |_x, _y| Luma([rng.gen()]))
    }

    #[test]
    fn test_default_settings() {
        let settings = HashSettings::default();
        assert_eq!(settings, HashSettings::DHash(DHash::new(8)));
        assert_eq!(settings.hash_size(), 8);
        assert_eq!(settings.video_size(), 200);
        assert_eq!(settings.blank_hash().num_bits(), 64);
    }

    #[test]
    fn test_video_size_can_be_overridden() {
        let settings = HashSettings::from(DHash::new(8).with_video_size(64));
        assert_eq!(settings.video_size(), 64);
        assert_ne!(settings, HashSettings::default());

        let settings = HashSettings::from(PHash::new(10));
        assert_eq!(settings.video_size(), 250);
    }

    #[test]
    #[should_panic]
    fn test_tiny_hash_size_is_rejected() {
        let _ = DHash::new(1);
    }

    #[test]
    fn test_black_frame_hashes_to_blank_hash() {
        let black = GrayImage::new(320, 180);
        for settings in all_settings() {
            assert_eq!(settings.hash_image(&black), settings.blank_hash(), "{settings:?}");
        }
    }

    #[test]
    fn test_hash_width_follows_hash_size() {
        let image = wave_image(160, 90);
        for settings in all_settings() {
            let expected_bits = settings.hash_size() * settings.hash_size();
            assert_eq!(settings.hash_image(&image).num_bits(), expected_bits);
        }
    }

    #[test]
    fn test_hashing_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let image = noise_image(200, 150, &mut rng);
        for settings in all_settings() {
            assert_eq!(settings.hash_image(&image), settings.hash_image(&image.clone()));
        }
    }

    #[test]
    fn test_dhash_is_resolution_invariant() {
        let settings = HashSettings::default();
        let full_size = settings.hash_image(&wave_image(720, 576));
        let half_size = settings.hash_image(&wave_image(360, 288));

        assert!(full_size.similar_to(&half_size, DEFAULT_HAMMING_DIST));
    }

    #[test]
    fn test_unrelated_frames_are_far_apart() {
        let mut rng = StdRng::seed_from_u64(2);
        for settings in [HashSettings::default(), PHash::new(8).into()] {
            let h1 = settings.hash_image(&noise_image(200, 150, &mut rng));
            let h2 = settings.hash_image(&noise_image(200, 150, &mut rng));
            assert!(h1.hamming_distance(&h2) > 10, "{settings:?}");
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }
}
