use serde::{Deserialize, Serialize};

use crate::{definitions::DEFAULT_FPS, HashSettings, InvalidHashData};

/// How a video is turned into a [`crate::VideoHash`]: the rate at which frames are sampled and
/// the algorithm used to hash each sampled frame.
///
/// Hashes can only be compared when they were created with equal `HashOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashOptionsParts")]
pub struct HashOptions {
    /// Frames sampled per second of video. Must be positive.
    pub fps: f64,

    /// The frame hash algorithm and its parameters.
    pub settings: HashSettings,
}

impl HashOptions {
    /// # Panics
    /// Panics if `fps` is not a positive, finite number.
    pub fn new(fps: f64, settings: impl Into<HashSettings>) -> Self {
        match Self::try_from(HashOptionsParts {
            fps,
            settings: settings.into(),
        }) {
            Ok(options) => options,
            Err(e) => panic!("{e}"),
        }
    }
}

#[derive(Deserialize)]
struct HashOptionsParts {
    fps: f64,
    settings: HashSettings,
}

impl TryFrom<HashOptionsParts> for HashOptions {
    type Error = InvalidHashData;

    fn try_from(HashOptionsParts { fps, settings }: HashOptionsParts) -> Result<Self, Self::Error> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(InvalidHashData::Fps(fps));
        }
        Ok(Self { fps, settings })
    }
}

impl Default for HashOptions {
    /// 5 frames per second, hashed with [`HashSettings::default`].
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            settings: HashSettings::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{DHash, PHash};

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(HashOptions::default(), HashOptions::new(5.0, DHash::new(8)));
        assert_ne!(HashOptions::default(), HashOptions::new(4.0, DHash::new(8)));
        assert_ne!(HashOptions::default(), HashOptions::new(5.0, DHash::new(10)));
        assert_ne!(HashOptions::default(), HashOptions::new(5.0, PHash::new(8)));
        assert_ne!(
            HashOptions::default(),
            HashOptions::new(5.0, DHash::new(8).with_video_size(100))
        );
    }

    #[test]
    #[should_panic]
    fn test_zero_fps_is_rejected() {
        let _ = HashOptions::new(0.0, DHash::default());
    }

    #[test]
    fn test_invalid_stored_options_are_rejected() {
        let parse = |json: &str| serde_json::from_str::<HashOptions>(json);
        let settings = r#"{"DHash":{"hash_size":8,"video_size":null}}"#;

        let stored = parse(&format!(r#"{{"fps":5.0,"settings":{settings}}}"#)).unwrap();
        assert_eq!(stored, HashOptions::default());

        assert!(parse(&format!(r#"{{"fps":0.0,"settings":{settings}}}"#)).is_err());
        assert!(parse(&format!(r#"{{"fps":-1.0,"settings":{settings}}}"#)).is_err());

        let tiny_dhash = r#"{"DHash":{"hash_size":1,"video_size":null}}"#;
        let empty_phash = r#"{"PHash":{"hash_size":0,"video_size":null}}"#;
        assert!(parse(&format!(r#"{{"fps":5.0,"settings":{tiny_dhash}}}"#)).is_err());
        assert!(parse(&format!(r#"{{"fps":5.0,"settings":{empty_phash}}}"#)).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let options = HashOptions::new(2.5, PHash::new(6).with_video_size(90));
        let json = serde_json::to_string(&options).unwrap();
        let parsed: HashOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, parsed);
    }
}
