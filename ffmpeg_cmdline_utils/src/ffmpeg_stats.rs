use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected video rotation: {0}")]
    Rotation(String),
    #[error("Unusable video duration: {0}")]
    Duration(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// If the video metadata declares a rotation, the raw (x, y) resolution in that metadata
// refers to the "unrotated" resolution. ffmpeg autorotates decoded frames, so x and y
// must be swapped if the rotation is 90 or 270
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
enum FfmpegVideoRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

impl FfmpegVideoRotation {
    fn from_degrees(degrees: i64) -> Result<Self, VideoInfoError> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::Rot0),
            90 => Ok(Self::Rot90),
            180 => Ok(Self::Rot180),
            270 => Ok(Self::Rot270),
            _ => Err(VideoInfoError::Rotation(degrees.to_string())),
        }
    }

    fn swaps_axes(self) -> bool {
        matches!(self, Self::Rot90 | Self::Rot270)
    }
}

/// Some of the video metadata that can be obtained by using ffprobe.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: Duration,
    resolution: (u32, u32),
}

impl VideoInfo {
    /// Use ffprobe to get the duration and resolution of a video. If the file contains multiple
    /// video streams then the resolution of the first one is returned.
    ///
    /// # Errors
    /// * The file cannot be read or is not recognized as media by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    /// * The output from ffprobe contained malformed fields.
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path)?;
        let info = Self::from_ffprobe_json(&stats_string)?;
        Ok(info)
    }

    /// Parse the JSON printed by `ffprobe -show_format -show_streams -print_format json`
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, VideoInfoError> {
        let stats_parsed: Value = serde_json::from_str(stats_string)?;

        // The container usually knows the duration. Some raw streams only declare it per-stream.
        let duration_secs = match &stats_parsed["format"]["duration"] {
            Value::String(d) => d.parse::<f64>()?,
            _ => match Self::first_video(&stats_parsed).map(|s| &s["duration"]) {
                Some(Value::String(d)) => d.parse::<f64>()?,
                _ => 0.0,
            },
        };
        if !duration_secs.is_finite() {
            return Err(VideoInfoError::Duration(duration_secs.to_string()));
        }
        let duration = Duration::try_from_secs_f64(duration_secs.max(0.0))
            .map_err(|_| VideoInfoError::Duration(duration_secs.to_string()))?;

        let rotation = match Self::first_video(&stats_parsed).and_then(Self::declared_rotation) {
            Some(degrees) => FfmpegVideoRotation::from_degrees(degrees)?,
            None => FfmpegVideoRotation::Rot0,
        };

        // Frames are always decoded from the first video stream, so its size is the one that counts.
        let resolution = {
            let first_width = Self::first_vid_u32(&stats_parsed, "width").unwrap_or(0);
            let first_height = Self::first_vid_u32(&stats_parsed, "height").unwrap_or(0);

            if rotation.swaps_axes() {
                (first_height, first_width)
            } else {
                (first_width, first_height)
            }
        };

        Ok(VideoInfo {
            duration,
            resolution,
        })
    }

    /// The duration of the video
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The resolution of the video in pixels.
    /// Note the returned value is correct for the orientation that the video is intended
    /// to be viewed. (Ffprobe returns a surprising value by default if the video is stored rotated)
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    // Rotation is either in the display matrix side data (newer ffprobe) or in the
    // "rotate" tag (older ffprobe). It may be a JSON String or a JSON Number.
    fn declared_rotation(video_stream: &Value) -> Option<i64> {
        let side_data = video_stream
            .get("side_data_list")
            .and_then(|list| list.as_array())
            .and_then(|list| list.iter().find_map(|entry| entry.get("rotation")));
        let tag = video_stream.get("tags").and_then(|tags| tags.get("rotate"));

        match side_data.or(tag)? {
            Value::Number(val) => val.as_f64().map(|v| v.round() as i64),
            Value::String(val) => val.trim().parse::<f64>().ok().map(|v| v.round() as i64),
            _ => None,
        }
    }

    fn first_video(stats_parsed: &Value) -> Option<&Value> {
        Self::streams_of_type(stats_parsed, "video").and_then(|mut videos| videos.drain(..).next())
    }

    fn streams_of_type<'a>(stats_parsed: &'a Value, stream_type: &str) -> Option<Vec<&'a Value>> {
        if let Value::Array(streams) = &stats_parsed["streams"] {
            let ret = streams
                .iter()
                .filter(|s| match &s["codec_type"] {
                    Value::String(codec_type) => codec_type == stream_type,
                    _ => false,
                })
                .collect();

            Some(ret)
        } else {
            None
        }
    }

    fn first_vid_u32(stats_parsed: &Value, field_name: &str) -> Option<u32> {
        match &Self::first_video(stats_parsed)?[field_name] {
            Value::Number(v) => v.as_u64().and_then(|v| u32::try_from(v).ok()),
            _ => None,
        }
    }
}
