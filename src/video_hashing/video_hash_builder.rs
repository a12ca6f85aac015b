use std::path::Path;

use ffmpeg_cmdline_utils::{FfmpegError, FfmpegFrameReaderBuilder, VideoInfo};
use image::GrayImage;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{definitions::DEFAULT_EXTRACTION_TIMEOUT_SECS, *};

// Frames are decoded this many at a time and then hashed in parallel, so that memory use does
// not grow with the length of the video.
const HASH_BATCH_SIZE: usize = 256;

/// A factory for video hashes. Frames are extracted by ffmpeg and hashed on the rayon thread pool.
///
/// [`VideoHashBuilder::default`] samples at 5 fps with an 8x8 dhash.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoHashBuilder {
    options: HashOptions,
}

impl VideoHashBuilder {
    /// Create a video hash builder with the selected [`HashOptions`]
    pub fn from_options(options: HashOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HashOptions {
        &self.options
    }

    /// Sample the video at `src_path` and hash every sampled frame.
    ///
    /// A video which yields no frames at all is not an error. The returned hash has an empty
    /// sequence.
    ///
    /// # Errors
    /// * [`HashCreationErrorKind::DetermineVideo`] if ffprobe could not read the file.
    /// * [`HashCreationErrorKind::VideoProcessing`] if the file has no video stream, or ffmpeg
    ///   failed while extracting frames. No partial hash is returned.
    pub fn hash(&self, src_path: impl AsRef<Path>) -> Result<VideoHash, HashCreationErrorKind> {
        let src_path = src_path.as_ref();
        info!(target: "hash_creation", "hashing {}", src_path.display());

        let stats = VideoInfo::new(src_path).map_err(|error| HashCreationErrorKind::DetermineVideo {
            src_path: src_path.to_path_buf(),
            error,
        })?;

        let frame_hashes = self
            .hash_frames(src_path, &stats)
            .map_err(|error| HashCreationErrorKind::VideoProcessing {
                src_path: src_path.to_path_buf(),
                error,
            })?;

        if frame_hashes.is_empty() {
            warn!(
                target: "hash_creation",
                "no frames could be sampled from {}", src_path.display()
            );
        }

        let duration = stats.duration().as_secs_f64();
        debug!(
            target: "hash_creation",
            "{}: {} frames over {duration:.2} seconds",
            src_path.display(),
            frame_hashes.len()
        );

        Ok(VideoHash::new(frame_hashes, duration, self.options))
    }

    fn hash_frames(
        &self,
        src_path: &Path,
        stats: &VideoInfo,
    ) -> Result<Vec<FrameHash>, FfmpegError> {
        let settings = self.options.settings;

        let mut frames = FfmpegFrameReaderBuilder::new(src_path)
            .fps(self.options.fps)
            .max_dimension(settings.video_size())
            .timeout_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS)
            .spawn_gray_with_info(stats)?;

        let mut frame_hashes = vec![];
        let mut batch = Vec::with_capacity(HASH_BATCH_SIZE);

        for frame in &mut frames {
            batch.push(frame);
            if batch.len() == HASH_BATCH_SIZE {
                hash_batch(&settings, &mut batch, &mut frame_hashes);
                debug!(
                    target: "hash_creation",
                    "{}: {} frames hashed",
                    src_path.display(),
                    frame_hashes.len()
                );
            }
        }
        hash_batch(&settings, &mut batch, &mut frame_hashes);

        frames.finish()?;
        Ok(frame_hashes)
    }
}

// Hashes are appended in the same order as the frames.
fn hash_batch(
    settings: &HashSettings,
    batch: &mut Vec<GrayImage>,
    frame_hashes: &mut Vec<FrameHash>,
) {
    frame_hashes.par_extend(batch.par_iter().map(|frame| settings.hash_image(frame)));
    batch.clear();
}
