use std::path::PathBuf;

use vidhash::*;

use crate::app::AppError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) enum AlgorithmArg {
    Dhash,
    Phash,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) enum PolicyArg {
    Percentage,
    FrameCount,
    Duration,
}

#[derive(Debug, Clone)]
pub struct HashCfg {
    pub fps: f64,
    pub(super) algorithm: AlgorithmArg,
    pub hash_size: u32,
    pub video_size: Option<u32>,
}

impl HashCfg {
    pub fn hash_options(&self) -> Result<HashOptions, AppError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(AppError::InvalidArg(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }

        //hash_size has already been range checked by the arg parser.
        let settings = match (self.algorithm, self.video_size) {
            (AlgorithmArg::Dhash, None) => HashSettings::from(DHash::new(self.hash_size)),
            (AlgorithmArg::Dhash, Some(size)) => {
                DHash::new(self.hash_size).with_video_size(size).into()
            }
            (AlgorithmArg::Phash, None) => PHash::new(self.hash_size).into(),
            (AlgorithmArg::Phash, Some(size)) => {
                PHash::new(self.hash_size).with_video_size(size).into()
            }
        };

        Ok(HashOptions::new(self.fps, settings))
    }
}

#[derive(Debug, Clone)]
pub struct MatchCfg {
    pub(super) policy: PolicyArg,
    pub hamming_dist: u32,
    pub overlap: Option<f64>,
    pub keep_blank: bool,
}

impl MatchCfg {
    // --overlap means a percentage, a frame count or a number of seconds depending on the policy.
    pub fn match_options(&self) -> Result<MatchOptions, AppError> {
        if let Some(overlap) = self.overlap {
            if !(overlap.is_finite() && overlap >= 0.0) {
                return Err(AppError::InvalidArg(format!(
                    "overlap must not be negative, got {overlap}"
                )));
            }
        }

        let ignore_blank = !self.keep_blank;

        let options = match self.policy {
            PolicyArg::Percentage => {
                let defaults = PercentageMatch::default();
                MatchOptions::from(PercentageMatch {
                    hamming_dist: self.hamming_dist,
                    percentage_overlap: self.overlap.unwrap_or(defaults.percentage_overlap),
                    ignore_blank,
                })
            }
            PolicyArg::FrameCount => {
                let defaults = FrameCountMatch::default();
                let count_overlap = match self.overlap {
                    None => defaults.count_overlap,
                    Some(count) if count.fract() == 0.0 => count as usize,
                    Some(count) => {
                        return Err(AppError::InvalidArg(format!(
                            "frame-count overlap must be a whole number, got {count}"
                        )))
                    }
                };
                MatchOptions::from(FrameCountMatch {
                    hamming_dist: self.hamming_dist,
                    count_overlap,
                    ignore_blank,
                })
            }
            PolicyArg::Duration => {
                let defaults = DurationMatch::default();
                MatchOptions::from(DurationMatch {
                    hamming_dist: self.hamming_dist,
                    time_overlap: self.overlap.unwrap_or(defaults.time_overlap),
                })
            }
        };

        Ok(options)
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Hash {
        files: Vec<PathBuf>,
    },
    Match {
        path_a: PathBuf,
        path_b: PathBuf,
        match_cfg: MatchCfg,
    },
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub command: Command,
    pub hash_cfg: HashCfg,
    pub output_format: OutputFormat,
    pub verbosity: ReportVerbosity,
}
