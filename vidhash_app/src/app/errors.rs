use thiserror::Error;
use vidhash::*;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("ffmpeg and ffprobe must be installed and available on the command line")]
    FfmpegNotFound,

    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    #[error("Hash Creation Error: {0}")]
    CreateHashError(#[from] HashCreationErrorKind),

    #[error("Failed to hash {0} of {1} videos")]
    SomeHashesFailed(usize, usize),

    #[error("Match Error: {0}")]
    MatchError(#[from] MatchError),
}

// check_match can fail while hashing or while comparing. Report each as what it is.
impl From<vidhash::Error> for AppError {
    fn from(e: vidhash::Error) -> Self {
        match e {
            vidhash::Error::Hash(e) => Self::CreateHashError(e),
            vidhash::Error::Match(e) => Self::MatchError(e),
        }
    }
}

pub fn print_error_and_quit(e: eyre::Report) -> ! {
    #[allow(clippy::print_stderr)]
    let () = eprintln!("{:?}", e);
    std::process::exit(1);
}
