pub mod frame_hash;
pub mod hash_creation_error_kind;
pub mod hash_options;
pub mod hash_settings;
pub mod invalid_hash_data;
pub mod matches;
pub mod video_hash;
pub mod video_hash_builder;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{HashCreationErrorKind, MatchError};

/// Any error that can occur while hashing two videos and comparing them.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    #[error(transparent)]
    Hash(#[from] HashCreationErrorKind),

    #[error(transparent)]
    Match(#[from] MatchError),
}
