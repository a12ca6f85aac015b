mod app_cfg;
mod app_fns;
mod arg_parse;
mod errors;
mod hash_output;

pub(crate) use app_cfg::*;
pub(crate) use errors::*;

use hash_output::{HashOutput, MatchOutput};

pub use app_fns::run_app;
