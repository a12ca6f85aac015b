mod duration;
mod match_options;
mod overlap;

pub use duration::DurationMatch;
pub use match_options::{MatchError, MatchOptions};
pub use overlap::{FrameCountMatch, PercentageMatch};
