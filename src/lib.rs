pub mod analyze;
pub mod config;
pub mod error;
pub mod estimate;
pub mod report;
pub mod transcript;
pub mod video_id;

pub use analyze::{BatchStats, VideoReport, VideoResult, WpmAnalyzer};
pub use config::Config;
pub use error::{Result, WpmError};
pub use estimate::{accumulate, solve, Segment, SpeakStat};
