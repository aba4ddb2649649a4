//! Result records and leaderboard ordering

pub mod ranking;
pub mod record;

pub use ranking::rank;
pub use record::{LeaderboardRow, SubmissionRecord};
