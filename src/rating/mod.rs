//! Rating aggregator
//!
//! ELO-style updates for head-to-head results.

pub mod elo;

pub use elo::{EloRating, MatchOutcome};
