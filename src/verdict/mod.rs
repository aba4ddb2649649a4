//! Verdict classification
//!
//! Derives verdicts as pure functions over the evidence of one round.

pub mod verdict;

pub use verdict::{RoundEvidence, Verdict, VerdictClassifier};
