/// Core types and errors shared across the harness
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Sentinel used by flat leaderboard rows for "no result".
pub const NO_RESULT: i64 = -1337;

/// Games the harness knows how to drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Smallest number divisible by every integer of an interval
    Numbers,
    /// Whole-string splitting on a single delimiter
    Split,
    /// Sequential `strtok`-style tokenization
    Strtok,
}

impl GameKind {
    pub const ALL: [Self; 3] = [Self::Numbers, Self::Split, Self::Strtok];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numbers => "numbers",
            Self::Split => "split",
            Self::Strtok => "strtok",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock used to time a trial
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingClock {
    /// CPU time consumed by the measuring process
    #[default]
    ProcessCpu,
    /// Monotonic wall clock
    Wall,
}

/// Errors raised by the harness itself.
///
/// Submission misbehaviour (wrong answers, crashes, timeouts) is not an
/// error: it is classified into a [`crate::verdict::Verdict`]. These
/// variants describe failures to carry out an evaluation step.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load code unit: {0}")]
    Load(String),

    #[error("Symbol '{0}' not found in code unit")]
    SymbolNotFound(String),

    #[error("ABI mismatch for '{symbol}': entry point is {actual}, call supplied {expected}")]
    AbiMismatch {
        symbol: String,
        expected: String,
        actual: String,
    },

    #[error("Tokenizer cursor error: {0}")]
    Cursor(String),

    #[error("Invalid test case: {0}")]
    InvalidTestCase(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Isolated job failed: {0}")]
    Job(String),

    #[error("Audit error: {0}")]
    Audit(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_kind_round_trips_through_snake_case() {
        for kind in GameKind::ALL {
            let encoded = serde_json::to_string(&kind).unwrap();
            assert_eq!(encoded, format!("\"{}\"", kind.as_str()));
            let decoded: GameKind = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, kind);
        }
    }

    #[test]
    fn abi_mismatch_message_names_both_shapes() {
        let err = HarnessError::AbiMismatch {
            symbol: "split".to_string(),
            expected: "int_pair".to_string(),
            actual: "split".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'split'"));
        assert!(msg.contains("int_pair"));
    }
}
