/// Game presets
///
/// Each preset pins the entry-point symbol a submission must export, the
/// round-generation bounds, and the timing envelope for one game. Presets are
/// plain immutable data handed to drivers at construction time.
use crate::config::types::{GameKind, TimingClock};
use crate::native::CallShape;
use serde::{Deserialize, Serialize};

/// Split delimiter table, one entry per corpus file `test_<n>.txt`.
pub const SPLIT_DELIMITERS: [char; 20] = [
    ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ' ', ',', '1', '0', '-', 'X', '!', '?', '.', ';',
    'N',
];

/// Delimiter set fed to `strtok` submissions.
pub const STRTOK_DELIMITERS: &str = " ,.;:";

/// Timing envelope shared by all game presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPreset {
    /// Trials per measurement
    pub repeats: usize,
    /// Clock sampled around each trial
    #[serde(default)]
    pub clock: TimingClock,
    /// Input amplification applied before timing (1 = none)
    #[serde(default = "default_multiplier")]
    pub input_multiplier: usize,
}

fn default_multiplier() -> usize {
    1
}

/// Numbers game: smallest multiple of every integer in `[low, high]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumbersPreset {
    pub symbol: String,
    /// Smallest allowed left border
    pub min_border: i32,
    /// Largest allowed right border
    pub max_border: i32,
    pub timing: TimingPreset,
}

impl Default for NumbersPreset {
    fn default() -> Self {
        Self {
            symbol: "numbers_game".to_string(),
            min_border: 1,
            // lcm(1..=22) = 232_792_560 still fits a C int
            max_border: 22,
            timing: TimingPreset {
                repeats: 10_001,
                clock: TimingClock::ProcessCpu,
                input_multiplier: 1,
            },
        }
    }
}

/// Split game: whole-string splitting on one delimiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPreset {
    pub symbol: String,
    /// Delimiter for corpus file `i + 1`
    pub delimiters: Vec<char>,
    /// File name pattern, `{n}` replaced with the 1-based case number
    pub file_pattern: String,
    pub timing: TimingPreset,
}

impl Default for SplitPreset {
    fn default() -> Self {
        Self {
            symbol: "split".to_string(),
            delimiters: SPLIT_DELIMITERS.to_vec(),
            file_pattern: "test_{n}.txt".to_string(),
            timing: TimingPreset {
                repeats: 11,
                clock: TimingClock::ProcessCpu,
                input_multiplier: 1,
            },
        }
    }
}

/// Strtok game: sequential tokenization over a delimiter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrtokPreset {
    pub symbol: String,
    pub delimiters: String,
    /// Corpus file name inside the test directory
    pub test_file: String,
    pub timing: TimingPreset,
}

impl Default for StrtokPreset {
    fn default() -> Self {
        Self {
            symbol: "strtok".to_string(),
            delimiters: STRTOK_DELIMITERS.to_string(),
            test_file: "test_data.txt".to_string(),
            timing: TimingPreset {
                repeats: 11,
                clock: TimingClock::ProcessCpu,
                input_multiplier: 1500,
            },
        }
    }
}

/// Entry point a game requires from every submission
pub fn required_shape(game: GameKind) -> CallShape {
    match game {
        GameKind::Numbers => CallShape::IntPair,
        GameKind::Split => CallShape::Split,
        GameKind::Strtok => CallShape::Tokenize,
    }
}
