//! Game drivers
//!
//! A driver owns one round's test cases (generated or loaded once, shared by
//! every submission) and knows how to check and time a submission against
//! them. Drivers never classify: they report what they observed in a
//! [`GameEvaluation`] and leave the verdict to the caller.

pub mod corpus;
pub mod numbers;
pub mod registry;
pub mod split;
pub mod strtok;

use crate::config::types::{GameKind, HarnessError, Result};
use crate::exec::{Fault, IsolationOutcome, IsolationRunner};
use crate::native::{CallOutput, CallShape, Submission};
use crate::timing::{PerformanceStatistic, TrialSeries, NO_TIMING};
use serde::{Deserialize, Serialize};

pub use registry::driver_for;

/// Driver contract shared by all games
pub trait GameDriver {
    fn game(&self) -> GameKind;

    /// Symbols (with shapes) a submission must export
    fn required_symbols(&self) -> Vec<(&str, CallShape)>;

    /// Check the submission against every case and, when all are correct,
    /// time it. `Err` means the harness failed, not the submission.
    fn evaluate(&self, submission: &Submission, runner: &IsolationRunner) -> Result<GameEvaluation>;

    /// Arguments handed to the leak-check driver program
    fn audit_args(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Outcome of checking one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub case: String,
    pub correct: bool,
    /// Wall time of the isolated correctness invocation
    pub elapsed_ms: u64,
    /// Player output, rendered for logs
    pub raw_output: String,
    /// Why the case failed, when it did
    pub detail: Option<String>,
}

impl TrialResult {
    pub fn faulted(case: &str, fault: &Fault) -> Self {
        Self {
            case: case.to_string(),
            correct: false,
            elapsed_ms: 0,
            raw_output: String::new(),
            detail: Some(fault.to_string()),
        }
    }
}

/// Everything a driver observed for one submission
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvaluation {
    pub trials: Vec<TrialResult>,
    /// First fault seen, during checking or timing
    pub fault: Option<Fault>,
    pub performance: PerformanceStatistic,
}

impl GameEvaluation {
    pub fn new(trials: Vec<TrialResult>) -> Self {
        Self {
            trials,
            fault: None,
            performance: NO_TIMING,
        }
    }

    pub fn tests_total(&self) -> usize {
        self.trials.len()
    }

    pub fn tests_passed(&self) -> usize {
        self.trials.iter().filter(|t| t.correct).count()
    }

    pub fn all_correct(&self) -> bool {
        self.fault.is_none() && !self.trials.is_empty() && self.trials.iter().all(|t| t.correct)
    }

    /// Detail of the first failed case
    pub fn first_mismatch(&self) -> Option<String> {
        self.trials.iter().find(|t| !t.correct).map(|t| {
            format!(
                "{}: {}",
                t.case,
                t.detail.as_deref().unwrap_or("incorrect result")
            )
        })
    }

    fn record_fault(&mut self, fault: Fault) {
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
    }

    /// Run `series` in a child and store its statistic, or the fault
    pub(crate) fn time_in_child<F>(&mut self, runner: &IsolationRunner, label: &str, series: F) -> Result<()>
    where
        F: FnOnce() -> Result<TrialSeries>,
    {
        match runner.run(label, runner.timing_timeout(), series)? {
            IsolationOutcome::Completed { value, .. } => self.performance = value.statistic(),
            IsolationOutcome::Faulted(fault) => {
                self.performance = NO_TIMING;
                self.record_fault(fault);
            }
        }
        Ok(())
    }
}

/// Error for a call that came back with the wrong kind of value
pub(crate) fn unexpected_output(symbol: &str, expected: CallShape, output: &CallOutput) -> HarnessError {
    HarnessError::AbiMismatch {
        symbol: symbol.to_string(),
        expected: expected.to_string(),
        actual: format!("{:?}", output),
    }
}

/// Bytes rendered for logs, truncated
pub(crate) fn preview(bytes: &[u8]) -> String {
    const LIMIT: usize = 48;
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(LIMIT)]).into_owned();
    if bytes.len() > LIMIT {
        format!("{:?}...", text)
    } else {
        format!("{:?}", text)
    }
}
