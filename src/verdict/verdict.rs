/// Verdict classification
///
/// A verdict is a pure function of the evidence collected for one
/// submission in one round.
use crate::exec::Fault;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of one submission in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Every case matched the oracle
    Passed,
    /// A case produced a wrong answer
    CorrectnessMismatch { detail: String },
    /// Player code crashed, hung, or exhausted a resource
    CrashFault { fault: Fault },
    /// Nothing to evaluate: missing entrant, unloadable library, missing symbol
    NoResult { reason: String },
    /// The harness could not carry out the evaluation
    InfrastructureFailure { reason: String },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Stable short name, used as a metrics and event label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::CorrectnessMismatch { .. } => "correctness_mismatch",
            Self::CrashFault { .. } => "crash_fault",
            Self::NoResult { .. } => "no_result",
            Self::InfrastructureFailure { .. } => "infrastructure_failure",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::CorrectnessMismatch { detail } => write!(f, "wrong answer: {}", detail),
            Self::CrashFault { fault } => write!(f, "crash: {}", fault),
            Self::NoResult { reason } => write!(f, "no result: {}", reason),
            Self::InfrastructureFailure { reason } => write!(f, "infrastructure failure: {}", reason),
        }
    }
}

/// Everything observed while evaluating one submission
#[derive(Debug, Clone, Default)]
pub struct RoundEvidence {
    pub load_error: Option<String>,
    pub infrastructure_error: Option<String>,
    pub fault: Option<Fault>,
    pub mismatch: Option<String>,
    /// Cases run; zero means nothing was checked
    pub cases_run: usize,
}

/// Verdict classifier - pure function over evidence
pub struct VerdictClassifier;

impl VerdictClassifier {
    /// Precedence: load failure, harness failure, crash, mismatch, pass.
    /// A crash outranks a mismatch seen in an earlier case because it is
    /// logged distinctly.
    pub fn classify(evidence: &RoundEvidence) -> Verdict {
        if let Some(reason) = &evidence.load_error {
            return Verdict::NoResult {
                reason: reason.clone(),
            };
        }
        if let Some(reason) = &evidence.infrastructure_error {
            return Verdict::InfrastructureFailure {
                reason: reason.clone(),
            };
        }
        if let Some(fault) = &evidence.fault {
            return Verdict::CrashFault {
                fault: fault.clone(),
            };
        }
        if let Some(detail) = &evidence.mismatch {
            return Verdict::CorrectnessMismatch {
                detail: detail.clone(),
            };
        }
        if evidence.cases_run == 0 {
            return Verdict::InfrastructureFailure {
                reason: "no test cases were run".to_string(),
            };
        }
        Verdict::Passed
    }
}
