use serde::{Deserialize, Serialize};
use std::fmt;

/// How an isolated child failed to deliver a result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// Terminated by a signal the harness did not send
    Signaled { signal: i32, name: String },
    /// Wall-clock budget exceeded; the child group was killed
    TimedOut { after_ms: u64 },
    /// An rlimit or the result slot capacity was exceeded
    ResourceExhausted { resource: String },
    /// Exited with a non-zero code before reporting a result
    AbnormalExit { code: i32 },
    /// Exited cleanly but the result slot did not decode
    SlotCorrupted { detail: String },
}

impl Fault {
    /// Stable short name, used as a metrics and event label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Signaled { .. } => "signaled",
            Self::TimedOut { .. } => "timed_out",
            Self::ResourceExhausted { .. } => "resource_exhausted",
            Self::AbnormalExit { .. } => "abnormal_exit",
            Self::SlotCorrupted { .. } => "slot_corrupted",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signaled { signal, name } => write!(f, "killed by {} ({})", name, signal),
            Self::TimedOut { after_ms } => write!(f, "timed out after {}ms", after_ms),
            Self::ResourceExhausted { resource } => write!(f, "exhausted {}", resource),
            Self::AbnormalExit { code } => write!(f, "exited with code {}", code),
            Self::SlotCorrupted { detail } => write!(f, "result slot corrupted: {}", detail),
        }
    }
}

/// Result of running one job in an isolated child
#[derive(Clone, Debug, PartialEq)]
pub enum IsolationOutcome<T> {
    Completed { value: T, wall_time_ms: u64 },
    Faulted(Fault),
}

impl<T> IsolationOutcome<T> {
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Faulted(fault) => Some(fault),
            Self::Completed { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed { value, .. } => Some(value),
            Self::Faulted(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> IsolationOutcome<U> {
        match self {
            Self::Completed {
                value,
                wall_time_ms,
            } => IsolationOutcome::Completed {
                value: f(value),
                wall_time_ms,
            },
            Self::Faulted(fault) => IsolationOutcome::Faulted(fault),
        }
    }
}

/// What the child writes into the result slot
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SlotPayload<T> {
    Value(T),
    /// The job itself reported a harness-side error
    Failed(String),
}

/// How reading the result slot ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotIntegrity {
    Complete,
    Overflowed,
    ReadError,
}
