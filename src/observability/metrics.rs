// Round metrics
//
// Counters for verdicts, isolation faults and leak checks, plus a latency
// histogram for isolated invocations. One `HarnessMetrics` lives for one
// evaluator; `snapshot` freezes it for reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::LeakReport;
use crate::exec::Fault;
use crate::verdict::Verdict;

/// Counter metric (monotonically increasing)
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct HistogramBucket {
    le: f64, // upper bound in seconds
    count: AtomicU64,
}

/// Cumulative latency histogram
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
    sum_micros: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Buckets from 1ms to 10s
    pub fn new_latency() -> Self {
        let buckets = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            .into_iter()
            .map(|le| HistogramBucket {
                le,
                count: AtomicU64::new(0),
            })
            .collect();

        Self {
            buckets,
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: Duration) {
        let seconds = value.as_secs_f64();
        self.sum_micros
            .fetch_add(value.as_micros() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for bucket in &self.buckets {
            if seconds <= bucket.le {
                bucket.count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum_micros(&self) -> u64 {
        self.sum_micros.load(Ordering::Relaxed)
    }

    /// `(upper bound, cumulative count)` pairs
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.buckets
            .iter()
            .map(|b| (b.le, b.count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new_latency()
    }
}

#[derive(Debug, Default)]
pub struct HarnessMetrics {
    pub submissions_total: Counter,

    // Verdicts
    pub verdict_passed: Counter,
    pub verdict_mismatch: Counter,
    pub verdict_crash: Counter,
    pub verdict_no_result: Counter,
    pub verdict_infrastructure: Counter,

    // Faults
    pub fault_signaled: Counter,
    pub fault_timed_out: Counter,
    pub fault_resource_exhausted: Counter,
    pub fault_abnormal_exit: Counter,
    pub fault_slot_corrupted: Counter,

    // Leak checks
    pub leak_clean: Counter,
    pub leak_found: Counter,
    pub leak_could_not_run: Counter,

    pub evaluation_duration: Histogram,
}

impl HarnessMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_verdict(&self, verdict: &Verdict) {
        self.submissions_total.inc();
        match verdict {
            Verdict::Passed => self.verdict_passed.inc(),
            Verdict::CorrectnessMismatch { .. } => self.verdict_mismatch.inc(),
            Verdict::CrashFault { fault } => {
                self.verdict_crash.inc();
                self.record_fault(fault);
            }
            Verdict::NoResult { .. } => self.verdict_no_result.inc(),
            Verdict::InfrastructureFailure { .. } => self.verdict_infrastructure.inc(),
        }
    }

    pub fn record_fault(&self, fault: &Fault) {
        match fault {
            Fault::Signaled { .. } => self.fault_signaled.inc(),
            Fault::TimedOut { .. } => self.fault_timed_out.inc(),
            Fault::ResourceExhausted { .. } => self.fault_resource_exhausted.inc(),
            Fault::AbnormalExit { .. } => self.fault_abnormal_exit.inc(),
            Fault::SlotCorrupted { .. } => self.fault_slot_corrupted.inc(),
        }
    }

    pub fn record_leak(&self, report: &LeakReport) {
        match report {
            LeakReport::Clean => self.leak_clean.inc(),
            LeakReport::Leaks { .. } => self.leak_found.inc(),
            LeakReport::CouldNotRun { .. } => self.leak_could_not_run.inc(),
        }
    }

    /// Wall time spent evaluating one submission
    pub fn record_evaluation_time(&self, elapsed: Duration) {
        self.evaluation_duration.observe(elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions_total: self.submissions_total.get(),
            passed: self.verdict_passed.get(),
            correctness_mismatch: self.verdict_mismatch.get(),
            crash_fault: self.verdict_crash.get(),
            no_result: self.verdict_no_result.get(),
            infrastructure_failure: self.verdict_infrastructure.get(),
            faults: FaultCounts {
                signaled: self.fault_signaled.get(),
                timed_out: self.fault_timed_out.get(),
                resource_exhausted: self.fault_resource_exhausted.get(),
                abnormal_exit: self.fault_abnormal_exit.get(),
                slot_corrupted: self.fault_slot_corrupted.get(),
            },
            leaks: LeakCounts {
                clean: self.leak_clean.get(),
                found: self.leak_found.get(),
                could_not_run: self.leak_could_not_run.get(),
            },
            evaluations_timed: self.evaluation_duration.count(),
            evaluation_seconds: self.evaluation_duration.sum_micros() as f64 / 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultCounts {
    pub signaled: u64,
    pub timed_out: u64,
    pub resource_exhausted: u64,
    pub abnormal_exit: u64,
    pub slot_corrupted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakCounts {
    pub clean: u64,
    pub found: u64,
    pub could_not_run: u64,
}

/// Point-in-time copy of [`HarnessMetrics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub submissions_total: u64,
    pub passed: u64,
    pub correctness_mismatch: u64,
    pub crash_fault: u64,
    pub no_result: u64,
    pub infrastructure_failure: u64,
    pub faults: FaultCounts,
    pub leaks: LeakCounts,
    pub evaluations_timed: u64,
    pub evaluation_seconds: f64,
}
