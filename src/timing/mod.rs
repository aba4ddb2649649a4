//! Timing protocol
//!
//! Repeated trials of a zero-argument invocation, reduced to the right
//! median and the population standard deviation of the series.

pub mod clock;
pub mod protocol;
pub mod stats;

pub use protocol::{TimingProtocol, TrialSeries};
pub use stats::{PerformanceStatistic, NO_TIMING};
