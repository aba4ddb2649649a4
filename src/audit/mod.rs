//! Memory-safety auditor
//!
//! Links a small driver program against a submission's shared object, runs
//! it under an external leak detector, and reports the detector's error
//! count.

pub mod leak;
pub mod workspace;

pub use leak::{LeakAuditor, LeakReport};
