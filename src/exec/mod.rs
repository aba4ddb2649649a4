//! Isolation runner
//!
//! Every call into player code that could crash, hang, or scribble over
//! memory runs in a forked child. The parent only ever sees a decoded value
//! or a [`Fault`].

pub mod runner;
pub mod types;

pub use runner::IsolationRunner;
pub use types::{Fault, IsolationOutcome};
