//! gamejudge: benchmarking and verification harness for contest-submitted
//! native libraries
//!
//! Players submit shared objects exporting a fixed C entry point per game.
//! Each submission is checked against a trusted host oracle, timed over
//! repeated trials, optionally leak-checked, and turned into one result
//! record per round.
//!
//! # Architecture
//!
//! ## Native Code ([`native`])
//! - [`native::unit`]: Loaded code units (`dlopen` or in-process)
//! - [`native::shapes`]: Fixed call shapes and argument marshalling
//! - [`native::cursor`]: Explicit tokenizer session state
//! - [`native::submission`]: A player's unit with its entry points bound
//!
//! ## Isolation ([`exec`])
//! - [`exec::runner`]: Fork-per-invocation with a bounded result slot
//! - [`exec::types`]: Faults and isolation outcomes
//!
//! ## Evaluation
//! - [`oracle`]: Host reference answers
//! - [`timing`]: Repeated trials, right median and population std dev
//! - [`games`]: Numbers, split and strtok drivers
//! - [`verdict`]: Pure verdict classification over collected evidence
//! - [`audit`]: External leak detector run against each library
//! - [`session`]: Sequential round evaluation, one record per entrant
//!
//! ## Results ([`report`], [`rating`])
//! - [`report::record`]: Submission records and flat leaderboard rows
//! - [`report::ranking`]: Leaderboard ordering
//! - [`rating::elo`]: ELO updates for head-to-head results
//!
//! ## Ambient
//! - [`config`]: JSON configuration, game presets, startup validation
//! - [`kernel`]: `dlopen`, rlimits and signal handling
//! - [`observability`]: Structured events and round metrics

// Native code
pub mod native;

// Isolation
pub mod exec;

// Evaluation
pub mod audit;
pub mod games;
pub mod oracle;
pub mod session;
pub mod timing;
pub mod verdict;

// Results
pub mod rating;
pub mod report;

// Ambient
pub mod config;
pub mod kernel;
pub mod observability;

// CLI entrypoint wiring for the gamejudge binary
pub mod cli;

pub use config::types::{GameKind, HarnessError, Result};
