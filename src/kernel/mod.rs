//! Thin wrappers around OS primitives.
//!
//! `unsafe` code for the dynamic loader, rlimits, and signal handlers is
//! concentrated here.

pub mod dylib;
pub mod rlimit;
pub mod signal;
