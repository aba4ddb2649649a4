//! Configuration
//!
//! Harness configuration, per-game presets, and startup validation.

pub mod harness;
pub mod presets;
pub mod types;
pub mod validator;
