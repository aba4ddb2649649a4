//! Correctness oracle
//!
//! Trusted host-side reference routines. Drivers ask these for the expected
//! answer before running any player code.

pub mod numbers;
pub mod split;
pub mod tokenize;

pub use numbers::smallest_common_multiple;
pub use split::split_fields;
pub use tokenize::HostTokenizer;
