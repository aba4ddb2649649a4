//! Native call adapter
//!
//! Loads player code units, binds their exported symbols to one of the fixed
//! [`CallShape`]s, and marshals host values across the C boundary.

pub mod cursor;
pub mod shapes;
pub mod submission;
pub mod unit;

pub use cursor::TokenCursor;
pub use shapes::{CallArgs, CallOutput, CallShape, EntryPoint, FieldMatrix};
pub use submission::{player_id_from_path, Submission};
pub use unit::{CodeUnit, StaticCodeUnit};
