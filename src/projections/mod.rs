//! Pure view derivations over store snapshots.
//!
//! Nothing here touches the store or the wall clock: each function takes the
//! collections (and, where "now" matters, an explicit `today`) and returns a
//! display-ready value. Re-deriving from the same snapshot always yields the
//! same result.

mod analytics;
mod board;

pub use analytics::*;
pub use board::*;
