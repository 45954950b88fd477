//! Profile types and aggregated statistics.
//!
//! This module contains:
//! - `Profile`, `ProfileSnapshot` - stored and remote player records
//! - `PlaySnapshot` - one of a player's best plays
//! - `ProfileStats` and `aggregate` - statistics over a best-play sample

mod stats;
mod types;

pub use stats::*;
pub use types::*;
