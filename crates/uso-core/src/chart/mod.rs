//! Chart types and derived metrics.
//!
//! This module contains:
//! - `Chart`, `ChartSnapshot` - stored and remote chart records
//! - `Approval` - ranking state of a chart
//! - `Mods`, `MOD_COMBINATIONS` - modifier bitmask and the combination table
//! - `MetricComputer` - performance values for every combination

mod metrics;
mod mods;
mod types;

pub use metrics::*;
pub use mods::*;
pub use types::*;
