//! Performance engine abstraction.
//!
//! The engine turns raw chart bytes and a modifier bitmask into a performance
//! value and two sub-ratings. It is a pure function of its inputs, which lets
//! the metric pipeline run against a deterministic mock in tests.

mod rosu;

pub use rosu::RosuEngine;

use crate::chart::Mods;

/// Output of a single engine run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceReport {
    pub performance: f64,
    pub aim_rating: f64,
    pub speed_rating: f64,
    pub max_combo: u32,
}

/// Trait for computing chart performance under a modifier combination.
pub trait PerformanceEngine: Send + Sync {
    /// Compute performance for a chart.
    ///
    /// Returns `None` when the bytes cannot be decoded as a chart.
    fn compute(&self, chart: &[u8], mods: Mods) -> Option<PerformanceReport>;
}

impl<E: PerformanceEngine + ?Sized> PerformanceEngine for Box<E> {
    fn compute(&self, chart: &[u8], mods: Mods) -> Option<PerformanceReport> {
        (**self).compute(chart, mods)
    }
}
