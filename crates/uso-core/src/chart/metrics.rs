//! Derived chart metrics.
//!
//! Runs the performance engine once without modifiers and once per entry of
//! [`MOD_COMBINATIONS`], then clamps every value into the 32-bit range the
//! store can hold.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::chart::{ChartSnapshot, MOD_COMBINATIONS, Mods};
use crate::engine::PerformanceEngine;

/// Metrics derived from a chart's raw bytes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartMetrics {
    pub performance: i32,
    pub aim_rating: f64,
    pub speed_rating: f64,
    pub playstyle: f64,
    pub max_combo: u32,
    pub mod_performance: BTreeMap<String, i32>,
}

/// Clamp a performance value into the storable range.
///
/// Values above `i32::MAX` saturate, negative values and NaN become 0.
pub fn clamp_performance(value: f64) -> i32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= i32::MAX as f64 {
        i32::MAX
    } else {
        value as i32
    }
}

/// Aim share of the difficulty rating; 0.5 when the rating is zero
pub fn playstyle(aim_rating: f64, star_rating: f64) -> f64 {
    if star_rating == 0.0 {
        0.5
    } else {
        aim_rating / star_rating
    }
}

pub struct MetricComputer {
    engine: Box<dyn PerformanceEngine>,
}

impl MetricComputer {
    pub fn new(engine: impl PerformanceEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    /// Compute every derived metric of a chart.
    ///
    /// Returns `None` for Graveyard charts and for payloads the engine cannot decode.
    pub fn compute(&self, snapshot: &ChartSnapshot, chart: &[u8]) -> Option<ChartMetrics> {
        if snapshot.approval.is_excluded() {
            debug!("Chart {} is in the graveyard, skipping", snapshot.chart_id);
            return None;
        }

        let Some(base) = self.engine.compute(chart, Mods::NONE) else {
            warn!("Chart {} payload could not be decoded", snapshot.chart_id);
            return None;
        };

        let mut mod_performance = BTreeMap::new();
        for (mods, name) in MOD_COMBINATIONS {
            let value = match self.engine.compute(chart, mods) {
                Some(report) => clamp_performance(report.performance),
                None => {
                    warn!("Chart {} failed under {}", snapshot.chart_id, name);
                    0
                }
            };
            mod_performance.insert(name.to_string(), value);
        }

        Some(ChartMetrics {
            performance: clamp_performance(base.performance),
            aim_rating: base.aim_rating,
            speed_rating: base.speed_rating,
            playstyle: playstyle(base.aim_rating, snapshot.star_rating),
            max_combo: base.max_combo,
            mod_performance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Approval;
    use crate::mock::MockEngine;

    fn snapshot(approval: Approval, star_rating: f64) -> ChartSnapshot {
        ChartSnapshot {
            chart_id: 75,
            approval,
            star_rating,
            ..Default::default()
        }
    }

    #[test]
    fn test_clamp_performance() {
        assert_eq!(clamp_performance(123.9), 123);
        assert_eq!(clamp_performance(2_147_483_647.0), i32::MAX);
        assert_eq!(clamp_performance(1e12), i32::MAX);
        assert_eq!(clamp_performance(f64::INFINITY), i32::MAX);
        assert_eq!(clamp_performance(-4.0), 0);
        assert_eq!(clamp_performance(f64::NAN), 0);
    }

    #[test]
    fn test_playstyle_zero_rating() {
        assert_eq!(playstyle(0.0, 0.0), 0.5);
        assert_eq!(playstyle(3.2, 0.0), 0.5);
        assert_eq!(playstyle(2.0, 4.0), 0.5);
        assert_eq!(playstyle(3.0, 4.0), 0.75);
    }

    #[test]
    fn test_computes_every_combination() {
        let computer = MetricComputer::new(MockEngine::new(100.0));
        let metrics = computer
            .compute(&snapshot(Approval::Ranked, 5.0), b"chart")
            .unwrap();

        assert_eq!(metrics.mod_performance.len(), MOD_COMBINATIONS.len());
        for (mods, name) in MOD_COMBINATIONS {
            let expected = clamp_performance(MockEngine::new(100.0).performance_for(mods));
            assert_eq!(metrics.mod_performance[name], expected);
        }
        assert_eq!(metrics.performance, 100);
    }

    #[test]
    fn test_overflow_is_clamped_everywhere() {
        let computer = MetricComputer::new(MockEngine::new(5e15));
        let metrics = computer
            .compute(&snapshot(Approval::Loved, 5.0), b"chart")
            .unwrap();

        assert_eq!(metrics.performance, i32::MAX);
        assert!(metrics.mod_performance.values().all(|v| *v == i32::MAX));
    }

    #[test]
    fn test_graveyard_is_not_found() {
        let computer = MetricComputer::new(MockEngine::new(100.0));
        assert_eq!(computer.compute(&snapshot(Approval::Graveyard, 5.0), b"chart"), None);
        assert_eq!(computer.compute(&snapshot(Approval::Graveyard, 5.0), b""), None);
    }

    #[test]
    fn test_undecodable_is_not_found() {
        let computer = MetricComputer::new(MockEngine::new(100.0));
        assert_eq!(computer.compute(&snapshot(Approval::Ranked, 5.0), b""), None);
    }

    #[test]
    fn test_playstyle_from_engine() {
        let computer = MetricComputer::new(MockEngine::new(100.0).with_ratings(2.0, 1.0));
        let metrics = computer
            .compute(&snapshot(Approval::Ranked, 8.0), b"chart")
            .unwrap();
        assert_eq!(metrics.playstyle, 0.25);

        let metrics = computer
            .compute(&snapshot(Approval::Ranked, 0.0), b"chart")
            .unwrap();
        assert_eq!(metrics.playstyle, 0.5);
        assert_eq!(metrics.aim_rating, 2.0);
    }
}
