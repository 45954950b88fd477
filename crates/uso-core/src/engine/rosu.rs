//! Performance engine backed by rosu-pp.

use rosu_pp::any::PerformanceAttributes;
use tracing::debug;

use crate::chart::Mods;
use crate::engine::{PerformanceEngine, PerformanceReport};

/// osu! performance calculator using rosu-pp.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosuEngine;

impl RosuEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceEngine for RosuEngine {
    fn compute(&self, chart: &[u8], mods: Mods) -> Option<PerformanceReport> {
        let map = match rosu_pp::Beatmap::from_bytes(chart) {
            Ok(map) => map,
            Err(e) => {
                debug!("Undecodable chart payload: {}", e);
                return None;
            }
        };

        // Parsing is lenient; a file without hit objects is not a chart
        if map.hit_objects.is_empty() {
            return None;
        }

        let attrs = rosu_pp::Performance::new(&map).mods(mods.bits()).calculate();

        let (aim_rating, speed_rating) = match &attrs {
            PerformanceAttributes::Osu(osu) => (osu.difficulty.aim, osu.difficulty.speed),
            _ => (0.0, 0.0),
        };

        Some(PerformanceReport {
            performance: attrs.pp(),
            aim_rating,
            speed_rating,
            max_combo: attrs.max_combo(),
        })
    }
}
