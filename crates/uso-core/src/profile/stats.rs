//! Profile statistics over a sample of best plays.
//!
//! Means are accumulated as `sum += value / n` in sample order rather than
//! divided at the end, so results are reproducible bit for bit.

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Mods};
use crate::config::sync::{MAX_SAMPLE_SIZE, MIN_SAMPLE_SIZE};
use crate::profile::PlaySnapshot;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    pub sample_size: u32,
    pub pp_average: f64,
    pub accuracy_average: f64,
    pub od_average: f64,
    pub ar_average: f64,
    pub cs_average: f64,
    pub bpm_average: f64,
    pub length_average: f64,
    pub playstyle_average: f64,
    pub bpm_low: f64,
    pub bpm_high: f64,
    pub preferred_mods: Mods,
}

/// A best play and the chart it was set on, if the chart could be resolved
#[derive(Debug, Clone)]
pub struct PlaySample {
    pub play: PlaySnapshot,
    pub chart: Option<Chart>,
}

/// Clamp a requested best-play sample size to the range the service accepts
pub fn clamp_sample_size(requested: u32) -> u32 {
    requested.clamp(MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE)
}

/// Aggregate statistics over an ordered best-play sample.
///
/// Chart-derived means only include plays whose chart resolved but are still
/// divided by the full sample size.
pub fn aggregate(samples: &[PlaySample]) -> ProfileStats {
    if samples.is_empty() {
        return ProfileStats::default();
    }

    let n = samples.len() as f64;
    let mut stats = ProfileStats {
        sample_size: samples.len() as u32,
        ..Default::default()
    };
    let mut bpm_range: Option<(f64, f64)> = None;

    for sample in samples {
        stats.pp_average += sample.play.pp / n;
        stats.accuracy_average += sample.play.accuracy() / n;

        let Some(chart) = &sample.chart else {
            continue;
        };

        stats.od_average += chart.overall_difficulty / n;
        stats.ar_average += chart.approach_rate / n;
        stats.cs_average += chart.circle_size / n;
        stats.bpm_average += chart.bpm / n;
        stats.length_average += chart.total_length as f64 / n;
        stats.playstyle_average += chart.playstyle / n;

        bpm_range = Some(match bpm_range {
            Some((low, high)) => (low.min(chart.bpm), high.max(chart.bpm)),
            None => (chart.bpm, chart.bpm),
        });
    }

    if let Some((low, high)) = bpm_range {
        stats.bpm_low = low;
        stats.bpm_high = high;
    }
    stats.preferred_mods = preferred_mods(samples.iter().map(|s| s.play.mods));

    stats
}

/// Most frequent modifier combination.
///
/// The frequency table keeps first-occurrence order and is scanned with `>=`,
/// so on a tie the last maximal combination in that order wins.
pub fn preferred_mods(mods: impl IntoIterator<Item = Mods>) -> Mods {
    let mut frequencies: Vec<(Mods, u32)> = Vec::new();
    for m in mods {
        match frequencies.iter_mut().find(|(key, _)| *key == m) {
            Some((_, count)) => *count += 1,
            None => frequencies.push((m, 1)),
        }
    }

    let mut best = Mods::NONE;
    let mut best_count = 0;
    for (m, count) in frequencies {
        if count >= best_count {
            best = m;
            best_count = count;
        }
    }
    best
}
