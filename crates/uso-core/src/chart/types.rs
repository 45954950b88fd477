use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{FromRepr, IntoStaticStr};

use crate::chart::ChartMetrics;

/// Ranking state of a chart on the scoring service
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromRepr,
    IntoStaticStr,
)]
#[repr(i8)]
pub enum Approval {
    Graveyard = -2,
    #[strum(serialize = "WIP")]
    WorkInProgress = -1,
    #[default]
    Pending = 0,
    Ranked = 1,
    Approved = 2,
    Qualified = 3,
    Loved = 4,
}

impl Approval {
    pub fn from_code(code: i8) -> Option<Self> {
        Self::from_repr(code)
    }

    pub fn code(&self) -> i8 {
        *self as i8
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Graveyard charts are never computed or stored
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Graveyard)
    }
}

/// Chart metadata as reported by the scoring service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub chart_id: u32,
    pub set_id: u32,
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub file_md5: String,
    pub mode: u8,
    pub genre_id: u32,
    pub language_id: u32,
    pub circle_size: f64,
    pub overall_difficulty: f64,
    pub approach_rate: f64,
    pub hp_drain: f64,
    pub bpm: f64,
    pub hit_length: u32,
    pub total_length: u32,
    pub star_rating: f64,
    pub approval: Approval,
    pub approved_date: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    pub favourite_count: u32,
    pub playcount: u32,
    pub passcount: u32,
    pub max_combo: Option<u32>,
}

/// A synchronized chart with its derived performance metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub chart_id: u32,
    pub set_id: u32,
    pub artist: String,
    pub title: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub file_md5: String,
    pub mode: u8,
    pub genre_id: u32,
    pub language_id: u32,
    pub circle_size: f64,
    pub overall_difficulty: f64,
    pub approach_rate: f64,
    pub hp_drain: f64,
    pub bpm: f64,
    pub hit_length: u32,
    pub total_length: u32,
    pub star_rating: f64,
    pub approval: Approval,
    pub approved_date: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    pub favourite_count: u32,
    pub playcount: u32,
    pub passcount: u32,
    pub max_combo: u32,
    pub aim_rating: f64,
    pub speed_rating: f64,
    /// 0 = jump oriented, 1 = stream oriented
    pub playstyle: f64,
    /// Performance value without modifiers
    pub performance: i32,
    /// Performance value per canonical modifier name
    pub mod_performance: BTreeMap<String, i32>,
}

impl Chart {
    pub fn new(snapshot: ChartSnapshot, metrics: ChartMetrics) -> Self {
        Self {
            chart_id: snapshot.chart_id,
            set_id: snapshot.set_id,
            artist: snapshot.artist,
            title: snapshot.title,
            creator: snapshot.creator,
            version: snapshot.version,
            source: snapshot.source,
            tags: snapshot.tags,
            file_md5: snapshot.file_md5,
            mode: snapshot.mode,
            genre_id: snapshot.genre_id,
            language_id: snapshot.language_id,
            circle_size: snapshot.circle_size,
            overall_difficulty: snapshot.overall_difficulty,
            approach_rate: snapshot.approach_rate,
            hp_drain: snapshot.hp_drain,
            bpm: snapshot.bpm,
            hit_length: snapshot.hit_length,
            total_length: snapshot.total_length,
            star_rating: snapshot.star_rating,
            approval: snapshot.approval,
            approved_date: snapshot.approved_date,
            last_update: snapshot.last_update,
            favourite_count: snapshot.favourite_count,
            playcount: snapshot.playcount,
            passcount: snapshot.passcount,
            max_combo: snapshot.max_combo.unwrap_or(metrics.max_combo),
            aim_rating: metrics.aim_rating,
            speed_rating: metrics.speed_rating,
            playstyle: metrics.playstyle,
            performance: metrics.performance,
            mod_performance: metrics.mod_performance,
        }
    }

    /// Display name in the usual "Artist - Title [Version]" form
    pub fn display_name(&self) -> String {
        format!("{} - {} [{}]", self.artist, self.title, self.version)
    }

    /// Stored performance value for a canonical modifier name ("" for no modifiers)
    pub fn performance_for(&self, mod_name: &str) -> Option<i32> {
        if mod_name.is_empty() {
            Some(self.performance)
        } else {
            self.mod_performance.get(mod_name).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_codes() {
        assert_eq!(Approval::from_code(-2), Some(Approval::Graveyard));
        assert_eq!(Approval::from_code(4), Some(Approval::Loved));
        assert_eq!(Approval::from_code(5), None);
        assert_eq!(Approval::Ranked.code(), 1);
        assert_eq!(Approval::WorkInProgress.name(), "WIP");
        assert!(Approval::Graveyard.is_excluded());
        assert!(!Approval::Pending.is_excluded());
    }

    #[test]
    fn test_chart_from_snapshot() {
        let snapshot = ChartSnapshot {
            chart_id: 129891,
            artist: "xi".to_string(),
            title: "FREEDOM DiVE".to_string(),
            version: "FOUR DIMENSIONS".to_string(),
            star_rating: 7.0,
            approval: Approval::Ranked,
            max_combo: None,
            ..Default::default()
        };
        let mut mod_performance = BTreeMap::new();
        mod_performance.insert("HR".to_string(), 900);
        let metrics = ChartMetrics {
            performance: 800,
            aim_rating: 3.5,
            speed_rating: 3.0,
            playstyle: 0.5,
            max_combo: 2385,
            mod_performance,
        };

        let chart = Chart::new(snapshot, metrics);
        assert_eq!(chart.chart_id, 129891);
        assert_eq!(chart.max_combo, 2385);
        assert_eq!(chart.display_name(), "xi - FREEDOM DiVE [FOUR DIMENSIONS]");
        assert_eq!(chart.performance_for(""), Some(800));
        assert_eq!(chart.performance_for("HR"), Some(900));
        assert_eq!(chart.performance_for("EZ"), None);
    }
}
