use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::Mods;
use crate::profile::ProfileStats;

/// Player metadata as reported by the scoring service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user_id: u32,
    pub username: String,
    pub country: String,
    pub count300: u64,
    pub count100: u64,
    pub count50: u64,
    pub playcount: u64,
    pub ranked_score: u64,
    pub total_score: u64,
    pub pp_rank: u32,
    pub pp_country_rank: u32,
    pub level: f64,
    pub pp_raw: f64,
    pub accuracy: f64,
    pub count_rank_ss: u32,
    pub count_rank_ssh: u32,
    pub count_rank_s: u32,
    pub count_rank_sh: u32,
    pub count_rank_a: u32,
}

/// One of a player's best plays
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaySnapshot {
    pub chart_id: u32,
    pub score: u64,
    pub max_combo: u32,
    pub count300: u32,
    pub count100: u32,
    pub count50: u32,
    pub count_miss: u32,
    pub count_katu: u32,
    pub count_geki: u32,
    pub perfect: bool,
    pub mods: Mods,
    pub date: DateTime<Utc>,
    pub rank: String,
    pub pp: f64,
}

impl PlaySnapshot {
    /// Hit accuracy in percent (osu!standard weighting)
    pub fn accuracy(&self) -> f64 {
        let hits = self.count300 as u64
            + self.count100 as u64
            + self.count50 as u64
            + self.count_miss as u64;
        if hits == 0 {
            return 0.0;
        }
        let points = 300 * self.count300 as u64 + 100 * self.count100 as u64 + 50 * self.count50 as u64;
        points as f64 / (300 * hits) as f64 * 100.0
    }
}

/// A synchronized player profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: u32,
    pub username: String,
    pub country: String,
    pub count300: u64,
    pub count100: u64,
    pub count50: u64,
    pub playcount: u64,
    pub ranked_score: u64,
    pub total_score: u64,
    pub pp_rank: u32,
    pub pp_country_rank: u32,
    pub level: f64,
    pub pp_raw: f64,
    pub accuracy: f64,
    pub count_rank_ss: u32,
    pub count_rank_ssh: u32,
    pub count_rank_s: u32,
    pub count_rank_sh: u32,
    pub count_rank_a: u32,
    pub stats: ProfileStats,
    pub last_update: DateTime<Utc>,
}

impl Profile {
    pub fn new(snapshot: ProfileSnapshot, stats: ProfileStats, last_update: DateTime<Utc>) -> Self {
        Self {
            user_id: snapshot.user_id,
            username: snapshot.username,
            country: snapshot.country,
            count300: snapshot.count300,
            count100: snapshot.count100,
            count50: snapshot.count50,
            playcount: snapshot.playcount,
            ranked_score: snapshot.ranked_score,
            total_score: snapshot.total_score,
            pp_rank: snapshot.pp_rank,
            pp_country_rank: snapshot.pp_country_rank,
            level: snapshot.level,
            pp_raw: snapshot.pp_raw,
            accuracy: snapshot.accuracy,
            count_rank_ss: snapshot.count_rank_ss,
            count_rank_ssh: snapshot.count_rank_ssh,
            count_rank_s: snapshot.count_rank_s,
            count_rank_sh: snapshot.count_rank_sh,
            count_rank_a: snapshot.count_rank_a,
            stats,
            last_update,
        }
    }

    /// Whether the profile was last refreshed longer than `freshness` ago
    pub fn is_stale(&self, now: DateTime<Utc>, freshness: chrono::Duration) -> bool {
        now - self.last_update > freshness
    }

    /// Bump `last_update` without ever moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_update = self.last_update.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_play_accuracy() {
        let play = PlaySnapshot {
            count300: 100,
            ..Default::default()
        };
        assert_eq!(play.accuracy(), 100.0);

        let play = PlaySnapshot {
            count300: 2,
            count100: 1,
            count50: 0,
            count_miss: 1,
            ..Default::default()
        };
        assert!((play.accuracy() - 58.333333).abs() < 1e-4);

        assert_eq!(PlaySnapshot::default().accuracy(), 0.0);
    }

    #[test]
    fn test_play_accuracy_with_huge_counters() {
        let play = PlaySnapshot {
            count300: u32::MAX,
            count100: 1,
            ..Default::default()
        };
        let accuracy = play.accuracy();
        assert!(accuracy > 99.99 && accuracy <= 100.0);

        let play = PlaySnapshot {
            count300: u32::MAX,
            count100: u32::MAX,
            count50: u32::MAX,
            count_miss: u32::MAX,
            ..Default::default()
        };
        assert!((play.accuracy() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_staleness() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let profile = Profile::new(ProfileSnapshot::default(), ProfileStats::default(), updated);

        assert!(!profile.is_stale(updated + Duration::hours(23), Duration::days(1)));
        assert!(profile.is_stale(updated + Duration::hours(25), Duration::days(1)));
    }

    #[test]
    fn test_touch_is_monotonic() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut profile = Profile::new(ProfileSnapshot::default(), ProfileStats::default(), updated);

        profile.touch(updated - Duration::hours(1));
        assert_eq!(profile.last_update, updated);

        profile.touch(updated + Duration::hours(1));
        assert_eq!(profile.last_update, updated + Duration::hours(1));
    }
}
