//! Mock scoring service and performance engine for testing
//!
//! Both mocks are deterministic and record how often they were called, so
//! tests can assert on network traffic without a real service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chart::{ChartSnapshot, Mods};
use crate::engine::{PerformanceEngine, PerformanceReport};
use crate::error::{Error, Result};
use crate::network::ScoringApi;
use crate::profile::{PlaySnapshot, ProfileSnapshot};

#[derive(Debug, Default)]
struct MockData {
    charts: HashMap<u32, ChartSnapshot>,
    files: HashMap<u32, Vec<u8>>,
    profiles: HashMap<u32, ProfileSnapshot>,
    plays: HashMap<u32, Vec<PlaySnapshot>>,
}

#[derive(Debug, Default)]
struct MockCounters {
    chart: AtomicUsize,
    chart_file: AtomicUsize,
    profile: AtomicUsize,
    best_plays: AtomicUsize,
}

/// In-memory scoring service
///
/// Clones share data and counters, so a test can keep one handle while the
/// sync engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    data: Arc<Mutex<MockData>>,
    counters: Arc<MockCounters>,
    offline: Arc<AtomicBool>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve chart metadata and file bytes for `snapshot.chart_id`
    pub fn set_chart(&self, snapshot: ChartSnapshot, file: &[u8]) {
        let mut data = self.data();
        data.files.insert(snapshot.chart_id, file.to_vec());
        data.charts.insert(snapshot.chart_id, snapshot);
    }

    /// Serve chart metadata without changing the file bytes
    pub fn set_chart_metadata(&self, snapshot: ChartSnapshot) {
        self.data().charts.insert(snapshot.chart_id, snapshot);
    }

    pub fn remove_chart(&self, chart_id: u32) {
        let mut data = self.data();
        data.charts.remove(&chart_id);
        data.files.remove(&chart_id);
    }

    pub fn set_profile(&self, snapshot: ProfileSnapshot) {
        self.data().profiles.insert(snapshot.user_id, snapshot);
    }

    pub fn set_best_plays(&self, user_id: u32, plays: Vec<PlaySnapshot>) {
        self.data().plays.insert(user_id, plays);
    }

    /// Make every call fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn chart_calls(&self) -> usize {
        self.counters.chart.load(Ordering::SeqCst)
    }

    pub fn chart_file_calls(&self) -> usize {
        self.counters.chart_file.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.counters.profile.load(Ordering::SeqCst)
    }

    pub fn best_plays_calls(&self) -> usize {
        self.counters.best_plays.load(Ordering::SeqCst)
    }

    /// Calls across every endpoint
    pub fn total_calls(&self) -> usize {
        self.chart_calls() + self.chart_file_calls() + self.profile_calls() + self.best_plays_calls()
    }

    fn hit(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkError("mock service offline".to_string()));
        }
        Ok(())
    }
}

impl ScoringApi for MockApi {
    fn chart(&self, chart_id: u32) -> Result<Option<ChartSnapshot>> {
        self.hit(&self.counters.chart)?;
        Ok(self.data().charts.get(&chart_id).cloned())
    }

    fn chart_file(&self, chart_id: u32) -> Result<Option<Vec<u8>>> {
        self.hit(&self.counters.chart_file)?;
        Ok(self.data().files.get(&chart_id).cloned())
    }

    fn profile(&self, user_id: u32) -> Result<Option<ProfileSnapshot>> {
        self.hit(&self.counters.profile)?;
        Ok(self.data().profiles.get(&user_id).cloned())
    }

    fn best_plays(&self, user_id: u32, limit: u32) -> Result<Vec<PlaySnapshot>> {
        self.hit(&self.counters.best_plays)?;
        let data = self.data();
        let plays = data.plays.get(&user_id).map(Vec::as_slice).unwrap_or_default();
        Ok(plays.iter().take(limit as usize).cloned().collect())
    }
}

/// Deterministic performance engine
///
/// Empty payloads fail to decode. Any other payload yields `base_pp` scaled
/// by the modifier bits, so every combination gets a distinct value.
#[derive(Debug, Clone)]
pub struct MockEngine {
    base_pp: f64,
    aim_rating: f64,
    speed_rating: f64,
    max_combo: u32,
}

impl MockEngine {
    pub fn new(base_pp: f64) -> Self {
        Self {
            base_pp,
            aim_rating: 2.5,
            speed_rating: 2.0,
            max_combo: 500,
        }
    }

    pub fn with_ratings(mut self, aim_rating: f64, speed_rating: f64) -> Self {
        self.aim_rating = aim_rating;
        self.speed_rating = speed_rating;
        self
    }

    /// Performance reported for `mods`
    pub fn performance_for(&self, mods: Mods) -> f64 {
        self.base_pp * (1.0 + mods.bits() as f64 / 1000.0)
    }
}

impl PerformanceEngine for MockEngine {
    fn compute(&self, chart: &[u8], mods: Mods) -> Option<PerformanceReport> {
        if chart.is_empty() {
            return None;
        }
        Some(PerformanceReport {
            performance: self.performance_for(mods),
            aim_rating: self.aim_rating,
            speed_rating: self.speed_rating,
            max_combo: self.max_combo,
        })
    }
}
