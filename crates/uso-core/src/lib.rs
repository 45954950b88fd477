pub mod cache;
pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod profile;
pub mod storage;
pub mod sync;

// Mock service and engine (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use cache::CacheStore;
pub use chart::{
    Approval, Chart, ChartMetrics, ChartSnapshot, MOD_COMBINATIONS, MetricComputer, Mods,
};
pub use config::{Config, SyncSettings};
pub use engine::{PerformanceEngine, PerformanceReport, RosuEngine};
pub use error::{Error, Result};
pub use network::{HttpClient, OsuApi, ScoringApi};
pub use profile::{PlaySample, PlaySnapshot, Profile, ProfileSnapshot, ProfileStats};
pub use storage::{LocalStore, RecordStore, RowId, Stored};
pub use sync::{RecordKind, SyncEngine};
