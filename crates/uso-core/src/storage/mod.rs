//! Persistent record storage.
//!
//! `RecordStore` is the seam between the sync engine and whatever keeps the
//! records. Inserts are upserts keyed by external id, so a record type never
//! holds two rows for the same id, and updates address rows by the
//! store-assigned [`RowId`], which never changes.

mod local;

pub use local::LocalStore;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::Result;
use crate::profile::Profile;

/// Store-assigned primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A record together with its primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: RowId,
    pub record: T,
}

/// Records addressable by the scoring service's identifier
pub trait Record: Clone {
    fn external_id(&self) -> u32;
}

impl Record for Chart {
    fn external_id(&self) -> u32 {
        self.chart_id
    }
}

impl Record for Profile {
    fn external_id(&self) -> u32 {
        self.user_id
    }
}

/// Trait for the persistent record store.
pub trait RecordStore: Send + Sync {
    /// Look up a chart by its external id.
    fn find_chart(&self, chart_id: u32) -> Result<Option<Stored<Chart>>>;

    /// Insert a chart, or overwrite the row already holding its external id.
    fn insert_chart(&self, chart: Chart) -> Result<Stored<Chart>>;

    /// Overwrite an existing chart row in place.
    fn update_chart(&self, row: &Stored<Chart>) -> Result<()>;

    /// External ids of every stored chart.
    fn chart_ids(&self) -> Result<HashSet<u32>>;

    /// Look up a profile by its external id.
    fn find_profile(&self, user_id: u32) -> Result<Option<Stored<Profile>>>;

    /// Insert a profile, or overwrite the row already holding its external id.
    fn insert_profile(&self, profile: Profile) -> Result<Stored<Profile>>;

    /// Overwrite an existing profile row in place.
    fn update_profile(&self, row: &Stored<Profile>) -> Result<()>;

    /// External ids of every stored profile.
    fn profile_ids(&self) -> Result<HashSet<u32>>;
}
