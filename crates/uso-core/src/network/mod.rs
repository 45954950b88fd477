//! Scoring service access.

mod client;
mod osu;

pub use client::HttpClient;
pub use osu::OsuApi;

use crate::chart::ChartSnapshot;
use crate::error::Result;
use crate::profile::{PlaySnapshot, ProfileSnapshot};

/// Trait for the remote scoring service.
///
/// Lookups return `Ok(None)` when the service has no such record or answers
/// with something unusable; `Err` is reserved for transport failures.
pub trait ScoringApi: Send + Sync {
    /// Chart metadata by chart id.
    fn chart(&self, chart_id: u32) -> Result<Option<ChartSnapshot>>;

    /// Raw chart file bytes by chart id.
    fn chart_file(&self, chart_id: u32) -> Result<Option<Vec<u8>>>;

    /// Player metadata by user id.
    fn profile(&self, user_id: u32) -> Result<Option<ProfileSnapshot>>;

    /// A player's best plays, best first, at most `limit` entries.
    fn best_plays(&self, user_id: u32, limit: u32) -> Result<Vec<PlaySnapshot>>;
}

impl<A: ScoringApi + ?Sized> ScoringApi for Box<A> {
    fn chart(&self, chart_id: u32) -> Result<Option<ChartSnapshot>> {
        (**self).chart(chart_id)
    }

    fn chart_file(&self, chart_id: u32) -> Result<Option<Vec<u8>>> {
        (**self).chart_file(chart_id)
    }

    fn profile(&self, user_id: u32) -> Result<Option<ProfileSnapshot>> {
        (**self).profile(user_id)
    }

    fn best_plays(&self, user_id: u32, limit: u32) -> Result<Vec<PlaySnapshot>> {
        (**self).best_plays(user_id, limit)
    }
}
