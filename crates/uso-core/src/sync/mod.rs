//! Record synchronization.
//!
//! [`SyncEngine`] keeps the local store in step with the scoring service.
//! Stored records are served without touching the network; missing records
//! are imported on request and existing ones refreshed when forced or stale.
//!
//! Every public operation locks its `(kind, id)` key in [`KeyedLocks`] and
//! then runs an unlocked internal variant, so nested work (a profile import
//! resolving charts) never re-enters a lock it already holds.

mod chart;
mod lock;
mod profile;

pub use lock::{KeyGuard, KeyedLocks, RecordKind};

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::chart::MetricComputer;
use crate::config::SyncSettings;
use crate::engine::PerformanceEngine;
use crate::error::{Error, Result};
use crate::network::ScoringApi;
use crate::storage::RecordStore;

/// Remote service and store bound by [`SyncEngine::connect`]
pub struct Session {
    api: Box<dyn ScoringApi>,
    store: Box<dyn RecordStore>,
}

impl Session {
    pub fn api(&self) -> &dyn ScoringApi {
        self.api.as_ref()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}

pub struct SyncEngine {
    session: RwLock<Option<Arc<Session>>>,
    cache: CacheStore,
    metrics: MetricComputer,
    settings: SyncSettings,
    locks: KeyedLocks,
}

impl SyncEngine {
    pub fn new(
        cache: CacheStore,
        engine: impl PerformanceEngine + 'static,
        settings: SyncSettings,
    ) -> Self {
        Self {
            session: RwLock::new(None),
            cache,
            metrics: MetricComputer::new(engine),
            settings,
            locks: KeyedLocks::new(),
        }
    }

    /// Bind the remote service and the store. Does nothing when already connected.
    pub fn connect(
        &self,
        api: impl ScoringApi + 'static,
        store: impl RecordStore + 'static,
    ) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.is_some() {
            debug!("Already connected, keeping the current session");
            return;
        }
        *session = Some(Arc::new(Session {
            api: Box::new(api),
            store: Box::new(store),
        }));
        info!("Connected");
    }

    /// Drop the current session.
    ///
    /// Operations already running keep the session they started with.
    pub fn close(&self) -> Result<()> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.take().is_none() {
            return Err(Error::NotConnected);
        }
        info!("Connection closed");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    fn session(&self) -> Result<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, MockEngine};
    use crate::profile::{Profile, ProfileSnapshot, ProfileStats};
    use crate::storage::LocalStore;
    use chrono::Utc;

    fn engine(dir: &std::path::Path) -> SyncEngine {
        let cache = CacheStore::open(dir, 10).unwrap();
        SyncEngine::new(cache, MockEngine::new(100.0), SyncSettings::default())
    }

    #[test]
    fn test_connect_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let sync = engine(dir.path());
        assert!(!sync.is_connected());

        sync.connect(MockApi::new(), LocalStore::in_memory());
        assert!(sync.is_connected());

        sync.close().unwrap();
        assert!(!sync.is_connected());
        assert!(matches!(sync.close(), Err(Error::NotConnected)));
    }

    #[test]
    fn test_connect_twice_keeps_first_session() {
        let dir = tempfile::tempdir().unwrap();
        let sync = engine(dir.path());
        let first = LocalStore::in_memory();
        let snapshot = ProfileSnapshot {
            user_id: 3,
            ..Default::default()
        };
        first
            .insert_profile(Profile::new(snapshot, ProfileStats::default(), Utc::now()))
            .unwrap();

        sync.connect(MockApi::new(), first);
        sync.connect(MockApi::new(), LocalStore::in_memory());

        let session = sync.session().unwrap();
        assert!(session.store().profile_ids().unwrap().contains(&3));
    }

    #[test]
    fn test_session_requires_connection() {
        let dir = tempfile::tempdir().unwrap();
        let sync = engine(dir.path());
        assert!(matches!(sync.session(), Err(Error::NotConnected)));
    }
}
