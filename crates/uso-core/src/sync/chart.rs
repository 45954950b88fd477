use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::chart::{Chart, ChartMetrics, ChartSnapshot};
use crate::error::Result;
use crate::storage::Stored;
use crate::sync::{RecordKind, Session, SyncEngine};

/// Where a chart payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Remote,
}

impl SyncEngine {
    /// Return a chart, importing or refreshing it as asked.
    ///
    /// A stored chart is returned without any remote call unless
    /// `force_update` is set. A missing chart is imported when `try_import`
    /// is set and is `None` otherwise.
    pub fn request_chart(
        &self,
        chart_id: u32,
        force_update: bool,
        try_import: bool,
    ) -> Result<Option<Stored<Chart>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Chart, chart_id);
        self.request_chart_in(&session, chart_id, force_update, try_import)
    }

    /// Fetch a chart from the service, compute its metrics and store it.
    ///
    /// With `check_store` an already stored chart is returned as is.
    pub fn import_chart(&self, chart_id: u32, check_store: bool) -> Result<Option<Stored<Chart>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Chart, chart_id);
        self.import_chart_in(&session, chart_id, check_store)
    }

    /// Refresh a stored chart if the service reports a newer revision.
    pub fn update_chart(&self, chart_id: u32) -> Result<Option<Stored<Chart>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Chart, chart_id);
        self.update_chart_in(&session, chart_id)
    }

    /// Import every id not yet stored, returning the newly imported rows.
    ///
    /// The stored ids are listed once up front; repeated ids are imported once.
    pub fn import_charts(&self, chart_ids: &[u32]) -> Result<Vec<Stored<Chart>>> {
        let session = self.session()?;
        let mut known: HashSet<u32> = session.store().chart_ids()?;
        let mut imported = Vec::new();

        for &chart_id in chart_ids {
            if !known.insert(chart_id) {
                debug!("Chart {} already stored, skipping", chart_id);
                continue;
            }
            let _guard = self.locks.lock(RecordKind::Chart, chart_id);
            if let Some(row) = self.import_chart_in(&session, chart_id, false)? {
                imported.push(row);
            }
        }

        info!(
            "Imported {} of {} requested charts",
            imported.len(),
            chart_ids.len()
        );
        Ok(imported)
    }

    pub(super) fn request_chart_in(
        &self,
        session: &Session,
        chart_id: u32,
        force_update: bool,
        try_import: bool,
    ) -> Result<Option<Stored<Chart>>> {
        match session.store().find_chart(chart_id)? {
            Some(_) if force_update => self.update_chart_in(session, chart_id),
            Some(row) => Ok(Some(row)),
            None if try_import => self.import_chart_in(session, chart_id, false),
            None => Ok(None),
        }
    }

    fn import_chart_in(
        &self,
        session: &Session,
        chart_id: u32,
        check_store: bool,
    ) -> Result<Option<Stored<Chart>>> {
        if check_store && let Some(row) = session.store().find_chart(chart_id)? {
            return Ok(Some(row));
        }

        let Some(snapshot) = session.api().chart(chart_id)? else {
            debug!("Chart {} not available remotely", chart_id);
            return Ok(None);
        };
        if snapshot.approval.is_excluded() {
            debug!("Chart {} is in the graveyard, not importing", chart_id);
            return Ok(None);
        }

        let Some(metrics) = self.chart_metrics(session, &snapshot, false)? else {
            return Ok(None);
        };

        let row = session.store().insert_chart(Chart::new(snapshot, metrics))?;
        info!(
            "Imported chart {} {} as {}",
            chart_id,
            row.record.display_name(),
            row.id
        );
        Ok(Some(row))
    }

    fn update_chart_in(&self, session: &Session, chart_id: u32) -> Result<Option<Stored<Chart>>> {
        let Some(stored) = session.store().find_chart(chart_id)? else {
            return Ok(None);
        };

        let Some(snapshot) = session.api().chart(chart_id)? else {
            warn!("Chart {} vanished remotely, keeping stored copy", chart_id);
            return Ok(Some(stored));
        };
        if snapshot.last_update == stored.record.last_update {
            debug!("Chart {} is up to date", chart_id);
            return Ok(Some(stored));
        }
        if snapshot.approval.is_excluded() {
            warn!(
                "Chart {} moved to the graveyard, keeping stored copy",
                chart_id
            );
            return Ok(Some(stored));
        }

        let Some(metrics) = self.chart_metrics(session, &snapshot, true)? else {
            warn!(
                "Chart {} revision {} could not be processed, keeping stored copy",
                chart_id, snapshot.last_update
            );
            return Ok(Some(stored));
        };

        let row = Stored {
            id: stored.id,
            record: Chart::new(snapshot, metrics),
        };
        session.store().update_chart(&row)?;
        info!(
            "Updated chart {} to revision {}",
            chart_id, row.record.last_update
        );
        Ok(Some(row))
    }

    /// Compute metrics, trying a fresh download once if a cached payload
    /// does not decode.
    fn chart_metrics(
        &self,
        session: &Session,
        snapshot: &ChartSnapshot,
        fresh: bool,
    ) -> Result<Option<ChartMetrics>> {
        let chart_id = snapshot.chart_id;
        let Some((bytes, source)) = self.chart_bytes(session, chart_id, fresh)? else {
            warn!("Chart {} has no downloadable file", chart_id);
            return Ok(None);
        };
        if let Some(metrics) = self.metrics.compute(snapshot, &bytes) {
            return Ok(Some(metrics));
        }
        if source == Source::Remote {
            return Ok(None);
        }

        debug!("Cached file of chart {} did not decode, downloading", chart_id);
        let Some((bytes, _)) = self.chart_bytes(session, chart_id, true)? else {
            return Ok(None);
        };
        Ok(self.metrics.compute(snapshot, &bytes))
    }

    /// Chart file bytes, from the cache unless `fresh` is set.
    ///
    /// Downloads are written back to the cache; a failed cache write is not an error.
    fn chart_bytes(
        &self,
        session: &Session,
        chart_id: u32,
        fresh: bool,
    ) -> Result<Option<(Vec<u8>, Source)>> {
        let key = chart_id.to_string();
        if !fresh && let Some(bytes) = self.cache.read(&key) {
            debug!("Cache hit for chart {}", chart_id);
            return Ok(Some((bytes, Source::Cache)));
        }

        let Some(bytes) = session.api().chart_file(chart_id)? else {
            return Ok(None);
        };
        if !self.cache.write(&key, &bytes) {
            warn!("Could not cache chart {}", chart_id);
        }
        Ok(Some((bytes, Source::Remote)))
    }
}
