use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::profile::{PlaySample, Profile, ProfileStats, aggregate, clamp_sample_size};
use crate::storage::Stored;
use crate::sync::{RecordKind, Session, SyncEngine};

impl SyncEngine {
    /// Return a profile, importing or refreshing it as asked.
    ///
    /// A stored profile is refreshed when `force_update` is set or when it is
    /// older than the configured freshness window.
    pub fn request_profile(
        &self,
        user_id: u32,
        force_update: bool,
        try_import: bool,
    ) -> Result<Option<Stored<Profile>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Profile, user_id);

        match session.store().find_profile(user_id)? {
            Some(row) => {
                if force_update || row.record.is_stale(Utc::now(), self.settings.profile_freshness) {
                    self.update_profile_in(&session, user_id)
                } else {
                    Ok(Some(row))
                }
            }
            None if try_import => self.import_profile_in(&session, user_id, false),
            None => Ok(None),
        }
    }

    /// Fetch a profile and its best plays, aggregate statistics and store it.
    pub fn import_profile(&self, user_id: u32, check_store: bool) -> Result<Option<Stored<Profile>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Profile, user_id);
        self.import_profile_in(&session, user_id, check_store)
    }

    /// Refresh a stored profile.
    ///
    /// Statistics are only recomputed once the performance total has grown by
    /// the configured threshold; otherwise just the update time moves.
    pub fn update_profile(&self, user_id: u32) -> Result<Option<Stored<Profile>>> {
        let session = self.session()?;
        let _guard = self.locks.lock(RecordKind::Profile, user_id);
        self.update_profile_in(&session, user_id)
    }

    fn import_profile_in(
        &self,
        session: &Session,
        user_id: u32,
        check_store: bool,
    ) -> Result<Option<Stored<Profile>>> {
        if check_store && let Some(row) = session.store().find_profile(user_id)? {
            return Ok(Some(row));
        }

        let Some(snapshot) = session.api().profile(user_id)? else {
            debug!("Profile {} not available remotely", user_id);
            return Ok(None);
        };

        let stats = self.profile_stats(session, user_id)?;
        let row = session
            .store()
            .insert_profile(Profile::new(snapshot, stats, Utc::now()))?;
        info!(
            "Imported profile {} ({}) as {}",
            user_id, row.record.username, row.id
        );
        Ok(Some(row))
    }

    fn update_profile_in(&self, session: &Session, user_id: u32) -> Result<Option<Stored<Profile>>> {
        let Some(mut stored) = session.store().find_profile(user_id)? else {
            return Ok(None);
        };

        let Some(snapshot) = session.api().profile(user_id)? else {
            warn!("Profile {} vanished remotely, keeping stored copy", user_id);
            return Ok(Some(stored));
        };

        let now = Utc::now();
        let gain = snapshot.pp_raw - stored.record.pp_raw;
        if gain >= self.settings.profile_pp_threshold {
            let stats = self.profile_stats(session, user_id)?;
            let last_update = now.max(stored.record.last_update);
            stored.record = Profile::new(snapshot, stats, last_update);
            info!("Recomputed profile {} (+{:.2}pp)", user_id, gain);
        } else {
            stored.record.touch(now);
            debug!("Profile {} changed by {:.2}pp, touching only", user_id, gain);
        }

        session.store().update_profile(&stored)?;
        Ok(Some(stored))
    }

    /// Aggregate the best-play sample, resolving each play's chart.
    fn profile_stats(&self, session: &Session, user_id: u32) -> Result<ProfileStats> {
        let limit = clamp_sample_size(self.settings.sample_size);
        let plays = session.api().best_plays(user_id, limit)?;

        let mut samples = Vec::with_capacity(plays.len());
        for play in plays {
            let chart = {
                let _guard = self.locks.lock(RecordKind::Chart, play.chart_id);
                self.request_chart_in(session, play.chart_id, false, true)?
            };
            if chart.is_none() {
                debug!(
                    "Chart {} of profile {} could not be resolved",
                    play.chart_id, user_id
                );
            }
            samples.push(PlaySample {
                play,
                chart: chart.map(|row| row.record),
            });
        }

        Ok(aggregate(&samples))
    }
}
