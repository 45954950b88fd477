//! osu! API v1 client.
//!
//! The v1 API encodes every number as a string and every date as
//! `YYYY-MM-DD HH:MM:SS` in UTC. Records missing a required field are treated
//! as absent rather than as errors.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chart::{Approval, ChartSnapshot, Mods};
use crate::config::ApiConfig;
use crate::error::Result;
use crate::network::{HttpClient, ScoringApi};
use crate::profile::{PlaySnapshot, ProfileSnapshot};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct OsuApi {
    client: HttpClient,
}

impl OsuApi {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: HttpClient::new(config.base_url.clone(), config.key.clone(), config.timeout()),
        }
    }
}

impl ScoringApi for OsuApi {
    fn chart(&self, chart_id: u32) -> Result<Option<ChartSnapshot>> {
        let rows: Option<Vec<RawBeatmap>> = self
            .client
            .get_json("api/get_beatmaps", &[("b", chart_id.to_string())])?;

        let snapshot = rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(RawBeatmap::into_snapshot);
        if snapshot.is_none() {
            debug!("Chart {} not found remotely", chart_id);
        }
        Ok(snapshot)
    }

    fn chart_file(&self, chart_id: u32) -> Result<Option<Vec<u8>>> {
        self.client.get_bytes(&format!("osu/{}", chart_id))
    }

    fn profile(&self, user_id: u32) -> Result<Option<ProfileSnapshot>> {
        let rows: Option<Vec<RawUser>> = self.client.get_json(
            "api/get_user",
            &[("u", user_id.to_string()), ("type", "id".to_string())],
        )?;

        Ok(rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(RawUser::into_snapshot))
    }

    fn best_plays(&self, user_id: u32, limit: u32) -> Result<Vec<PlaySnapshot>> {
        let rows: Option<Vec<RawPlay>> = self.client.get_json(
            "api/get_user_best",
            &[
                ("u", user_id.to_string()),
                ("type", "id".to_string()),
                ("limit", limit.to_string()),
            ],
        )?;

        let rows = rows.unwrap_or_default();
        let total = rows.len();
        let plays: Vec<PlaySnapshot> = rows.into_iter().filter_map(RawPlay::into_snapshot).collect();
        if plays.len() != total {
            warn!(
                "Dropped {} malformed best plays of user {}",
                total - plays.len(),
                user_id
            );
        }
        Ok(plays)
    }
}

fn num<T: FromStr + Default>(value: &Option<String>) -> T {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

fn required<T: FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref()?.trim().parse().ok()
}

fn date(value: &Option<String>) -> Option<DateTime<Utc>> {
    let value = value.as_deref()?;
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBeatmap {
    beatmap_id: Option<String>,
    beatmapset_id: Option<String>,
    approved: Option<String>,
    approved_date: Option<String>,
    last_update: Option<String>,
    artist: Option<String>,
    title: Option<String>,
    creator: Option<String>,
    version: Option<String>,
    source: Option<String>,
    tags: Option<String>,
    file_md5: Option<String>,
    mode: Option<String>,
    genre_id: Option<String>,
    language_id: Option<String>,
    bpm: Option<String>,
    difficultyrating: Option<String>,
    diff_size: Option<String>,
    diff_overall: Option<String>,
    diff_approach: Option<String>,
    diff_drain: Option<String>,
    hit_length: Option<String>,
    total_length: Option<String>,
    favourite_count: Option<String>,
    playcount: Option<String>,
    passcount: Option<String>,
    max_combo: Option<String>,
}

impl RawBeatmap {
    fn into_snapshot(self) -> Option<ChartSnapshot> {
        let chart_id = required(&self.beatmap_id)?;
        let approval = Approval::from_code(required(&self.approved)?)?;
        let last_update = date(&self.last_update)?;

        Some(ChartSnapshot {
            chart_id,
            set_id: num(&self.beatmapset_id),
            approved_date: date(&self.approved_date),
            last_update,
            approval,
            mode: num(&self.mode),
            genre_id: num(&self.genre_id),
            language_id: num(&self.language_id),
            bpm: num(&self.bpm),
            star_rating: num(&self.difficultyrating),
            circle_size: num(&self.diff_size),
            overall_difficulty: num(&self.diff_overall),
            approach_rate: num(&self.diff_approach),
            hp_drain: num(&self.diff_drain),
            hit_length: num(&self.hit_length),
            total_length: num(&self.total_length),
            favourite_count: num(&self.favourite_count),
            playcount: num(&self.playcount),
            passcount: num(&self.passcount),
            max_combo: required(&self.max_combo),
            artist: text(self.artist),
            title: text(self.title),
            creator: text(self.creator),
            version: text(self.version),
            source: text(self.source),
            tags: text(self.tags),
            file_md5: text(self.file_md5),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUser {
    user_id: Option<String>,
    username: Option<String>,
    country: Option<String>,
    count300: Option<String>,
    count100: Option<String>,
    count50: Option<String>,
    playcount: Option<String>,
    ranked_score: Option<String>,
    total_score: Option<String>,
    pp_rank: Option<String>,
    pp_country_rank: Option<String>,
    level: Option<String>,
    pp_raw: Option<String>,
    accuracy: Option<String>,
    count_rank_ss: Option<String>,
    count_rank_ssh: Option<String>,
    count_rank_s: Option<String>,
    count_rank_sh: Option<String>,
    count_rank_a: Option<String>,
}

impl RawUser {
    fn into_snapshot(self) -> Option<ProfileSnapshot> {
        Some(ProfileSnapshot {
            user_id: required(&self.user_id)?,
            count300: num(&self.count300),
            count100: num(&self.count100),
            count50: num(&self.count50),
            playcount: num(&self.playcount),
            ranked_score: num(&self.ranked_score),
            total_score: num(&self.total_score),
            pp_rank: num(&self.pp_rank),
            pp_country_rank: num(&self.pp_country_rank),
            level: num(&self.level),
            pp_raw: num(&self.pp_raw),
            accuracy: num(&self.accuracy),
            count_rank_ss: num(&self.count_rank_ss),
            count_rank_ssh: num(&self.count_rank_ssh),
            count_rank_s: num(&self.count_rank_s),
            count_rank_sh: num(&self.count_rank_sh),
            count_rank_a: num(&self.count_rank_a),
            username: text(self.username),
            country: text(self.country),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlay {
    beatmap_id: Option<String>,
    score: Option<String>,
    maxcombo: Option<String>,
    count300: Option<String>,
    count100: Option<String>,
    count50: Option<String>,
    countmiss: Option<String>,
    countkatu: Option<String>,
    countgeki: Option<String>,
    perfect: Option<String>,
    enabled_mods: Option<String>,
    date: Option<String>,
    rank: Option<String>,
    pp: Option<String>,
}

impl RawPlay {
    fn into_snapshot(self) -> Option<PlaySnapshot> {
        Some(PlaySnapshot {
            chart_id: required(&self.beatmap_id)?,
            score: num(&self.score),
            max_combo: num(&self.maxcombo),
            count300: num(&self.count300),
            count100: num(&self.count100),
            count50: num(&self.count50),
            count_miss: num(&self.countmiss),
            count_katu: num(&self.countkatu),
            count_geki: num(&self.countgeki),
            perfect: self.perfect.as_deref() == Some("1"),
            mods: Mods::from_bits(num(&self.enabled_mods)),
            date: date(&self.date).unwrap_or_default(),
            pp: num(&self.pp),
            rank: text(self.rank),
        })
    }
}
