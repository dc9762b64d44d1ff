//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use cinedex_common::{MediaKind, RunId, TmdbId};
use serde::{Deserialize, Serialize};

/// One title from the provider's bulk ID export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdCacheRow {
    pub tmdb_id: TmdbId,
    pub original_title: String,
    pub popularity: Option<f64>,
}

/// Completion marker of a bulk ID import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportFlag {
    pub kind: MediaKind,
    /// Export date in the provider's `MM_DD_YYYY` file naming.
    pub export_date: String,
    pub row_count: u64,
    pub imported_at: DateTime<Utc>,
}

/// Flattened episode file of a series entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeRow {
    pub season_number: u32,
    pub episode_number: u32,
    pub file_id: String,
    pub name: Option<String>,
    pub path: String,
    pub modified_time: Option<String>,
}

/// A catalog entity ready to be written.
///
/// `body` is the full serialized entity; the other fields are the columns
/// needed for lookup, ordering and search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogDocument {
    pub tmdb_id: TmdbId,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub body: serde_json::Value,
    pub episodes: Vec<EpisodeRow>,
}

/// A catalog entity as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub category_id: String,
    pub kind: MediaKind,
    pub tmdb_id: TmdbId,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub body: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Full-text search hit, best match first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogHit {
    pub category_id: String,
    pub kind: MediaKind,
    pub tmdb_id: TmdbId,
    pub title: String,
    pub year: Option<i32>,
    pub rank: f64,
}

/// Recently modified episode file joined with its series title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentEpisode {
    pub category_id: String,
    pub series_tmdb_id: TmdbId,
    pub series_title: String,
    pub episode: EpisodeRow,
}

/// Outcome of writing one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRecord {
    pub run_id: RunId,
    pub category_id: String,
    pub kind: MediaKind,
    pub candidates: u64,
    pub identified: u64,
    pub skipped: u64,
    pub entities: u64,
    pub files: u64,
    pub finished_at: DateTime<Utc>,
}
