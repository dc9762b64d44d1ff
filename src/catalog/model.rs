//! Canonical catalog entities.
//!
//! Entities are built once by the assembler and never mutated after the run
//! loop hands them to the sink. Image fields are provider path fragments.

use cinedex_common::TmdbId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::details::{CastMember, CrewMember, EpisodeDetails, ExternalIds, Video};
use crate::remote::RemoteEntry;

/// A remote file or folder as referenced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub name: String,
    pub path: String,
    pub modified_time: Option<String>,
    pub size: Option<i64>,
}

impl From<&RemoteEntry> for FileRef {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            path: entry.path.clone(),
            modified_time: entry.modified_time.clone(),
            size: entry.size,
        }
    }
}

/// Curated crew, grouped by job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Crew {
    pub creator: Vec<CrewMember>,
    pub director: Vec<CrewMember>,
    pub screenplay: Vec<CrewMember>,
    pub author: Vec<CrewMember>,
    pub writer: Vec<CrewMember>,
}

/// A movie and every file that resolved to it.
///
/// The file vectors are parallel: index `i` of each describes the same file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub file_ids: Vec<String>,
    pub file_names: Vec<String>,
    pub paths: Vec<String>,
    /// Containing folder path, `None` for files at the category root
    pub parents: Vec<Option<String>>,
    pub modified_times: Vec<Option<String>>,
    pub sizes: Vec<Option<i64>>,
    pub subtitles: Vec<FileRef>,
    pub number_of_files: u32,

    pub tmdb_id: TmdbId,
    pub title: String,
    pub original_title: Option<String>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<u32>,
    pub popularity: Option<f64>,
    pub revenue: Option<i64>,
    pub rating: Option<f64>,
    pub vote_count: Option<u64>,
    pub genres: Vec<Value>,
    pub studios: Vec<Value>,
    pub collection: Option<Value>,
    pub cast: Vec<CastMember>,
    pub crew: Crew,
    pub external_ids: ExternalIds,
    pub homepage: Option<String>,
    pub logo_path: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub videos: Vec<Video>,
}

/// A series with the seasons that have files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub folder: FileRef,
    /// Total size of every episode file
    pub size: i64,

    pub tmdb_id: TmdbId,
    pub title: String,
    pub original_title: Option<String>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<u32>,
    pub popularity: Option<f64>,
    pub rating: Option<f64>,
    pub vote_count: Option<u64>,
    pub genres: Vec<Value>,
    pub studios: Vec<Value>,
    pub cast: Vec<CastMember>,
    pub crew: Crew,
    pub external_ids: ExternalIds,
    pub total_episodes: Option<u32>,
    pub total_seasons: Option<u32>,
    pub last_episode_to_air: Option<EpisodeDetails>,
    pub next_episode_to_air: Option<EpisodeDetails>,
    pub homepage: Option<String>,
    pub logo_path: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub videos: Vec<Video>,
    /// Unique by `season_number`, ascending
    pub seasons: Vec<Season>,
}

impl Series {
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season folder; `None` when the files sit directly in the series folder
    pub folder: Option<FileRef>,
    pub size: i64,

    pub tmdb_id: Option<u64>,
    pub season_number: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub air_date: Option<String>,
    /// Episodes the provider knows for this season
    pub episode_count: Option<u32>,
    pub poster_path: Option<String>,
    /// Unique by `episode_number`, ascending
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub file: FileRef,

    pub episode_number: u32,
    pub season_number: u32,
    pub tmdb_id: Option<u64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<u32>,
    pub still_path: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<u64>,
    /// No provider metadata was found; only the file is real
    pub placeholder: bool,
}

/// One assembled catalog entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogEntity {
    Movie(Movie),
    Series(Series),
}

impl CatalogEntity {
    pub fn tmdb_id(&self) -> TmdbId {
        match self {
            Self::Movie(m) => m.tmdb_id,
            Self::Series(s) => s.tmdb_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Movie(m) => &m.title,
            Self::Series(s) => &s.title,
        }
    }

    pub fn original_title(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.original_title.as_deref(),
            Self::Series(s) => s.original_title.as_deref(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Movie(m) => m.year,
            Self::Series(s) => s.year,
        }
    }

    /// Media files owned by the entity.
    pub fn file_count(&self) -> usize {
        match self {
            Self::Movie(m) => m.number_of_files as usize,
            Self::Series(s) => s.episode_count(),
        }
    }
}
