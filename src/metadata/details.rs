//! Provider records as the catalog consumes them.
//!
//! Only the fields the assembler reads are typed; everything is optional or
//! defaulted because TMDB omits fields freely. Image paths stay as provider
//! path fragments (`/abc.jpg`), clients prepend their own base URL.

use std::collections::BTreeMap;

use cinedex_common::TmdbId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full details of a movie or series, including appended sub-resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub id: u64,

    /// Movie title
    pub title: Option<String>,
    /// Series title
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,

    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub homepage: Option<String>,
    pub popularity: Option<f64>,
    pub revenue: Option<i64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,

    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,

    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,

    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,

    #[serde(default)]
    pub genres: Vec<Value>,
    #[serde(default)]
    pub production_companies: Vec<Value>,
    pub belongs_to_collection: Option<Value>,

    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub external_ids: ExternalIds,
    #[serde(default)]
    pub videos: Videos,

    /// Series creators
    #[serde(default)]
    pub created_by: Vec<CrewMember>,
    /// Series season list as returned by the details call
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
    pub last_episode_to_air: Option<EpisodeDetails>,
    pub next_episode_to_air: Option<EpisodeDetails>,

    /// Full season bodies fetched through `season/N` appends
    #[serde(skip)]
    pub season_details: BTreeMap<u32, SeasonDetails>,
}

impl MediaDetails {
    pub fn tmdb_id(&self) -> TmdbId {
        TmdbId::new(self.id)
    }

    /// Localized title, whichever field the media kind uses.
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }

    pub fn display_original_title(&self) -> Option<&str> {
        self.original_title
            .as_deref()
            .or(self.original_name.as_deref())
    }

    /// Release date for movies, first air date for series.
    pub fn premiere_date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }

    pub fn year(&self) -> Option<i32> {
        self.premiere_date()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }

    /// Season summary for `number`, if the provider knows the season.
    pub fn season_summary(&self, number: u32) -> Option<&SeasonSummary> {
        self.seasons.iter().find(|s| s.season_number == number)
    }

    /// Episode from the merged season bodies.
    pub fn episode(&self, season: u32, episode: u32) -> Option<&EpisodeDetails> {
        self.season_details
            .get(&season)?
            .episodes
            .iter()
            .find(|e| e.episode_number == episode)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    /// Absent on `created_by` entries
    pub job: Option<String>,
    pub department: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub logos: Vec<ImageRef>,
    #[serde(default)]
    pub posters: Vec<ImageRef>,
    #[serde(default)]
    pub backdrops: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub file_path: String,
    pub iso_639_1: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
    pub wikidata_id: Option<String>,
    pub facebook_id: Option<String>,
    pub instagram_id: Option<String>,
    pub twitter_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub official: Option<bool>,
}

/// Entry of a series' `seasons` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub id: Option<u64>,
    pub season_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub episode_count: Option<u32>,
    pub poster_path: Option<String>,
}

/// A `season/N` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetails {
    pub id: Option<u64>,
    pub season_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub episodes: Vec<EpisodeDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    pub id: Option<u64>,
    pub episode_number: u32,
    pub season_number: Option<u32>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<u32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: TmdbId,
    pub title: String,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_series_body_deserializes() {
        let details: MediaDetails = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "created_by": [{ "id": 9813, "name": "David Benioff" }],
            "seasons": [{ "season_number": 0 }, { "season_number": 1, "episode_count": 10 }],
            "images": { "logos": [{ "file_path": "/logo.png" }] }
        }))
        .unwrap();

        assert_eq!(details.tmdb_id(), TmdbId::new(1399));
        assert_eq!(details.display_title(), Some("Game of Thrones"));
        assert_eq!(details.year(), Some(2011));
        assert_eq!(details.seasons.len(), 2);
        assert!(details.season_summary(1).is_some());
        assert!(details.season_summary(2).is_none());
        assert_eq!(details.images.logos[0].file_path, "/logo.png");
        assert!(details.credits.cast.is_empty());
    }

    #[test]
    fn test_episode_lookup_uses_episode_number() {
        let mut details = MediaDetails::default();
        details.season_details.insert(
            2,
            serde_json::from_value(json!({
                "season_number": 2,
                "episodes": [
                    { "episode_number": 3, "name": "Three" },
                    { "episode_number": 1, "name": "One" }
                ]
            }))
            .unwrap(),
        );

        assert_eq!(
            details.episode(2, 1).and_then(|e| e.name.as_deref()),
            Some("One")
        );
        assert!(details.episode(2, 2).is_none());
        assert!(details.episode(1, 1).is_none());
    }

    #[test]
    fn test_empty_release_date_has_no_year() {
        let details = MediaDetails {
            release_date: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(details.premiere_date(), None);
        assert_eq!(details.year(), None);
    }
}
