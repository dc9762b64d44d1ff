//! Season and episode number extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Season assigned to folders (and files) that carry no recognizable number.
pub const DEFAULT_SEASON: u32 = 1;

/// Season/episode numbers found in an episode file name.
///
/// Either field may be missing; the assembler fills the gaps from the
/// containing season folder and the file's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeNumbers {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

// S01E02, s1 e2
static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])s ?(\d{1,3}) ?e ?(\d{1,4})")
        .expect("season/episode regex should compile")
});

// E02S01
static EPISODE_SEASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])e ?(\d{1,4}) ?s ?(\d{1,3})")
        .expect("episode/season regex should compile")
});

// E02, Ep 2, Episode.2
static EPISODE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:episode|ep|e)[\s._-]?(\d{1,4})(?:\D|$)")
        .expect("episode regex should compile")
});

static SEASON_FOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:season|s)?\s*[-._]?\s*(\d{1,3})\s*$")
        .expect("season folder regex should compile")
});

static SEASON_FOLDER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:season|s)[\s._-]*(\d{1,3})(?:\D|$)")
        .expect("season folder prefix regex should compile")
});

/// Extract season and episode numbers from an episode file name.
///
/// Tried in order: `S{season}E{episode}`, `E{episode}S{season}`, then a bare
/// `E{episode}` (also `Ep`/`Episode`). Matching is case-insensitive and the
/// marker letter must not be glued to a preceding word.
///
/// # Examples
///
/// ```
/// use cinedex_parser::parse_episode;
///
/// let n = parse_episode("Dark.S02E05.1080p.mkv");
/// assert_eq!((n.season, n.episode), (Some(2), Some(5)));
///
/// let n = parse_episode("Episode 7.mkv");
/// assert_eq!((n.season, n.episode), (None, Some(7)));
///
/// assert_eq!(parse_episode("Pilot.mkv").episode, None);
/// ```
pub fn parse_episode(name: &str) -> EpisodeNumbers {
    if let Some(caps) = SEASON_EPISODE.captures(name) {
        return EpisodeNumbers {
            season: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            episode: caps.get(2).and_then(|m| m.as_str().parse().ok()),
        };
    }
    if let Some(caps) = EPISODE_SEASON.captures(name) {
        return EpisodeNumbers {
            season: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            episode: caps.get(1).and_then(|m| m.as_str().parse().ok()),
        };
    }
    if let Some(caps) = EPISODE_ONLY.captures(name) {
        return EpisodeNumbers {
            season: None,
            episode: caps.get(1).and_then(|m| m.as_str().parse().ok()),
        };
    }
    EpisodeNumbers::default()
}

/// Season number of a season folder.
///
/// Accepts `Season 2`, `S02`, `s-2`, `Season 02 (2019)` or a bare `2`.
/// Anything else maps to [`DEFAULT_SEASON`]. Numbers are numeric, so leading
/// zeros vanish while `0` (specials) is kept.
pub fn parse_season_folder(name: &str) -> u32 {
    SEASON_FOLDER
        .captures(name)
        .or_else(|| SEASON_FOLDER_PREFIX.captures(name))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_SEASON)
}
