//! # cinedex-parser
//!
//! Extraction of catalog-relevant facts from media file and folder names.
//!
//! The parser is deliberately forgiving: it never fails on a malformed name.
//! A name that matches none of the structured patterns falls through to a
//! catch-all where the whole (cleaned) name becomes the title.
//!
//! ## Quick Start
//!
//! ```
//! use cinedex_common::MediaKind;
//! use cinedex_parser::{clean_file_name, parse_episode, parse_filename, parse_season_folder};
//!
//! let parsed = parse_filename("The.Mandalorian.2019.1080p.WEBRip", MediaKind::Series).unwrap();
//! assert_eq!(parsed.title, "The Mandalorian");
//! assert_eq!(parsed.year, Some(2019));
//!
//! assert_eq!(clean_file_name("Iron Man (2008) [1080p].mkv"), "Iron Man (2008)");
//!
//! let numbers = parse_episode("The.Mandalorian.S01E03.mkv");
//! assert_eq!((numbers.season, numbers.episode), (Some(1), Some(3)));
//!
//! assert_eq!(parse_season_folder("Season 02"), 2);
//! ```

mod clean;
mod episode;
mod title;

pub use clean::clean_file_name;
pub use episode::{parse_episode, parse_season_folder, EpisodeNumbers, DEFAULT_SEASON};
pub use title::{parse_filename, parse_release_name, ParsedName};
