//! Title and year extraction.
//!
//! Patterns are tried in order and the first one producing a non-empty title
//! wins:
//!
//! 1. `(2019) The Mandalorian` - leading bracketed year, title up to the first `.`
//! 2. `The Mandalorian (2019)` - trailing bracketed year
//! 3. `The.Mandalorian.2019.1080p` - dotted release name
//! 4. anything else - the whole name is the title

use cinedex_common::MediaKind;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::clean::clean_file_name;

/// Result of parsing a file or folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedName {
    /// Normalized title; never empty.
    pub title: String,
    /// Release year, when the name carries one.
    pub year: Option<u16>,
    /// Trailing extension including the dot (movies only).
    pub extension: Option<String>,
}

static LEADING_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\(\[\{](\d{4})[\)\]\}]\s([^.]+)").expect("leading year regex should compile")
});

static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*)\s[\(\[\{](\d{4})[\)\]\}]").expect("trailing year regex should compile")
});

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[A-Za-z0-9]{2,4}$").expect("extension regex should compile"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Parse a title and optional year out of a name.
///
/// For [`MediaKind::Movie`] a trailing extension (`.` followed by 2-4
/// alphanumerics) is captured separately and never becomes part of the title.
/// Returns `None` only when even the catch-all yields an empty title.
///
/// # Examples
///
/// ```
/// use cinedex_common::MediaKind;
/// use cinedex_parser::parse_filename;
///
/// let movie = parse_filename("Iron Man (2008).mkv", MediaKind::Movie).unwrap();
/// assert_eq!(movie.title, "Iron Man");
/// assert_eq!(movie.year, Some(2008));
/// assert_eq!(movie.extension.as_deref(), Some(".mkv"));
///
/// assert!(parse_filename("   ", MediaKind::Series).is_none());
/// ```
pub fn parse_filename(name: &str, kind: MediaKind) -> Option<ParsedName> {
    let extension = movie_extension(name, kind);
    let body = strip_extension(name, extension.as_deref());
    title_and_year(name, body, extension)
}

/// Clean a raw release name, then parse it.
///
/// This is the order the catalog uses: resolution tags and scene tokens are
/// gone before the year patterns run, so `Inception.1080p.BluRay.mkv` has no
/// year. For movies the extension is taken from the raw name, since cleaning
/// drops container words.
///
/// ```
/// use cinedex_common::MediaKind;
/// use cinedex_parser::parse_release_name;
///
/// let parsed = parse_release_name("Inception.1080p.BluRay.x264.mkv", MediaKind::Movie).unwrap();
/// assert_eq!(parsed.title, "Inception");
/// assert_eq!(parsed.year, None);
/// assert_eq!(parsed.extension.as_deref(), Some(".mkv"));
/// ```
pub fn parse_release_name(name: &str, kind: MediaKind) -> Option<ParsedName> {
    let extension = movie_extension(name, kind);
    let cleaned = clean_file_name(strip_extension(name, extension.as_deref()));
    title_and_year(&cleaned, &cleaned, extension)
}

fn movie_extension(name: &str, kind: MediaKind) -> Option<String> {
    match kind {
        MediaKind::Movie => EXTENSION.find(name).map(|m| m.as_str().to_string()),
        MediaKind::Series => None,
    }
}

fn strip_extension<'a>(name: &'a str, extension: Option<&str>) -> &'a str {
    match extension {
        Some(ext) => &name[..name.len() - ext.len()],
        None => name,
    }
}

fn title_and_year(name: &str, body: &str, extension: Option<String>) -> Option<ParsedName> {
    let structured = [leading_year(name), trailing_year(name), dotted_year(name)];
    for (raw_title, year) in structured.into_iter().flatten() {
        if let Some(title) = normalize_title(raw_title) {
            return Some(ParsedName {
                title,
                year: Some(year),
                extension,
            });
        }
    }

    normalize_title(body).map(|title| ParsedName {
        title,
        year: None,
        extension,
    })
}

fn leading_year(name: &str) -> Option<(&str, u16)> {
    let caps = LEADING_YEAR.captures(name)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    Some((caps.get(2)?.as_str(), year))
}

fn trailing_year(name: &str) -> Option<(&str, u16)> {
    let caps = TRAILING_YEAR.captures(name)?;
    let year = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str(), year))
}

/// `Title.YYYY...`: the title is everything before the first `.` that is
/// followed by exactly four digits.
fn dotted_year(name: &str) -> Option<(&str, u16)> {
    let bytes = name.as_bytes();
    for (pos, _) in name.match_indices('.') {
        if pos == 0 {
            continue;
        }
        let digits = bytes.get(pos + 1..pos + 5)?;
        if !digits.iter().all(u8::is_ascii_digit) {
            continue;
        }
        if bytes.get(pos + 5).is_some_and(u8::is_ascii_digit) {
            continue;
        }
        let year = name[pos + 1..pos + 5].parse().ok()?;
        return Some((&name[..pos], year));
    }
    None
}

fn normalize_title(raw: &str) -> Option<String> {
    let dotless = raw.trim().replace('.', " ");
    let title = WHITESPACE.replace_all(dotless.trim(), " ").into_owned();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, kind: MediaKind) -> (String, Option<u16>) {
        let parsed = parse_filename(name, kind).unwrap();
        (parsed.title, parsed.year)
    }

    #[test]
    fn test_dotted_series_name() {
        assert_eq!(
            parse("The.Mandalorian.2019.1080p.WEBRip", MediaKind::Series),
            ("The Mandalorian".to_string(), Some(2019))
        );
    }

    #[test]
    fn test_trailing_year_movie_with_extension() {
        let parsed = parse_filename("Iron Man (2008).mkv", MediaKind::Movie).unwrap();
        assert_eq!(parsed.title, "Iron Man");
        assert_eq!(parsed.year, Some(2008));
        assert_eq!(parsed.extension.as_deref(), Some(".mkv"));
    }

    #[test]
    fn test_leading_year_stops_at_first_dot() {
        assert_eq!(
            parse("(2008) Iron Man.mkv", MediaKind::Movie),
            ("Iron Man".to_string(), Some(2008))
        );
        assert_eq!(
            parse("[2019] The Mandalorian", MediaKind::Series),
            ("The Mandalorian".to_string(), Some(2019))
        );
    }

    #[test]
    fn test_bracket_styles() {
        assert_eq!(
            parse("Dune {2021}", MediaKind::Series),
            ("Dune".to_string(), Some(2021))
        );
        assert_eq!(
            parse("Dune [2021].mp4", MediaKind::Movie),
            ("Dune".to_string(), Some(2021))
        );
    }

    #[test]
    fn test_dotted_movie_keeps_extension() {
        let parsed = parse_filename("Iron.Man.2008.x264.mkv", MediaKind::Movie).unwrap();
        assert_eq!(parsed.title, "Iron Man");
        assert_eq!(parsed.year, Some(2008));
        assert_eq!(parsed.extension.as_deref(), Some(".mkv"));
    }

    #[test]
    fn test_dotted_year_requires_exactly_four_digits() {
        // ".12345" is not a year, the next candidate is.
        assert_eq!(
            parse("Show.12345.2020.WEB", MediaKind::Series),
            ("Show 12345".to_string(), Some(2020))
        );
    }

    #[test]
    fn test_dotted_year_needs_a_title_prefix() {
        assert_eq!(parse("1917.mkv", MediaKind::Movie), ("1917".to_string(), None));
    }

    #[test]
    fn test_catch_all() {
        let parsed = parse_filename("The Mandalorian", MediaKind::Series).unwrap();
        assert_eq!(parsed.title, "The Mandalorian");
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.extension, None);

        let parsed = parse_filename("Heat.mkv", MediaKind::Movie).unwrap();
        assert_eq!(parsed.title, "Heat");
        assert_eq!(parsed.extension.as_deref(), Some(".mkv"));
    }

    #[test]
    fn test_series_never_strips_extension() {
        assert_eq!(
            parse("Mr.Robot", MediaKind::Series),
            ("Mr Robot".to_string(), None)
        );
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(
            parse("  The   Expanse  ", MediaKind::Series),
            ("The Expanse".to_string(), None)
        );
    }

    #[test]
    fn test_release_name_resolution_is_not_a_year() {
        assert_eq!(
            parse_filename("Inception.1080p.BluRay.x264.mkv", MediaKind::Movie)
                .unwrap()
                .year,
            Some(1080)
        );

        let parsed =
            parse_release_name("Inception.1080p.BluRay.x264.mkv", MediaKind::Movie).unwrap();
        assert_eq!(parsed.title, "Inception");
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.extension.as_deref(), Some(".mkv"));

        let parsed = parse_release_name("Breaking.Bad.2160p.WEB-DL", MediaKind::Series).unwrap();
        assert_eq!((parsed.title.as_str(), parsed.year), ("Breaking Bad", None));
    }

    #[test]
    fn test_release_name_keeps_real_years() {
        let parsed = parse_release_name("Heat (1995) [1080p].mkv", MediaKind::Movie).unwrap();
        assert_eq!((parsed.title.as_str(), parsed.year), ("Heat", Some(1995)));

        let parsed =
            parse_release_name("Iron.Man.2008.1080p.WEBRip.mkv", MediaKind::Movie).unwrap();
        assert_eq!((parsed.title.as_str(), parsed.year), ("Iron Man", Some(2008)));
    }

    #[test]
    fn test_release_name_extension_comes_from_raw_name() {
        // The cleaned stem ends in ".US", which must not be read as an extension.
        let parsed = parse_release_name("The.Office.US.720p.mkv", MediaKind::Movie).unwrap();
        assert_eq!(parsed.title, "The Office US");
        assert_eq!(parsed.extension.as_deref(), Some(".mkv"));

        assert!(parse_release_name("1080p.x264.mkv", MediaKind::Movie).is_none());
    }

    #[test]
    fn test_empty_title_falls_through() {
        // Leading-year pattern captures only whitespace, so the catch-all wins.
        assert_eq!(
            parse("(2019) .", MediaKind::Series),
            ("(2019)".to_string(), None)
        );
        assert!(parse_filename("", MediaKind::Movie).is_none());
        assert!(parse_filename(" . ", MediaKind::Series).is_none());
    }
}
