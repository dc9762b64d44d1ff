//! Noise removal for release names before they are searched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Scene-release tokens that never belong to a title.
static SCENE_TOKENS: phf::Set<&'static str> = phf::phf_set! {
    // codecs and bit depth
    "x264", "x265", "h264", "h265", "hevc", "avc", "xvid", "divx", "10bit", "8bit",
    // dynamic range
    "hdr", "hdr10", "hdr10+", "dv", "dovi", "sdr",
    // sources
    "webrip", "web-dl", "webdl", "bluray", "blu-ray", "brrip", "bdrip", "dvdrip",
    "hdtv", "hdrip", "remux", "uhd",
    // streaming services
    "nf", "amzn", "dsnp", "hmax", "atvp", "hulu", "pcok",
    // audio
    "ac3", "eac3", "ddp5.1", "dd5.1", "ddp2.0", "aac2.0", "atmos", "dts", "truehd",
};

static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(?\b(?:240|360|480|720|1080|1440|2160)p\b\)?")
        .expect("resolution regex should compile")
});

/// Bracketed groups that are not a bare year: `(Extended)`, `[1080p HEVC]`.
static NON_YEAR_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\((?:[^()\d][^()]*|[^()]*[^()\d])\)|\[(?:[^\[\]\d][^\[\]]*|[^\[\]]*[^\[\]\d])\]|\{(?:[^{}\d][^{}]*|[^{}]*[^{}\d])\}",
    )
    .expect("bracket regex should compile")
});

static EMPTY_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*\)|\[\s*\]|\{\s*\}").expect("empty group regex should compile")
});

static CONTAINER_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:mp4|mkv|wmv|m4v|mov|avi|flv|webm|flac|mka|m4a|aac|ogg)\b")
        .expect("container regex should compile")
});

static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bseason ?\d+\b").expect("season regex should compile"));

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhttps?://\S+|\bwww\.\S+").expect("url regex should compile")
});

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9]+(?:-[A-Za-z0-9]+)?\+?(?:\.\d)?").expect("token regex should compile")
});

static REPEATED_DOTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").expect("dots regex should compile"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace regex should compile"));

/// Strip release noise from a name.
///
/// Removes resolution tags, non-year bracketed groups, container and audio
/// extensions written as words, `season N` tokens, scene-release tokens and
/// bare URLs. Whitespace is collapsed and trailing `.`, `-`, `_` are trimmed.
///
/// The rules are applied until nothing changes, so the result is stable:
/// `clean_file_name(&clean_file_name(x)) == clean_file_name(x)`.
pub fn clean_file_name(name: &str) -> String {
    let mut current = name.trim().to_string();
    loop {
        let next = clean_once(&current);
        // Every rule only ever removes text, so this terminates.
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(name: &str) -> String {
    let s = URL.replace_all(name, "");
    let s = RESOLUTION.replace_all(&s, "");
    let s = NON_YEAR_GROUP.replace_all(&s, "");
    let s = EMPTY_GROUP.replace_all(&s, "");
    let s = CONTAINER_WORD.replace_all(&s, "");
    let s = SEASON_WORD.replace_all(&s, "");
    let s = TOKEN.replace_all(&s, |caps: &Captures| {
        let token = &caps[0];
        if SCENE_TOKENS.contains(token.to_ascii_lowercase().as_str()) {
            String::new()
        } else {
            token.to_string()
        }
    });
    let s = REPEATED_DOTS.replace_all(&s, ".");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '-' | '_') || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_resolution_and_container() {
        assert_eq!(clean_file_name("Iron Man (2008) 1080p.mkv"), "Iron Man (2008)");
        assert_eq!(clean_file_name("Iron Man (2008) (720p)"), "Iron Man (2008)");
        assert_eq!(clean_file_name("Iron Man (2008) [1080p].mkv"), "Iron Man (2008)");
    }

    #[test]
    fn test_keeps_year_groups_and_drops_others() {
        assert_eq!(
            clean_file_name("Blade Runner (1982) (Final Cut) [Remastered]"),
            "Blade Runner (1982)"
        );
        assert_eq!(clean_file_name("Alien [1979]"), "Alien [1979]");
    }

    #[test]
    fn test_dotted_release_name() {
        assert_eq!(
            clean_file_name("Iron.Man.2008.1080p.WEBRip.DDP5.1.Atmos.x264.mkv"),
            "Iron.Man.2008"
        );
    }

    #[test]
    fn test_removes_season_words_and_urls() {
        assert_eq!(clean_file_name("The Expanse Season 2"), "The Expanse");
        assert_eq!(clean_file_name("Dark www.example.org"), "Dark");
        assert_eq!(clean_file_name("Dark https://example.org/x"), "Dark");
    }

    #[test]
    fn test_scene_tokens_are_case_insensitive() {
        assert_eq!(clean_file_name("Severance HEVC 10bit AMZN"), "Severance");
    }

    #[test]
    fn test_titles_with_hyphens_survive() {
        assert_eq!(clean_file_name("Spider-Man (2002)"), "Spider-Man (2002)");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Iron.Man.2008.1080p.WEBRip.DDP5.1.Atmos.x264.mkv",
            "Blade Runner (1982) (Final Cut) [Remastered]",
            "Show - Season 1 - ",
            "((weird)) name ... ",
            "The Mandalorian",
            "",
        ];
        for input in inputs {
            let once = clean_file_name(input);
            assert_eq!(clean_file_name(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_already_clean_title_is_unchanged() {
        assert_eq!(clean_file_name("the mandalorian"), "the mandalorian");
    }
}
