//! Remote path utilities and file-type detection by extension.
//!
//! Remote listings use `/` as separator regardless of the host platform, so
//! everything here works on plain `&str` instead of [`std::path::Path`].

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg", "m2ts",
];

/// List of supported subtitle file extensions.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa"];

/// Extension of the marker files that exclude a folder from the movie harvest.
const TEXT_MARKER_EXTENSION: &str = "txt";

/// Lowercased extension of a file name, without the dot.
///
/// Dotfiles such as `.hidden` have no extension.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File name without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => name,
    }
}

/// Check if a file name has a video extension.
///
/// # Examples
///
/// ```
/// use cinedex_common::paths::is_video_name;
///
/// assert!(is_video_name("movie.mkv"));
/// assert!(is_video_name("Movie.MP4"));
/// assert!(!is_video_name("movie.srt"));
/// ```
pub fn is_video_name(name: &str) -> bool {
    extension(name)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a MIME type describes video content.
pub fn is_video_mime(mime: &str) -> bool {
    mime.to_ascii_lowercase().starts_with("video/")
}

/// Check if a file name has a subtitle extension.
pub fn is_subtitle_name(name: &str) -> bool {
    extension(name)
        .map(|ext| SUBTITLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a file name is a `.txt` marker.
pub fn is_text_marker(name: &str) -> bool {
    extension(name).as_deref() == Some(TEXT_MARKER_EXTENSION)
}

/// Parent path of a remote path; the category root is the empty string.
///
/// # Examples
///
/// ```
/// use cinedex_common::paths::parent_path;
///
/// assert_eq!(parent_path("Show/Season 1/e01.mkv"), "Show/Season 1");
/// assert_eq!(parent_path("Show"), "");
/// ```
pub fn parent_path(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

/// Number of `/`-separated segments below the category root, minus one.
///
/// Top-level entries have depth 0.
pub fn depth(path: &str) -> usize {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.matches('/').count()
}

/// Base name used to pair a subtitle with its video.
///
/// Strips the extension, then a trailing language suffix of 2-4 letters
/// (`movie.en.srt`, `movie.eng.srt`, `movie.pt-br.srt` style suffixes reduce
/// to `movie`). Comparison is case-insensitive, so the result is lowercased.
pub fn subtitle_base_name(name: &str) -> String {
    let stem = file_stem(name);
    let base = match stem.rsplit_once('.') {
        Some((head, suffix))
            if !head.is_empty()
                && (2..=5).contains(&suffix.len())
                && suffix.chars().filter(|c| c.is_ascii_alphabetic()).count() >= 2
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
                && suffix.chars().filter(|c| c.is_ascii_alphabetic()).count() <= 4 =>
        {
            head
        }
        _ => stem,
    };
    base.to_lowercase()
}

/// Base name of a video, normalized the same way subtitles are compared.
pub fn video_base_name(name: &str) -> String {
    file_stem(name).to_lowercase()
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of subtitle file extensions.
#[must_use]
pub fn subtitle_extensions() -> &'static [&'static str] {
    SUBTITLE_EXTENSIONS
}
