use std::collections::HashMap;

use cinedex_common::paths::{file_stem, subtitle_base_name, video_base_name};
use tracing::debug;

use super::{DirIndex, MovieCandidate};
use crate::remote::RemoteEntry;

/// Files sharing one parent directory.
struct Group<'a> {
    parent: Option<usize>,
    files: Vec<&'a RemoteEntry>,
}

/// Build one candidate per video file.
///
/// Files are grouped by parent folder. A group holding a `.txt` marker is
/// excluded entirely, and a group without videos yields nothing. Subtitles
/// attach to the sibling video with the same base name (language suffixes
/// such as `.en` are ignored); subtitles no video claims are dropped.
pub fn harvest_movies(entries: &[RemoteEntry]) -> Vec<MovieCandidate> {
    let mut dirs = DirIndex::build(entries);

    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut group_by_parent: HashMap<&str, usize> = HashMap::new();

    for entry in entries.iter().filter(|e| !e.is_dir) {
        let parent_path = entry.parent_path();
        let idx = *group_by_parent.entry(parent_path).or_insert_with(|| {
            let parent = if parent_path.is_empty() {
                None
            } else {
                Some(dirs.get_or_synthesize(parent_path))
            };
            groups.push(Group {
                parent,
                files: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].files.push(entry);
    }

    let mut candidates = Vec::new();
    for group in groups {
        let parent = group.parent.map(|idx| dirs.get(idx).clone());
        let folder = parent.as_ref().map(|p| p.path.as_str()).unwrap_or("");

        if group.files.iter().any(|f| f.is_text_marker()) {
            debug!(folder = folder, "Skipping folder with .txt marker");
            continue;
        }

        let videos: Vec<&RemoteEntry> = group
            .files
            .iter()
            .copied()
            .filter(|f| f.is_video())
            .collect();
        if videos.is_empty() {
            continue;
        }

        let first = candidates.len();
        let mut by_base: HashMap<String, usize> = HashMap::new();
        for video in &videos {
            by_base
                .entry(video_base_name(&video.name))
                .or_insert(candidates.len());
            candidates.push(MovieCandidate {
                file: (*video).clone(),
                subtitles: Vec::new(),
                parent: parent.clone(),
            });
        }

        for subtitle in group.files.iter().filter(|f| f.is_subtitle()) {
            let exact = file_stem(&subtitle.name).to_lowercase();
            let claimed = by_base
                .get(&exact)
                .or_else(|| by_base.get(&subtitle_base_name(&subtitle.name)));
            match claimed {
                Some(&idx) => candidates[idx].subtitles.push((*subtitle).clone()),
                None => debug!(
                    folder = folder,
                    subtitle = %subtitle.name,
                    "Dropping subtitle without a matching video"
                ),
            }
        }

        debug!(
            folder = folder,
            videos = candidates.len() - first,
            "Harvested movie folder"
        );
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::{dir, file};

    fn names(candidates: &[MovieCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.file.name.as_str()).collect()
    }

    #[test]
    fn one_candidate_per_video() {
        let entries = vec![
            dir("Iron Man (2008)"),
            file("Iron Man (2008)/Iron Man (2008) 1080p.mkv"),
            file("Iron Man (2008)/Iron Man (2008) 2160p.mkv"),
            file("Iron Man (2008)/poster.jpg"),
        ];

        let candidates = harvest_movies(&entries);
        assert_eq!(
            names(&candidates),
            vec!["Iron Man (2008) 1080p.mkv", "Iron Man (2008) 2160p.mkv"]
        );
        assert_eq!(
            candidates[0].parent.as_ref().map(|p| p.name.as_str()),
            Some("Iron Man (2008)")
        );
    }

    #[test]
    fn txt_marker_excludes_folder() {
        let entries = vec![
            dir("Extras"),
            file("Extras/Making Of.mkv"),
            file("Extras/ignore.txt"),
            dir("Heat (1995)"),
            file("Heat (1995)/Heat (1995).mkv"),
        ];

        let candidates = harvest_movies(&entries);
        assert_eq!(names(&candidates), vec!["Heat (1995).mkv"]);
    }

    #[test]
    fn txt_only_folder_yields_nothing() {
        let entries = vec![dir("Notes"), file("Notes/readme.txt")];
        assert!(harvest_movies(&entries).is_empty());
    }

    #[test]
    fn folder_without_video_yields_nothing() {
        let entries = vec![dir("Subs"), file("Subs/Heat (1995).srt")];
        assert!(harvest_movies(&entries).is_empty());
    }

    #[test]
    fn subtitles_attach_by_base_name_in_any_order() {
        let entries = vec![
            file("Heat (1995)/Heat (1995).en.srt"),
            file("Heat (1995)/Ronin (1998).srt"),
            file("Heat (1995)/Heat (1995).mkv"),
            file("Heat (1995)/Heat (1995).vtt"),
            file("Heat (1995)/Orphan.srt"),
            file("Heat (1995)/Ronin (1998).mp4"),
            dir("Heat (1995)"),
        ];

        let candidates = harvest_movies(&entries);
        assert_eq!(candidates.len(), 2);

        let heat: Vec<&str> = candidates[0].subtitles.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(heat, vec!["Heat (1995).en.srt", "Heat (1995).vtt"]);

        let ronin: Vec<&str> = candidates[1].subtitles.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(ronin, vec!["Ronin (1998).srt"]);
    }

    #[test]
    fn root_files_have_no_parent() {
        let candidates = harvest_movies(&[file("Arrival.mkv")]);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].parent.is_none());
    }

    #[test]
    fn unlisted_parent_is_synthesized() {
        let candidates = harvest_movies(&[file("Collections/Alien (1979)/Alien.mkv")]);
        let parent = candidates[0].parent.as_ref().unwrap();
        assert_eq!(parent.name, "Alien (1979)");
        assert_eq!(parent.path, "Collections/Alien (1979)");
    }

    #[test]
    fn listing_order_does_not_change_candidates() {
        let mut entries = vec![
            dir("A"),
            file("A/a.mkv"),
            file("A/a.srt"),
            dir("B"),
            file("B/b.mkv"),
        ];
        let forward = harvest_movies(&entries);
        entries.reverse();
        let mut backward = harvest_movies(&entries);
        backward.sort_by(|x, y| x.file.path.cmp(&y.file.path));

        assert_eq!(forward, backward);
    }
}
