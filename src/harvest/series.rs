use std::collections::{BTreeMap, HashMap};

use cinedex_common::paths;
use cinedex_parser::{parse_season_folder, DEFAULT_SEASON};
use tracing::debug;

use super::{DirIndex, SeasonBucket, SeriesCandidate};
use crate::remote::RemoteEntry;

/// Build one candidate per top-level folder.
///
/// Depth is relative to the category root: depth 0 directories are series,
/// depth 1 directories are seasons and depth 1 videos go straight to season
/// 1, depth 2 videos are episodes of their season folder. Anything deeper is
/// ignored. Season folders resolving to the same number share one bucket.
pub fn harvest_series(entries: &[RemoteEntry]) -> Vec<SeriesCandidate> {
    let mut dirs = DirIndex::build(entries);
    let mut builder = SeriesBuilder::default();

    // Pass one: series folders, then season folders.
    let listed: Vec<(usize, RemoteEntry)> =
        dirs.iter().map(|(idx, entry)| (idx, entry.clone())).collect();
    for (idx, entry) in listed.iter().filter(|(_, e)| e.depth() == 0) {
        builder.series_for(*idx, entry);
    }
    for (_, entry) in listed.iter().filter(|(_, e)| e.depth() == 1) {
        builder.season_for_dir(&mut dirs, entry);
    }

    // Pass two: files.
    for entry in entries.iter().filter(|e| !e.is_dir) {
        match entry.depth() {
            1 if entry.is_video() => {
                let series = builder.series_at(&mut dirs, entry.parent_path());
                builder.candidates[series]
                    .seasons
                    .entry(DEFAULT_SEASON)
                    .or_insert_with(|| SeasonBucket::new(DEFAULT_SEASON, None))
                    .episodes
                    .push(entry.clone());
            }
            2 if entry.is_video() => {
                let season_path = entry.parent_path();
                let season_dir = dirs.get_or_synthesize(season_path);
                let season_entry = dirs.get(season_dir).clone();
                let (series, number) = builder.season_for_dir(&mut dirs, &season_entry);
                if let Some(bucket) = builder.candidates[series].seasons.get_mut(&number) {
                    bucket.episodes.push(entry.clone());
                }
            }
            0 | 1 | 2 => {}
            depth => debug!(path = %entry.path, depth = depth, "Ignoring deeply nested file"),
        }
    }

    for candidate in &builder.candidates {
        debug!(
            series = %candidate.folder.name,
            seasons = candidate.seasons.len(),
            episodes = candidate.episode_count(),
            "Harvested series folder"
        );
    }

    builder.candidates
}

#[derive(Default)]
struct SeriesBuilder {
    candidates: Vec<SeriesCandidate>,
    /// Series directory arena index -> candidate index
    by_dir: HashMap<usize, usize>,
    /// Season directory path -> (candidate index, season number)
    seasons_by_path: HashMap<String, (usize, u32)>,
}

impl SeriesBuilder {
    fn series_for(&mut self, dir: usize, entry: &RemoteEntry) -> usize {
        if let Some(&idx) = self.by_dir.get(&dir) {
            return idx;
        }
        let idx = self.candidates.len();
        self.candidates.push(SeriesCandidate {
            folder: entry.clone(),
            seasons: BTreeMap::new(),
        });
        self.by_dir.insert(dir, idx);
        idx
    }

    fn series_at(&mut self, dirs: &mut DirIndex, path: &str) -> usize {
        let dir = dirs.get_or_synthesize(path);
        let entry = dirs.get(dir).clone();
        self.series_for(dir, &entry)
    }

    fn season_for_dir(&mut self, dirs: &mut DirIndex, entry: &RemoteEntry) -> (usize, u32) {
        if let Some(&known) = self.seasons_by_path.get(&entry.path) {
            return known;
        }

        let series = self.series_at(dirs, paths::parent_path(&entry.path));
        let number = parse_season_folder(&entry.name);
        let seasons = &mut self.candidates[series].seasons;
        match seasons.get_mut(&number) {
            Some(bucket) => {
                debug!(
                    folder = %entry.path,
                    season = number,
                    "Merging season folder into existing bucket"
                );
                if bucket.folder.is_none() {
                    bucket.folder = Some(entry.clone());
                }
            }
            None => {
                seasons.insert(number, SeasonBucket::new(number, Some(entry.clone())));
            }
        }

        self.seasons_by_path
            .insert(entry.path.clone(), (series, number));
        (series, number)
    }
}
