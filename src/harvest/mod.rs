//! Turning flat remote listings into media candidates.
//!
//! Both harvesters work in two passes over the listing. The first pass
//! indexes every directory by path; the second walks the files. A listing in
//! any order therefore yields the same candidates, and a file whose parent
//! directory never appeared gets a synthesized parent.

mod movies;
mod series;

pub use movies::harvest_movies;
pub use series::harvest_series;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::remote::RemoteEntry;

/// One movie file with its subtitles and containing folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieCandidate {
    pub file: RemoteEntry,
    pub subtitles: Vec<RemoteEntry>,
    /// Containing folder; `None` for files at the category root
    pub parent: Option<RemoteEntry>,
}

/// Episode files harvested for one season number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonBucket {
    pub number: u32,
    /// First folder mapped to this number; `None` for loose files
    pub folder: Option<RemoteEntry>,
    /// Episode files in listing order
    pub episodes: Vec<RemoteEntry>,
}

impl SeasonBucket {
    fn new(number: u32, folder: Option<RemoteEntry>) -> Self {
        Self {
            number,
            folder,
            episodes: Vec::new(),
        }
    }
}

/// A top-level series folder and its seasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesCandidate {
    pub folder: RemoteEntry,
    pub seasons: BTreeMap<u32, SeasonBucket>,
}

impl SeriesCandidate {
    pub fn episode_count(&self) -> usize {
        self.seasons.values().map(|s| s.episodes.len()).sum()
    }
}

/// Directory arena filled by the first pass.
#[derive(Debug, Default)]
pub(crate) struct DirIndex {
    dirs: Vec<RemoteEntry>,
    by_path: HashMap<String, usize>,
}

impl DirIndex {
    pub(crate) fn build(entries: &[RemoteEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries.iter().filter(|e| e.is_dir) {
            index.insert(entry.clone());
        }
        index
    }

    fn insert(&mut self, entry: RemoteEntry) -> usize {
        if let Some(&idx) = self.by_path.get(&entry.path) {
            return idx;
        }
        let idx = self.dirs.len();
        self.by_path.insert(entry.path.clone(), idx);
        self.dirs.push(entry);
        idx
    }

    /// Directory at `path`, synthesized if the listing never contained it.
    pub(crate) fn get_or_synthesize(&mut self, path: &str) -> usize {
        match self.by_path.get(path) {
            Some(&idx) => idx,
            None => {
                tracing::debug!(path = path, "Synthesizing unlisted directory");
                self.insert(RemoteEntry::synthesized_dir(path))
            }
        }
    }

    pub(crate) fn get(&self, idx: usize) -> &RemoteEntry {
        &self.dirs[idx]
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Directories in first-seen order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &RemoteEntry)> {
        self.dirs.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::{dir, file};

    #[test]
    fn dir_index_deduplicates_and_synthesizes() {
        let entries = vec![dir("A"), file("A/x.mkv"), dir("A"), dir("B")];
        let mut index = DirIndex::build(&entries);

        assert_eq!(index.iter().count(), 2);
        assert_eq!(index.lookup("A"), Some(0));

        let c = index.get_or_synthesize("C/D");
        assert_eq!(index.get(c).name, "D");
        assert_eq!(index.get_or_synthesize("C/D"), c);
        assert_eq!(index.iter().count(), 3);
    }
}
