//! Turning resolved candidates plus provider details into catalog entities.
//!
//! Every identifier yields exactly one entity. Candidates are first grouped
//! by identifier with [`IdentifiedGroups`]; each group is then assembled in
//! one go, so several movie files become one movie with parallel file arrays
//! and several series folders become one series with merged seasons.

pub mod crew;
pub mod movie;
pub mod series;

pub use movie::{append_file, build_movie};
pub use series::{build_series, merge_series};

use std::collections::HashMap;

use cinedex_common::TmdbId;

use crate::catalog::model::CatalogEntity;
use crate::harvest::{MovieCandidate, SeriesCandidate};
use crate::metadata::{MediaDetails, MetadataProvider};

/// Items grouped by identifier, groups in first-seen order.
#[derive(Debug)]
pub struct IdentifiedGroups<T> {
    groups: Vec<(TmdbId, Vec<T>)>,
    index: HashMap<TmdbId, usize>,
}

impl<T> Default for IdentifiedGroups<T> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> IdentifiedGroups<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` under `id`. Returns `true` when `id` was not seen before.
    pub fn push(&mut self, id: TmdbId, item: T) -> bool {
        match self.index.get(&id) {
            Some(&i) => {
                self.groups[i].1.push(item);
                false
            }
            None => {
                self.index.insert(id, self.groups.len());
                self.groups.push((id, vec![item]));
                true
            }
        }
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<(TmdbId, Vec<T>)> {
        self.groups
    }
}

/// One movie from every file that resolved to it.
pub fn assemble_movie(details: &MediaDetails, files: &[MovieCandidate]) -> Option<CatalogEntity> {
    let (first, rest) = files.split_first()?;
    let mut movie = build_movie(first, details);
    for candidate in rest {
        append_file(&mut movie, candidate);
    }
    Some(CatalogEntity::Movie(movie))
}

/// One series from every folder that resolved to it. Each folder comes with
/// the year parsed from its name.
pub async fn assemble_series(
    details: &MediaDetails,
    folders: &[(SeriesCandidate, Option<u16>)],
    provider: &dyn MetadataProvider,
) -> Option<CatalogEntity> {
    let fallback_year = details.year().and_then(|y| u16::try_from(y).ok());

    let mut assembled = None;
    for (candidate, year) in folders {
        let series = build_series(candidate, details, year.or(fallback_year), provider).await;
        match assembled.as_mut() {
            None => assembled = Some(series),
            Some(existing) => merge_series(existing, series),
        }
    }
    assembled.map(CatalogEntity::Series)
}
