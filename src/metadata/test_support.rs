//! In-process [`MetadataProvider`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use cinedex_common::{MediaKind, TmdbId};
use parking_lot::Mutex;

use super::details::{EpisodeDetails, MediaDetails, SearchResult};
use super::provider::MetadataProvider;

#[derive(Default)]
pub struct StubProvider {
    /// `(kind, query)` -> search results
    searches: Mutex<HashMap<(MediaKind, String), Vec<SearchResult>>>,
    failing_searches: Mutex<Vec<String>>,
    details: Mutex<HashMap<TmdbId, MediaDetails>>,
    episodes: Mutex<HashMap<(TmdbId, u32, u32), EpisodeDetails>>,
    exports: Mutex<HashMap<MediaKind, Vec<u8>>>,
    /// Every search as `(query, year)`, in call order
    searched: Mutex<Vec<(String, Option<u16>)>>,
    pub search_calls: AtomicUsize,
    pub episode_calls: AtomicUsize,
    export_calls: AtomicUsize,
}

impl StubProvider {
    pub fn add_search(&self, kind: MediaKind, query: &str, id: u64) {
        self.searches
            .lock()
            .entry((kind, query.to_string()))
            .or_default()
            .push(SearchResult {
                id: TmdbId::new(id),
                title: query.to_string(),
                year: None,
                overview: None,
                poster_path: None,
            });
    }

    pub fn fail_search(&self, query: &str) {
        self.failing_searches.lock().push(query.to_string());
    }

    pub fn add_details(&self, details: MediaDetails) {
        self.details.lock().insert(details.tmdb_id(), details);
    }

    pub fn add_episode(&self, id: u64, episode: EpisodeDetails) {
        let season = episode.season_number.unwrap_or(1);
        self.episodes
            .lock()
            .insert((TmdbId::new(id), season, episode.episode_number), episode);
    }

    pub fn set_export(&self, kind: MediaKind, gz: Vec<u8>) {
        self.exports.lock().insert(kind, gz);
    }

    pub fn searched(&self) -> Vec<(String, Option<u16>)> {
        self.searched.lock().clone()
    }

    pub fn export_downloads(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.searched.lock().push((title.to_string(), year));
        if self.failing_searches.lock().iter().any(|q| q == title) {
            anyhow::bail!("search for '{title}' failed");
        }
        Ok(self
            .searches
            .lock()
            .get(&(kind, title.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_details(&self, id: TmdbId, _kind: MediaKind) -> anyhow::Result<MediaDetails> {
        self.details
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no details for {id}"))
    }

    async fn get_episode_details(
        &self,
        id: TmdbId,
        season: u32,
        episode: u32,
    ) -> anyhow::Result<Option<EpisodeDetails>> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.episodes.lock().get(&(id, season, episode)).cloned())
    }

    async fn fetch_id_export(&self, kind: MediaKind, _date: NaiveDate) -> anyhow::Result<Vec<u8>> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.exports
            .lock()
            .get(&kind)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("export unavailable"))
    }
}
