//! Trait definition for metadata providers.
//!
//! The pipeline only talks to TMDB through [`MetadataProvider`], so tests can
//! substitute an in-process stub for the HTTP client.

use async_trait::async_trait;
use chrono::NaiveDate;
use cinedex_common::{MediaKind, TmdbId};

use super::details::{EpisodeDetails, MediaDetails, SearchResult};

/// Async trait that metadata providers implement.
///
/// Errors are transport or decode failures; "nothing found" is always an
/// empty result or `None`.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has credentials configured.
    fn is_available(&self) -> bool;

    /// Title search, first page only, in provider relevance order.
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchResult>>;

    /// Full details. For series every season body is merged in.
    async fn get_details(&self, id: TmdbId, kind: MediaKind) -> anyhow::Result<MediaDetails>;

    /// A single episode; `None` when the provider does not know it.
    async fn get_episode_details(
        &self,
        id: TmdbId,
        season: u32,
        episode: u32,
    ) -> anyhow::Result<Option<EpisodeDetails>>;

    /// Raw (gzip-compressed) nightly ID export for `kind` published on `date`.
    async fn fetch_id_export(&self, kind: MediaKind, date: NaiveDate) -> anyhow::Result<Vec<u8>>;
}
