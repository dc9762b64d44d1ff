//! Title to provider identifier resolution.
//!
//! Resolution runs in two phases. Phase one asks the provider's search API
//! and takes its first hit. Phase two, used for titles phase one could not
//! place, matches against the local [`IdCache`] without touching the API.
//! "No match" is always `None`; provider and cache failures are logged and
//! also yield `None`.

pub mod id_cache;
pub mod similarity;

pub use id_cache::{IdCache, ImportSummary};

use std::sync::Arc;

use cinedex_common::{MediaKind, TmdbId};
use cinedex_parser::clean_file_name;
use tracing::{debug, info, warn};

use crate::metadata::MetadataProvider;

/// Lowercased, trimmed and noise-free form of a title, `None` if nothing is
/// left.
pub fn normalize_query(title: &str) -> Option<String> {
    let lowered = title.trim().to_lowercase();
    let cleaned = clean_file_name(&lowered);
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

pub struct Resolver {
    provider: Arc<dyn MetadataProvider>,
    id_cache: Option<Arc<IdCache>>,
}

impl Resolver {
    /// `id_cache` is optional; without it phase two never matches.
    pub fn new(provider: Arc<dyn MetadataProvider>, id_cache: Option<Arc<IdCache>>) -> Self {
        Self { provider, id_cache }
    }

    /// Resolve `title` through the API (`use_api`) or the local ID cache.
    pub async fn resolve(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u16>,
        use_api: bool,
    ) -> Option<TmdbId> {
        let Some(query) = normalize_query(title) else {
            info!(original = title, "Title is empty after cleaning, skipping");
            return None;
        };

        if use_api {
            self.search(&query, kind, year).await
        } else {
            self.lookup_cached(&query, kind).await
        }
    }

    async fn search(&self, query: &str, kind: MediaKind, year: Option<u16>) -> Option<TmdbId> {
        debug!(title = query, kind = %kind, year = ?year, "Resolving through provider search");
        match self.provider.search(query, kind, year).await {
            Ok(results) => {
                let id = results.first().map(|r| r.id);
                if id.is_none() {
                    debug!(title = query, "Provider search returned no results");
                }
                id
            }
            Err(e) => {
                warn!(
                    title = query,
                    provider = self.provider.name(),
                    error = %format!("{e:#}"),
                    "Provider search failed"
                );
                None
            }
        }
    }

    async fn lookup_cached(&self, query: &str, kind: MediaKind) -> Option<TmdbId> {
        let cache = self.id_cache.as_ref()?;
        debug!(title = query, kind = %kind, "Resolving through ID cache");
        cache.lookup(kind, query).await
    }
}
