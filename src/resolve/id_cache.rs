//! Local copy of the provider's nightly ID export.
//!
//! The export is imported once per kind and then serves the fuzzy phase of
//! title resolution. Imports are gated twice: a persisted flag survives
//! restarts, and a per-kind async mutex makes concurrent callers wait for the
//! one import in flight instead of starting their own.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use cinedex_common::{MediaKind, TmdbId};
use cinedex_db::models::{IdCacheRow, ImportFlag};
use cinedex_db::pool::{get_conn, DbPool};
use cinedex_db::queries::{id_cache, import_flags};
use flate2::read::GzDecoder;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::similarity::best_fuzzy_match;
use crate::metadata::MetadataProvider;

/// Rows per insert transaction.
pub const IMPORT_BATCH_SIZE: usize = 5000;

type TitleList = Arc<Vec<(TmdbId, String)>>;

/// One line of the export. Movies carry `original_title`, series
/// `original_name`.
#[derive(Debug, Deserialize)]
struct ExportLine {
    id: u64,
    #[serde(default, alias = "original_name")]
    original_title: String,
    popularity: Option<f64>,
}

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub flag: ImportFlag,
    /// Lines that could not be decoded
    pub skipped_lines: u64,
}

/// Bulk ID cache shared by every resolver of a run.
pub struct IdCache {
    pool: DbPool,
    provider: Arc<dyn MetadataProvider>,
    import_locks: HashMap<MediaKind, tokio::sync::Mutex<()>>,
    disabled: Mutex<HashSet<MediaKind>>,
    titles: RwLock<HashMap<MediaKind, TitleList>>,
}

impl IdCache {
    pub fn new(pool: DbPool, provider: Arc<dyn MetadataProvider>) -> Self {
        let import_locks = MediaKind::ALL
            .iter()
            .map(|kind| (*kind, tokio::sync::Mutex::new(())))
            .collect();

        Self {
            pool,
            provider,
            import_locks,
            disabled: Mutex::new(HashSet::new()),
            titles: RwLock::new(HashMap::new()),
        }
    }

    /// Whether fuzzy lookups are still possible for `kind`.
    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        !self.disabled.lock().contains(&kind)
    }

    /// Import the export for `kind` unless a completed import is recorded.
    ///
    /// Returns the completion flag, either the existing one or the one just
    /// written.
    pub async fn ensure_imported(&self, kind: MediaKind) -> anyhow::Result<ImportFlag> {
        let _guard = self.lock_for(kind).lock().await;

        let pool = self.pool.clone();
        let existing = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = get_conn(&pool)?;
            Ok(import_flags::get_flag(&conn, kind)?)
        })
        .await??;

        if let Some(flag) = existing {
            debug!(kind = %kind, export_date = %flag.export_date, "ID cache already imported");
            return Ok(flag);
        }

        let summary = self.import(kind, export_date(Utc::now())).await?;
        Ok(summary.flag)
    }

    /// Drop any previous import of `kind` and import again.
    pub async fn reimport(&self, kind: MediaKind) -> anyhow::Result<ImportSummary> {
        let _guard = self.lock_for(kind).lock().await;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let conn = get_conn(&pool)?;
            import_flags::clear_flag(&conn, kind)?;
            Ok(())
        })
        .await??;

        self.titles.write().remove(&kind);
        self.disabled.lock().remove(&kind);
        self.import(kind, export_date(Utc::now())).await
    }

    /// Download, decode and store one export. Callers hold the kind's lock.
    async fn import(&self, kind: MediaKind, date: NaiveDate) -> anyhow::Result<ImportSummary> {
        info!(kind = %kind, date = %date, "Importing provider ID export");

        let compressed = self
            .provider
            .fetch_id_export(kind, date)
            .await
            .with_context(|| format!("failed to download {kind} ID export"))?;

        let pool = self.pool.clone();
        let export_date = date.format("%m_%d_%Y").to_string();
        let summary = tokio::task::spawn_blocking(move || {
            store_export(&pool, kind, &compressed, &export_date)
        })
        .await??;

        info!(
            kind = %kind,
            rows = summary.flag.row_count,
            skipped_lines = summary.skipped_lines,
            "Provider ID export imported"
        );
        Ok(summary)
    }

    /// Local lookup of an already normalized title.
    ///
    /// An exact match on the cached original title wins; otherwise the
    /// closest title by gestalt ratio. Imports on first use. A failed import
    /// disables lookups for `kind` for the lifetime of this cache.
    pub async fn lookup(&self, kind: MediaKind, normalized: &str) -> Option<TmdbId> {
        if !self.is_enabled(kind) {
            return None;
        }

        if let Err(e) = self.ensure_imported(kind).await {
            self.disable(kind, &e);
            return None;
        }

        match self.lookup_imported(kind, normalized).await {
            Ok(found) => found,
            Err(e) => {
                warn!(kind = %kind, title = normalized, error = %e, "ID cache lookup failed");
                None
            }
        }
    }

    async fn lookup_imported(
        &self,
        kind: MediaKind,
        normalized: &str,
    ) -> anyhow::Result<Option<TmdbId>> {
        let pool = self.pool.clone();
        let query = normalized.to_string();
        let exact = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = get_conn(&pool)?;
            Ok(id_cache::find_exact(&conn, kind, &query)?)
        })
        .await??;

        if let Some(id) = exact {
            debug!(title = normalized, tmdb_id = %id, "ID cache exact match");
            return Ok(Some(id));
        }

        let titles = self.titles(kind).await?;
        let query = normalized.to_string();
        let fuzzy = tokio::task::spawn_blocking(move || {
            best_fuzzy_match(&query, titles.iter().map(|(id, t)| (*id, t.as_str())))
        })
        .await?;

        match fuzzy {
            Some((id, ratio)) => {
                debug!(title = normalized, tmdb_id = %id, ratio = ratio, "ID cache fuzzy match");
                Ok(Some(id))
            }
            None => {
                debug!(title = normalized, "No ID cache match");
                Ok(None)
            }
        }
    }

    /// Cached titles of `kind`, loaded from the database on first use.
    async fn titles(&self, kind: MediaKind) -> anyhow::Result<TitleList> {
        let cached = self.titles.read().get(&kind).cloned();
        if let Some(titles) = cached {
            return Ok(titles);
        }

        let pool = self.pool.clone();
        let loaded = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = get_conn(&pool)?;
            Ok(id_cache::load_titles(&conn, kind)?)
        })
        .await??;

        debug!(kind = %kind, titles = loaded.len(), "Loaded ID cache titles");
        let loaded = Arc::new(loaded);
        self.titles.write().insert(kind, Arc::clone(&loaded));
        Ok(loaded)
    }

    fn disable(&self, kind: MediaKind, error: &anyhow::Error) {
        if self.disabled.lock().insert(kind) {
            warn!(
                kind = %kind,
                error = %format!("{error:#}"),
                "ID cache import failed, fuzzy matching disabled for this kind"
            );
        }
    }

    fn lock_for(&self, kind: MediaKind) -> &tokio::sync::Mutex<()> {
        &self.import_locks[&kind]
    }
}

/// The export published "yesterday" in UTC; today's may not exist yet.
pub fn export_date(now: DateTime<Utc>) -> NaiveDate {
    (now - Duration::days(1)).date_naive()
}

/// Replace the cached rows of `kind` with the decoded export and set the flag.
fn store_export(
    pool: &DbPool,
    kind: MediaKind,
    compressed: &[u8],
    export_date: &str,
) -> anyhow::Result<ImportSummary> {
    let conn = get_conn(pool)?;
    let removed = id_cache::clear(&conn, kind)?;
    if removed > 0 {
        debug!(kind = %kind, rows = removed, "Removed rows of an incomplete import");
    }

    let reader = BufReader::new(GzDecoder::new(compressed));
    let mut batch = Vec::with_capacity(IMPORT_BATCH_SIZE);
    let mut rows = 0u64;
    let mut skipped_lines = 0u64;

    for line in reader.split(b'\n') {
        let line = line.context("failed to decompress ID export")?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<ExportLine>(&line) {
            Ok(entry) => batch.push(IdCacheRow {
                tmdb_id: TmdbId::new(entry.id),
                original_title: entry.original_title,
                popularity: entry.popularity,
            }),
            Err(_) => skipped_lines += 1,
        }

        if batch.len() == IMPORT_BATCH_SIZE {
            rows += id_cache::insert_batch(&conn, kind, &batch)? as u64;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        rows += id_cache::insert_batch(&conn, kind, &batch)? as u64;
    }

    if skipped_lines > 0 {
        warn!(kind = %kind, skipped_lines = skipped_lines, "Skipped undecodable export lines");
    }

    let flag = import_flags::set_flag(&conn, kind, export_date, rows)?;
    Ok(ImportSummary {
        flag,
        skipped_lines,
    })
}
