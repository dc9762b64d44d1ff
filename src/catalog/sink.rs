//! Catalog persistence.
//!
//! A [`CatalogSink`] receives one category at a time. Writes are full
//! replacements; there is no incremental update.

use anyhow::Context;
use async_trait::async_trait;
use cinedex_common::{Category, MediaKind};
use cinedex_db::models::{BuildRecord, CatalogDocument, CatalogHit, EpisodeRow};
use cinedex_db::pool::{get_conn, DbPool};
use cinedex_db::queries::{builds, catalog};
use tracing::{debug, info};

use super::model::CatalogEntity;

#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Replace the whole contents of `category` with `entities`, atomically.
    async fn replace_category(
        &self,
        category: &Category,
        entities: &[CatalogEntity],
    ) -> anyhow::Result<usize>;

    /// Refresh title search and, for series, the episode recency index.
    async fn ensure_indexes(&self, kind: MediaKind) -> anyhow::Result<()>;

    /// Remember how a category build went.
    async fn record_build(&self, record: &BuildRecord) -> anyhow::Result<()>;
}

/// Flatten an entity into the row shape the database stores.
pub fn to_document(entity: &CatalogEntity) -> anyhow::Result<CatalogDocument> {
    let episodes = match entity {
        CatalogEntity::Movie(_) => Vec::new(),
        CatalogEntity::Series(series) => series
            .seasons
            .iter()
            .flat_map(|season| {
                season.episodes.iter().map(|episode| EpisodeRow {
                    season_number: season.season_number,
                    episode_number: episode.episode_number,
                    file_id: episode.file.id.clone(),
                    name: episode.name.clone(),
                    path: episode.file.path.clone(),
                    modified_time: episode.file.modified_time.clone(),
                })
            })
            .collect(),
    };

    Ok(CatalogDocument {
        tmdb_id: entity.tmdb_id(),
        title: entity.title().to_string(),
        original_title: entity.original_title().map(str::to_string),
        year: entity.year(),
        body: serde_json::to_value(entity)
            .with_context(|| format!("failed to serialize entity {}", entity.tmdb_id()))?,
        episodes,
    })
}

/// [`CatalogSink`] over the SQLite pool.
#[derive(Clone)]
pub struct SqliteSink {
    pool: DbPool,
}

impl SqliteSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Full-text title search over everything written so far.
    pub async fn search_titles(
        &self,
        text: &str,
        category_id: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<CatalogHit>> {
        let pool = self.pool.clone();
        let text = text.to_string();
        let category_id = category_id.map(str::to_string);
        let hits = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = get_conn(&pool)?;
            Ok(catalog::search_titles(
                &conn,
                &text,
                category_id.as_deref(),
                limit,
            )?)
        })
        .await??;
        Ok(hits)
    }
}

#[async_trait]
impl CatalogSink for SqliteSink {
    async fn replace_category(
        &self,
        category: &Category,
        entities: &[CatalogEntity],
    ) -> anyhow::Result<usize> {
        let documents = entities
            .iter()
            .map(to_document)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let pool = self.pool.clone();
        let category_id = category.id.clone();
        let kind = category.kind;
        let written = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let conn = get_conn(&pool)?;
            Ok(catalog::replace_category(&conn, &category_id, kind, &documents)?)
        })
        .await?
        .with_context(|| format!("failed to write category '{}'", category.id))?;

        info!(category = %category.id, entries = written, "Category written");
        Ok(written)
    }

    async fn ensure_indexes(&self, kind: MediaKind) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let conn = get_conn(&pool)?;
            catalog::ensure_indexes(&conn, kind)?;
            Ok(())
        })
        .await??;
        debug!(kind = %kind, "Catalog indexes refreshed");
        Ok(())
    }

    async fn record_build(&self, record: &BuildRecord) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let conn = get_conn(&pool)?;
            builds::record_build(&conn, &record)?;
            Ok(())
        })
        .await??;
        Ok(())
    }
}
