//! Catalog writes and reads.
//!
//! A category is always written as a whole: [`replace_category`] deletes the
//! previous contents and inserts the new ones in one transaction, so readers
//! see either the old or the new catalog, never a mix.

use chrono::Utc;
use cinedex_common::{Error, MediaKind, Result, TmdbId};
use rusqlite::{Connection, Row};

use super::{json_from_column, kind_from_column, timestamp_from_column};
use crate::models::{CatalogDocument, CatalogEntry, CatalogHit, EpisodeRow, RecentEpisode};

/// Replace every entry of a category with `documents`.
///
/// # Returns
///
/// * `Ok(usize)` - Number of entries written
/// * `Err(Error)` - If any statement fails; the previous contents are kept
pub fn replace_category(
    conn: &Connection,
    category_id: &str,
    kind: MediaKind,
    documents: &[CatalogDocument],
) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM catalog_episodes WHERE category_id = :category_id",
        rusqlite::named_params! { ":category_id": category_id },
    )
    .map_err(|e| Error::database(e.to_string()))?;
    tx.execute(
        "DELETE FROM catalog_entries WHERE category_id = :category_id",
        rusqlite::named_params! { ":category_id": category_id },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let updated_at = Utc::now().to_rfc3339();
    {
        let mut entry_stmt = tx
            .prepare_cached(
                "INSERT INTO catalog_entries
                    (category_id, kind, tmdb_id, title, original_title, year, document, updated_at)
                 VALUES
                    (:category_id, :kind, :tmdb_id, :title, :original_title, :year, :document, :updated_at)",
            )
            .map_err(|e| Error::database(e.to_string()))?;
        let mut episode_stmt = tx
            .prepare_cached(
                "INSERT INTO catalog_episodes
                    (category_id, series_tmdb_id, season_number, episode_number,
                     file_id, name, path, modified_time)
                 VALUES
                    (:category_id, :series_tmdb_id, :season_number, :episode_number,
                     :file_id, :name, :path, :modified_time)",
            )
            .map_err(|e| Error::database(e.to_string()))?;

        for doc in documents {
            let body = serde_json::to_string(&doc.body)?;
            entry_stmt
                .execute(rusqlite::named_params! {
                    ":category_id": category_id,
                    ":kind": kind.as_str(),
                    ":tmdb_id": doc.tmdb_id.get() as i64,
                    ":title": doc.title,
                    ":original_title": doc.original_title,
                    ":year": doc.year,
                    ":document": body,
                    ":updated_at": updated_at,
                })
                .map_err(|e| Error::database(e.to_string()))?;

            for episode in &doc.episodes {
                episode_stmt
                    .execute(rusqlite::named_params! {
                        ":category_id": category_id,
                        ":series_tmdb_id": doc.tmdb_id.get() as i64,
                        ":season_number": episode.season_number,
                        ":episode_number": episode.episode_number,
                        ":file_id": episode.file_id,
                        ":name": episode.name,
                        ":path": episode.path,
                        ":modified_time": episode.modified_time,
                    })
                    .map_err(|e| Error::database(e.to_string()))?;
            }
        }
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(documents.len())
}

/// Bring the read-side indexes up to date after a write.
///
/// The title search index is rebuilt for every kind; series categories also
/// get the episode modified-time index.
pub fn ensure_indexes(conn: &Connection, kind: MediaKind) -> Result<()> {
    conn.execute("INSERT INTO catalog_fts(catalog_fts) VALUES('rebuild')", [])
        .map_err(|e| Error::database(e.to_string()))?;

    if kind == MediaKind::Series {
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_catalog_episodes_modified
             ON catalog_episodes(modified_time DESC)",
            [],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

/// Turn free text into an FTS5 query: every word quoted and prefix-matched.
fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"*", t.to_lowercase()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Search entry titles (and original titles), best match first.
pub fn search_titles(
    conn: &Connection,
    text: &str,
    category_id: Option<&str>,
    limit: usize,
) -> Result<Vec<CatalogHit>> {
    let Some(query) = fts_query(text) else {
        return Ok(Vec::new());
    };

    let mut stmt = conn
        .prepare(
            "SELECT e.category_id, e.kind, e.tmdb_id, e.title, e.year, catalog_fts.rank
             FROM catalog_fts
             JOIN catalog_entries e ON e.rowid = catalog_fts.rowid
             WHERE catalog_fts MATCH :query
               AND (:category_id IS NULL OR e.category_id = :category_id)
             ORDER BY catalog_fts.rank
             LIMIT :limit",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let hits = stmt
        .query_map(
            rusqlite::named_params! {
                ":query": query,
                ":category_id": category_id,
                ":limit": limit as i64,
            },
            |row| {
                Ok(CatalogHit {
                    category_id: row.get(0)?,
                    kind: kind_from_column(1, row.get(1)?)?,
                    tmdb_id: TmdbId::new(row.get::<_, i64>(2)? as u64),
                    title: row.get(3)?,
                    year: row.get(4)?,
                    rank: row.get(5)?,
                })
            },
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(hits)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        category_id: row.get(0)?,
        kind: kind_from_column(1, row.get(1)?)?,
        tmdb_id: TmdbId::new(row.get::<_, i64>(2)? as u64),
        title: row.get(3)?,
        original_title: row.get(4)?,
        year: row.get(5)?,
        body: json_from_column(6, row.get(6)?)?,
        updated_at: timestamp_from_column(7, row.get(7)?)?,
    })
}

/// All entries of a category ordered by title.
pub fn list_category(conn: &Connection, category_id: &str) -> Result<Vec<CatalogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT category_id, kind, tmdb_id, title, original_title, year, document, updated_at
             FROM catalog_entries WHERE category_id = :category_id
             ORDER BY title COLLATE NOCASE",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let entries = stmt
        .query_map(
            rusqlite::named_params! { ":category_id": category_id },
            entry_from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(entries)
}

/// Get one entry of a category.
pub fn get_entry(
    conn: &Connection,
    category_id: &str,
    tmdb_id: TmdbId,
) -> Result<Option<CatalogEntry>> {
    let result = conn.query_row(
        "SELECT category_id, kind, tmdb_id, title, original_title, year, document, updated_at
         FROM catalog_entries WHERE category_id = :category_id AND tmdb_id = :tmdb_id",
        rusqlite::named_params! {
            ":category_id": category_id,
            ":tmdb_id": tmdb_id.get() as i64,
        },
        entry_from_row,
    );

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Count entries of a category.
pub fn count_entries(conn: &Connection, category_id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM catalog_entries WHERE category_id = :category_id",
        rusqlite::named_params! { ":category_id": category_id },
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| Error::database(e.to_string()))
}

fn episode_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<EpisodeRow> {
    Ok(EpisodeRow {
        season_number: row.get(offset)?,
        episode_number: row.get(offset + 1)?,
        file_id: row.get(offset + 2)?,
        name: row.get(offset + 3)?,
        path: row.get(offset + 4)?,
        modified_time: row.get(offset + 5)?,
    })
}

/// Episode files of one series, by season then episode number.
pub fn list_episodes(
    conn: &Connection,
    category_id: &str,
    series_tmdb_id: TmdbId,
) -> Result<Vec<EpisodeRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT season_number, episode_number, file_id, name, path, modified_time
             FROM catalog_episodes
             WHERE category_id = :category_id AND series_tmdb_id = :series_tmdb_id
             ORDER BY season_number, episode_number, id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let episodes = stmt
        .query_map(
            rusqlite::named_params! {
                ":category_id": category_id,
                ":series_tmdb_id": series_tmdb_id.get() as i64,
            },
            |row| episode_from_row(row, 0),
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(episodes)
}

/// Most recently modified episode files across all series categories.
pub fn recent_episodes(conn: &Connection, limit: usize) -> Result<Vec<RecentEpisode>> {
    let mut stmt = conn
        .prepare(
            "SELECT ep.category_id, ep.series_tmdb_id, e.title,
                    ep.season_number, ep.episode_number, ep.file_id, ep.name, ep.path,
                    ep.modified_time
             FROM catalog_episodes ep
             JOIN catalog_entries e
               ON e.category_id = ep.category_id AND e.tmdb_id = ep.series_tmdb_id
             WHERE ep.modified_time IS NOT NULL
             ORDER BY ep.modified_time DESC
             LIMIT :limit",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let episodes = stmt
        .query_map(rusqlite::named_params! { ":limit": limit as i64 }, |row| {
            Ok(RecentEpisode {
                category_id: row.get(0)?,
                series_tmdb_id: TmdbId::new(row.get::<_, i64>(1)? as u64),
                series_title: row.get(2)?,
                episode: episode_from_row(row, 3)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(episodes)
}
