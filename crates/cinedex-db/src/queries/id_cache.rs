//! Bulk provider ID cache queries.
//!
//! Rows keep their insertion order (`id` is autoincrement), which is the
//! tie-break order for both exact and fuzzy lookups.

use cinedex_common::{Error, MediaKind, Result, TmdbId};
use rusqlite::Connection;

use crate::models::IdCacheRow;

/// Normalization applied to cached titles before they are stored.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Insert one batch of rows inside a single transaction.
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows inserted
/// * `Err(Error)` - If any insert fails; the whole batch is rolled back
pub fn insert_batch(conn: &Connection, kind: MediaKind, rows: &[IdCacheRow]) -> Result<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO id_cache (kind, tmdb_id, original_title, normalized_title, popularity)
                 VALUES (:kind, :tmdb_id, :original_title, :normalized_title, :popularity)",
            )
            .map_err(|e| Error::database(e.to_string()))?;

        for row in rows {
            stmt.execute(rusqlite::named_params! {
                ":kind": kind.as_str(),
                ":tmdb_id": row.tmdb_id.get() as i64,
                ":original_title": row.original_title,
                ":normalized_title": normalize_title(&row.original_title),
                ":popularity": row.popularity,
            })
            .map_err(|e| Error::database(e.to_string()))?;
        }
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(rows.len())
}

/// Delete every cached row of a kind.
pub fn clear(conn: &Connection, kind: MediaKind) -> Result<usize> {
    conn.execute(
        "DELETE FROM id_cache WHERE kind = :kind",
        rusqlite::named_params! { ":kind": kind.as_str() },
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Count cached rows of a kind.
pub fn count(conn: &Connection, kind: MediaKind) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM id_cache WHERE kind = :kind",
        rusqlite::named_params! { ":kind": kind.as_str() },
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| Error::database(e.to_string()))
}

/// Exact match on the normalized title, first inserted row wins.
///
/// # Returns
///
/// * `Ok(Some(TmdbId))` - The matching identifier
/// * `Ok(None)` - If no cached title matches
/// * `Err(Error)` - If a database error occurs
pub fn find_exact(conn: &Connection, kind: MediaKind, normalized: &str) -> Result<Option<TmdbId>> {
    let result = conn.query_row(
        "SELECT tmdb_id FROM id_cache
         WHERE kind = :kind AND normalized_title = :title
         ORDER BY id LIMIT 1",
        rusqlite::named_params! {
            ":kind": kind.as_str(),
            ":title": normalized,
        },
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(id) => Ok(Some(TmdbId::new(id as u64))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// All cached `(id, normalized title)` pairs of a kind in insertion order.
pub fn load_titles(conn: &Connection, kind: MediaKind) -> Result<Vec<(TmdbId, String)>> {
    let mut stmt = conn
        .prepare("SELECT tmdb_id, normalized_title FROM id_cache WHERE kind = :kind ORDER BY id")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(rusqlite::named_params! { ":kind": kind.as_str() }, |row| {
            Ok((TmdbId::new(row.get::<_, i64>(0)? as u64), row.get(1)?))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}
