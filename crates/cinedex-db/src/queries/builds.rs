//! History of category writes.

use cinedex_common::{Error, Result, RunId};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{kind_from_column, timestamp_from_column};
use crate::models::BuildRecord;

/// Record the outcome of writing one category.
pub fn record_build(conn: &Connection, record: &BuildRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO catalog_builds
            (run_id, category_id, kind, candidates, identified, skipped, entities, files, finished_at)
         VALUES
            (:run_id, :category_id, :kind, :candidates, :identified, :skipped, :entities, :files, :finished_at)",
        rusqlite::named_params! {
            ":run_id": record.run_id.to_string(),
            ":category_id": record.category_id,
            ":kind": record.kind.as_str(),
            ":candidates": record.candidates as i64,
            ":identified": record.identified as i64,
            ":skipped": record.skipped as i64,
            ":entities": record.entities as i64,
            ":files": record.files as i64,
            ":finished_at": record.finished_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

fn build_from_row(row: &Row<'_>) -> rusqlite::Result<BuildRecord> {
    let run_id: String = row.get(0)?;
    let run_id = Uuid::parse_str(&run_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(BuildRecord {
        run_id: RunId::from(run_id),
        category_id: row.get(1)?,
        kind: kind_from_column(2, row.get(2)?)?,
        candidates: row.get::<_, i64>(3)? as u64,
        identified: row.get::<_, i64>(4)? as u64,
        skipped: row.get::<_, i64>(5)? as u64,
        entities: row.get::<_, i64>(6)? as u64,
        files: row.get::<_, i64>(7)? as u64,
        finished_at: timestamp_from_column(8, row.get(8)?)?,
    })
}

/// Most recent builds first, optionally for a single category.
pub fn list_builds(
    conn: &Connection,
    category_id: Option<&str>,
    limit: usize,
) -> Result<Vec<BuildRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT run_id, category_id, kind, candidates, identified, skipped, entities, files,
                    finished_at
             FROM catalog_builds
             WHERE :category_id IS NULL OR category_id = :category_id
             ORDER BY finished_at DESC
             LIMIT :limit",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let builds = stmt
        .query_map(
            rusqlite::named_params! {
                ":category_id": category_id,
                ":limit": limit as i64,
            },
            build_from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(builds)
}

/// The latest build of a category.
pub fn last_build(conn: &Connection, category_id: &str) -> Result<Option<BuildRecord>> {
    Ok(list_builds(conn, Some(category_id), 1)?.into_iter().next())
}
