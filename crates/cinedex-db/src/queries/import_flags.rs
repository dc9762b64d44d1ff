//! Per-kind completion markers for the bulk ID import.

use chrono::Utc;
use cinedex_common::{Error, MediaKind, Result};
use rusqlite::Connection;

use super::{kind_from_column, timestamp_from_column};
use crate::models::ImportFlag;

/// Get the import flag of a kind, if the import ever completed.
pub fn get_flag(conn: &Connection, kind: MediaKind) -> Result<Option<ImportFlag>> {
    let result = conn.query_row(
        "SELECT kind, export_date, row_count, imported_at FROM import_flags WHERE kind = :kind",
        rusqlite::named_params! { ":kind": kind.as_str() },
        |row| {
            Ok(ImportFlag {
                kind: kind_from_column(0, row.get(0)?)?,
                export_date: row.get(1)?,
                row_count: row.get::<_, i64>(2)? as u64,
                imported_at: timestamp_from_column(3, row.get(3)?)?,
            })
        },
    );

    match result {
        Ok(flag) => Ok(Some(flag)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Mark the import of a kind as complete, replacing any previous flag.
pub fn set_flag(
    conn: &Connection,
    kind: MediaKind,
    export_date: &str,
    row_count: u64,
) -> Result<ImportFlag> {
    let imported_at = Utc::now();

    conn.execute(
        "INSERT INTO import_flags (kind, export_date, row_count, imported_at)
         VALUES (:kind, :export_date, :row_count, :imported_at)
         ON CONFLICT(kind) DO UPDATE SET
            export_date = excluded.export_date,
            row_count = excluded.row_count,
            imported_at = excluded.imported_at",
        rusqlite::named_params! {
            ":kind": kind.as_str(),
            ":export_date": export_date,
            ":row_count": row_count as i64,
            ":imported_at": imported_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImportFlag {
        kind,
        export_date: export_date.to_string(),
        row_count,
        imported_at,
    })
}

/// Remove the flag of a kind so the next run imports again.
pub fn clear_flag(conn: &Connection, kind: MediaKind) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM import_flags WHERE kind = :kind",
            rusqlite::named_params! { ":kind": kind.as_str() },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};

    #[test]
    fn test_flag_lifecycle() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        assert!(get_flag(&conn, MediaKind::Movie).unwrap().is_none());

        set_flag(&conn, MediaKind::Movie, "10_17_2026", 10).unwrap();
        let flag = set_flag(&conn, MediaKind::Movie, "10_18_2026", 12).unwrap();

        let stored = get_flag(&conn, MediaKind::Movie).unwrap().unwrap();
        assert_eq!(stored.export_date, "10_18_2026");
        assert_eq!(stored.row_count, 12);
        assert_eq!(stored.kind, MediaKind::Movie);
        assert_eq!(
            stored.imported_at.timestamp(),
            flag.imported_at.timestamp()
        );

        assert!(get_flag(&conn, MediaKind::Series).unwrap().is_none());

        assert!(clear_flag(&conn, MediaKind::Movie).unwrap());
        assert!(!clear_flag(&conn, MediaKind::Movie).unwrap());
        assert!(get_flag(&conn, MediaKind::Movie).unwrap().is_none());
    }
}
