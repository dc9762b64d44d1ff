//! Database query modules.
//!
//! - id_cache: bulk provider ID export rows and title lookups
//! - import_flags: per-kind completion markers for the bulk import
//! - catalog: full-replace category writes, search index and title search
//! - builds: history of category writes

pub mod builds;
pub mod catalog;
pub mod id_cache;
pub mod import_flags;

use chrono::{DateTime, Utc};
use cinedex_common::MediaKind;
use rusqlite::types::Type;

/// Read a `kind` column back into a [`MediaKind`].
pub(crate) fn kind_from_column(idx: usize, value: String) -> rusqlite::Result<MediaKind> {
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

/// Read an RFC 3339 timestamp column.
pub(crate) fn timestamp_from_column(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON text column.
pub(crate) fn json_from_column(idx: usize, value: String) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
