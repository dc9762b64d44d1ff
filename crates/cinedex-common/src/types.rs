//! Core type definitions for media kinds and catalog categories.
//!
//! A category is one remote folder tree configured by the operator, holding
//! either movies or series. All enums serialize in lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a category (and every candidate harvested from it) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature films; one entity may own several files.
    #[serde(alias = "movies")]
    Movie,
    /// Episodic content organized as series -> season -> episode.
    #[serde(alias = "tv", alias = "shows")]
    Series,
}

impl MediaKind {
    /// All kinds, in the order the pipeline processes them.
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Series];

    /// Stable lowercase name used for database columns and flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "series" | "tv" | "shows" => Ok(Self::Series),
            other => Err(format!("Invalid media kind: {}", other)),
        }
    }
}

/// A configured catalog category: one remote root holding a single media kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Remote name as known to the listing daemon (also the sink partition key).
    pub id: String,
    /// Whether the tree holds movies or series.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Human readable label.
    pub name: String,
}

impl Category {
    /// Convenience constructor used by tests and the CLI.
    pub fn new(id: impl Into<String>, kind: MediaKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
        }
    }
}
