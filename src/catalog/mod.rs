//! The catalog: canonical entities and where they are written.

pub mod model;
pub mod sink;

pub use model::{CatalogEntity, Crew, Episode, FileRef, Movie, Season, Series};
pub use sink::{to_document, CatalogSink, SqliteSink};
