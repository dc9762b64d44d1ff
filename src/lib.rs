//! Cinedex - media catalog builder
//!
//! Reconciles remote file listings against TMDB metadata and writes a
//! normalized, searchable catalog. The library crate exposes every stage of
//! the build for integration testing:
//!
//! - [`remote`]: listing a remote through rclone
//! - [`harvest`]: turning a listing into movie and series candidates
//! - [`resolve`]: title to TMDB id, by API search then by the local ID cache
//! - [`metadata`]: the provider trait and its TMDB client
//! - [`assemble`]: candidates plus details into catalog entities
//! - [`catalog`]: entity model and the SQLite sink
//! - [`pipeline`]: the per-category run loop
//!
//! ```no_run
//! use cinedex::config::TmdbConfig;
//! use cinedex::metadata::providers::TmdbProvider;
//!
//! let provider = TmdbProvider::new(&TmdbConfig {
//!     api_key: "key".into(),
//!     ..TmdbConfig::default()
//! });
//! ```

pub mod assemble;
pub mod catalog;
pub mod config;
pub mod harvest;
pub mod metadata;
pub mod pipeline;
pub mod remote;
pub mod resolve;
