//! Cinedex-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across cinedex:
//!
//! - **Typed IDs**: the provider identifier ([`TmdbId`]) and run identifiers
//! - **Core Types**: media kinds and catalog category descriptors
//! - **Path Utilities**: remote path splitting and file-type detection
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use cinedex_common::{Error, MediaKind, Result, TmdbId};
//! use cinedex_common::paths::is_video_name;
//!
//! let id = TmdbId::new(1726);
//! assert_eq!(id.get(), 1726);
//!
//! let kind = MediaKind::Series;
//! assert_eq!(kind.to_string(), "series");
//!
//! assert!(is_video_name("Iron Man (2008).mkv"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("category"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
