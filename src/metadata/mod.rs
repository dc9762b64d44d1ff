//! Metadata provider access.
//!
//! # Module layout
//!
//! - [`provider`] -- The [`MetadataProvider`] trait the pipeline depends on.
//! - [`details`] -- Typed provider records (details, seasons, episodes).
//! - [`providers`] -- Concrete implementations (TMDB).

pub mod details;
pub mod provider;
pub mod providers;

pub use details::{
    CastMember, CrewMember, EpisodeDetails, MediaDetails, SearchResult, SeasonDetails,
    SeasonSummary,
};
pub use provider::MetadataProvider;
pub use providers::TmdbProvider;

#[cfg(test)]
pub(crate) mod test_support;
