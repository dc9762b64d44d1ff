//! Category build loop.
//!
//! One category at a time: list the remote, harvest candidates, resolve them
//! (API first, then the local ID cache for whatever is left), group by
//! identifier, fetch details once per identifier, assemble and replace the
//! category in the sink. Resolution and fetching fan out through ordered
//! buffered streams; grouping and merging stay on the run loop.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use cinedex_common::{Category, MediaKind, RunId, TmdbId};
use cinedex_db::models::BuildRecord;
use cinedex_parser::parse_release_name;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::assemble::{assemble_movie, assemble_series, IdentifiedGroups};
use crate::catalog::{CatalogEntity, CatalogSink};
use crate::config::Config;
use crate::harvest::{harvest_movies, harvest_series, MovieCandidate, SeriesCandidate};
use crate::metadata::{MediaDetails, MetadataProvider};
use crate::remote::{RemoteEntry, RemoteLister};
use crate::resolve::Resolver;

/// Counts for one category build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Movie files or series folders harvested from the listing
    pub candidates: usize,
    /// Candidates that resolved to an identifier in either phase
    pub identified: usize,
    /// Candidates phase one could not place
    pub deferred: usize,
    pub resolved_in_fallback: usize,
    /// Unparsable, unresolved, or lost to a failed detail fetch
    pub skipped: usize,
    pub entities: usize,
    /// Media files owned by the written entities
    pub files: usize,
}

/// A candidate waiting for an identifier.
struct Pending<T> {
    candidate: T,
    title: String,
    year: Option<u16>,
    /// Remote path of the file or folder the title came from
    path: String,
}

pub struct Pipeline {
    lister: Arc<dyn RemoteLister>,
    provider: Arc<dyn MetadataProvider>,
    resolver: Arc<Resolver>,
    sink: Arc<dyn CatalogSink>,
    concurrency: usize,
    fuzzy_fallback: bool,
    series_max_depth: u32,
}

impl Pipeline {
    pub fn new(
        lister: Arc<dyn RemoteLister>,
        provider: Arc<dyn MetadataProvider>,
        resolver: Arc<Resolver>,
        sink: Arc<dyn CatalogSink>,
    ) -> Self {
        Self {
            lister,
            provider,
            resolver,
            sink,
            concurrency: 4,
            fuzzy_fallback: true,
            series_max_depth: 3,
        }
    }

    /// Take concurrency, fallback and listing depth from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.concurrency = config.pipeline.concurrency.max(1);
        self.fuzzy_fallback = config.pipeline.fuzzy_fallback;
        self.series_max_depth = config.remote.series_max_depth;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fuzzy_fallback(mut self, enabled: bool) -> Self {
        self.fuzzy_fallback = enabled;
        self
    }

    /// Build every category in order. A failed category is logged and does
    /// not stop the others.
    pub async fn run(&self, categories: &[Category]) -> Vec<(String, anyhow::Result<RunReport>)> {
        let mut results = Vec::with_capacity(categories.len());
        for category in categories {
            let result = self.run_category(category).await;
            if let Err(e) = &result {
                error!(
                    category = %category.id,
                    error = %format!("{e:#}"),
                    "Category build failed"
                );
            }
            results.push((category.id.clone(), result));
        }
        results
    }

    /// Rebuild one category. Only listing and sink failures are errors.
    pub async fn run_category(&self, category: &Category) -> anyhow::Result<RunReport> {
        let run_id = RunId::new();
        let started = Instant::now();
        info!(
            category = %category.id,
            kind = %category.kind,
            run_id = %run_id,
            "Building category"
        );

        let max_depth = match category.kind {
            MediaKind::Movie => None,
            MediaKind::Series => Some(self.series_max_depth),
        };
        let entries = self
            .lister
            .list(&category.id, max_depth)
            .await
            .with_context(|| format!("failed to list remote '{}'", category.id))?;
        debug!(category = %category.id, entries = entries.len(), "Remote listed");

        let mut report = RunReport::default();
        let entities = match category.kind {
            MediaKind::Movie => self.build_movies(harvest_movies(&entries), &mut report).await,
            MediaKind::Series => self.build_series(harvest_series(&entries), &mut report).await,
        };
        report.entities = entities.len();
        report.files = entities.iter().map(CatalogEntity::file_count).sum();

        self.sink.replace_category(category, &entities).await?;
        self.sink.ensure_indexes(category.kind).await?;
        self.sink
            .record_build(&BuildRecord {
                run_id,
                category_id: category.id.clone(),
                kind: category.kind,
                candidates: report.candidates as u64,
                identified: report.identified as u64,
                skipped: report.skipped as u64,
                entities: report.entities as u64,
                files: report.files as u64,
                finished_at: Utc::now(),
            })
            .await?;

        info!(
            category = %category.id,
            candidates = report.candidates,
            identified = report.identified,
            deferred = report.deferred,
            resolved_in_fallback = report.resolved_in_fallback,
            skipped = report.skipped,
            entities = report.entities,
            files = report.files,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Category built"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Movies and series
    // ------------------------------------------------------------------

    async fn build_movies(
        &self,
        candidates: Vec<MovieCandidate>,
        report: &mut RunReport,
    ) -> Vec<CatalogEntity> {
        report.candidates = candidates.len();
        let pending = parse_all(candidates, MediaKind::Movie, report, |c| &c.file);

        let groups = self.identify(MediaKind::Movie, pending, report).await;
        let provider = self.provider.as_ref();
        let assembled = stream::iter(groups.into_groups())
            .map(|(id, files)| async move {
                let files: Vec<MovieCandidate> = files.into_iter().map(|(c, _)| c).collect();
                let entity = match fetch_details(provider, id, MediaKind::Movie).await {
                    Some(details) => assemble_movie(&details, &files),
                    None => None,
                };
                (files.len(), entity)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        collect_entities(assembled, report)
    }

    async fn build_series(
        &self,
        candidates: Vec<SeriesCandidate>,
        report: &mut RunReport,
    ) -> Vec<CatalogEntity> {
        report.candidates = candidates.len();
        let pending = parse_all(candidates, MediaKind::Series, report, |c| &c.folder);

        let groups = self.identify(MediaKind::Series, pending, report).await;
        let provider = self.provider.as_ref();
        let assembled = stream::iter(groups.into_groups())
            .map(|(id, folders)| async move {
                let entity = match fetch_details(provider, id, MediaKind::Series).await {
                    Some(details) => assemble_series(&details, &folders, provider).await,
                    None => None,
                };
                (folders.len(), entity)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        collect_entities(assembled, report)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve every pending candidate and group the hits by identifier.
    ///
    /// Phase one runs for all candidates before any phase two lookup, so the
    /// ID cache import never competes with API searches.
    async fn identify<T>(
        &self,
        kind: MediaKind,
        pending: Vec<Pending<T>>,
        report: &mut RunReport,
    ) -> IdentifiedGroups<(T, Option<u16>)> {
        let mut groups = IdentifiedGroups::new();

        let phase_one = self.resolve_all(kind, pending, true).await;
        let mut deferred = Vec::new();
        for (pending, id) in phase_one {
            match id {
                Some(id) => {
                    groups.push(id, (pending.candidate, pending.year));
                    report.identified += 1;
                }
                None => deferred.push(pending),
            }
        }
        report.deferred = deferred.len();

        if !deferred.is_empty() && self.fuzzy_fallback {
            debug!(kind = %kind, deferred = deferred.len(), "Retrying against the ID cache");
            let phase_two = self.resolve_all(kind, deferred, false).await;
            deferred = Vec::new();
            for (pending, id) in phase_two {
                match id {
                    Some(id) => {
                        groups.push(id, (pending.candidate, pending.year));
                        report.identified += 1;
                        report.resolved_in_fallback += 1;
                    }
                    None => deferred.push(pending),
                }
            }
        }

        for pending in deferred {
            info!(
                title = %pending.title,
                year = ?pending.year,
                path = %pending.path,
                "No identifier found, skipping"
            );
            report.skipped += 1;
        }
        groups
    }

    async fn resolve_all<T>(
        &self,
        kind: MediaKind,
        pending: Vec<Pending<T>>,
        use_api: bool,
    ) -> Vec<(Pending<T>, Option<TmdbId>)> {
        let resolver = self.resolver.as_ref();
        stream::iter(pending)
            .map(|pending| async move {
                let id = resolver
                    .resolve(&pending.title, kind, pending.year, use_api)
                    .await;
                (pending, id)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// Parse a title out of each candidate's name; unparsable ones are counted
/// as skipped.
fn parse_all<T>(
    candidates: Vec<T>,
    kind: MediaKind,
    report: &mut RunReport,
    entry: impl Fn(&T) -> &RemoteEntry,
) -> Vec<Pending<T>> {
    let mut pending = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let (parsed, path) = {
            let entry = entry(&candidate);
            (parse_release_name(&entry.name, kind), entry.path.clone())
        };
        match parsed {
            Some(parsed) => pending.push(Pending {
                candidate,
                title: parsed.title,
                year: parsed.year,
                path,
            }),
            None => {
                info!(path = %path, "No title in name, skipping");
                report.skipped += 1;
            }
        }
    }
    pending
}

async fn fetch_details(
    provider: &dyn MetadataProvider,
    id: TmdbId,
    kind: MediaKind,
) -> Option<MediaDetails> {
    match provider.get_details(id, kind).await {
        Ok(details) => Some(details),
        Err(e) => {
            warn!(
                tmdb_id = %id,
                kind = %kind,
                error = %format!("{e:#}"),
                "Failed to fetch details, skipping"
            );
            None
        }
    }
}

/// Keep the assembled entities; groups that produced none count as skipped.
fn collect_entities(
    assembled: Vec<(usize, Option<CatalogEntity>)>,
    report: &mut RunReport,
) -> Vec<CatalogEntity> {
    let mut entities = Vec::with_capacity(assembled.len());
    for (candidates, entity) in assembled {
        match entity {
            Some(entity) => entities.push(entity),
            None => report.skipped += candidates,
        }
    }
    entities
}
