//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] against the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting (4 requests / second by default) via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Series seasons fetched 20 at a time through `append_to_response`.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use cinedex_common::{MediaKind, TmdbId};
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::metadata::details::{EpisodeDetails, MediaDetails, SearchResult, SeasonDetails};
use crate::metadata::provider::MetadataProvider;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const DETAIL_APPENDS: &str = "credits,images,external_ids,videos";
const IMAGE_LANGUAGES: &str = "en,null";
/// TMDB caps `append_to_response` at 20 sub-requests.
const SEASONS_PER_REQUEST: usize = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport failures. URLs are always stored with the API key redacted.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("TMDB returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchHit>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchHit {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use cinedex::config::TmdbConfig;
/// use cinedex::metadata::providers::TmdbProvider;
///
/// let config = TmdbConfig {
///     api_key: "your-api-key".into(),
///     ..TmdbConfig::default()
/// };
/// let provider = TmdbProvider::new(&config);
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    include_adult: bool,
    base_url: String,
    export_base_url: String,
    rate_limiter: DirectRateLimiter,
}

impl TmdbProvider {
    pub fn new(config: &TmdbConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            client,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            include_adult: config.include_adult,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            export_base_url: config.export_base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        }
    }

    /// Rate-limited GET with 429 retries. The status is not checked.
    async fn send(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| TmdbError::Transport {
                    url: redact(url),
                    source: e.without_url(),
                })?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return Ok(resp);
        }
    }

    async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let resp = self.send(url).await?;
        Ok(check_status(resp, url)?)
    }

    async fn get_object(&self, url: &str) -> anyhow::Result<Map<String, Value>> {
        self.get(url)
            .await?
            .json()
            .await
            .with_context(|| format!("failed to parse TMDB response: {}", redact(url)))
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url, self.api_key, self.language
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    fn export_url(&self, kind: MediaKind, date: NaiveDate) -> String {
        format!(
            "{}/{}_ids_{}.json.gz",
            self.export_base_url,
            export_name(kind),
            date.format("%m_%d_%Y")
        )
    }

    /// Fetch `season/N` bodies in chunks and merge them into `details`.
    ///
    /// A failed chunk leaves its seasons out; episode lookups for them fall
    /// back to the per-episode endpoint.
    async fn merge_seasons(&self, details: &mut MediaDetails) {
        let numbers: Vec<u32> = details.seasons.iter().map(|s| s.season_number).collect();
        let path = format!("/tv/{}", details.id);

        for chunk in numbers.chunks(SEASONS_PER_REQUEST) {
            let appends = chunk
                .iter()
                .map(|n| format!("season/{n}"))
                .collect::<Vec<_>>()
                .join(",");
            let url = self.url(&path, &[("append_to_response", appends.as_str())]);
            debug!(tmdb_id = details.id, seasons = %appends, "TMDB get seasons");

            let body = match self.get_object(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        tmdb_id = details.id,
                        seasons = %appends,
                        error = %format!("{e:#}"),
                        "TMDB season chunk failed, continuing without it"
                    );
                    continue;
                }
            };
            for (number, season) in take_season_bodies(body) {
                details.season_details.insert(number, season);
            }
        }
    }
}

fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, TmdbError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(TmdbError::Status {
            status,
            url: redact(url),
        })
    }
}

fn media_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Series => "tv",
    }
}

fn export_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Series => "tv_series",
    }
}

fn year_param(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "primary_release_year",
        MediaKind::Series => "first_air_date_year",
    }
}

/// Pull every `season/N` key out of a details body.
fn take_season_bodies(body: Map<String, Value>) -> Vec<(u32, SeasonDetails)> {
    body.into_iter()
        .filter_map(|(key, value)| {
            let number = key.strip_prefix("season/")?.parse::<u32>().ok()?;
            match serde_json::from_value::<SeasonDetails>(value) {
                Ok(season) => Some((number, season)),
                Err(e) => {
                    warn!(season = number, error = %e, "Skipping undecodable season body");
                    None
                }
            }
        })
        .collect()
}

/// Hide the API key when URLs end up in error messages.
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[end..])
        }
        None => url.to_string(),
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let adult = self.include_adult.to_string();
        let mut params = vec![("query", title), ("include_adult", adult.as_str()), ("page", "1")];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push((year_param(kind), y.as_str()));
        }

        let url = self.url(&format!("/search/{}", media_path(kind)), &params);
        debug!(title = title, kind = %kind, year = ?year, "TMDB search");

        let body: TmdbSearchResponse = self
            .get(&url)
            .await?
            .json()
            .await
            .context("failed to parse TMDB search response")?;

        Ok(body
            .results
            .into_iter()
            .map(|r| {
                let year = parse_year(&r.release_date).or_else(|| parse_year(&r.first_air_date));
                SearchResult {
                    id: TmdbId::new(r.id),
                    title: r.title.or(r.name).unwrap_or_default(),
                    year,
                    overview: r.overview,
                    poster_path: r.poster_path,
                }
            })
            .collect())
    }

    async fn get_details(&self, id: TmdbId, kind: MediaKind) -> anyhow::Result<MediaDetails> {
        let url = self.url(
            &format!("/{}/{id}", media_path(kind)),
            &[
                ("append_to_response", DETAIL_APPENDS),
                ("include_image_language", IMAGE_LANGUAGES),
            ],
        );
        debug!(tmdb_id = %id, kind = %kind, "TMDB get details");

        let body = self.get_object(&url).await?;
        let mut details: MediaDetails = serde_json::from_value(Value::Object(body))
            .with_context(|| format!("failed to parse TMDB {kind} details for {id}"))?;

        if kind == MediaKind::Series {
            self.merge_seasons(&mut details).await;
        }
        Ok(details)
    }

    async fn get_episode_details(
        &self,
        id: TmdbId,
        season: u32,
        episode: u32,
    ) -> anyhow::Result<Option<EpisodeDetails>> {
        let url = self.url(&format!("/tv/{id}/season/{season}/episode/{episode}"), &[]);
        debug!(tmdb_id = %id, season = season, episode = episode, "TMDB get episode");

        let resp = self.send(&url).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let details = check_status(resp, &url)?
            .json()
            .await
            .context("failed to parse TMDB episode response")?;
        Ok(Some(details))
    }

    async fn fetch_id_export(&self, kind: MediaKind, date: NaiveDate) -> anyhow::Result<Vec<u8>> {
        let url = self.export_url(kind, date);
        debug!(url = %url, "Downloading TMDB ID export");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TmdbError::Transport {
                url: url.clone(),
                source: e.without_url(),
            })?;
        let bytes = check_status(resp, &url)?
            .bytes()
            .await
            .with_context(|| format!("failed to read TMDB export body: {url}"))?;
        Ok(bytes.to_vec())
    }
}
