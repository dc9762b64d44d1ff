use cinedex_common::Category;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Config {
    /// Look up a configured category by its remote id.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// v3 API key; falls back to the `TMDB_API_KEY` environment variable
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Include adult titles in searches
    #[serde(default)]
    pub include_adult: bool,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    /// Base URL of the nightly ID exports
    #[serde(default = "default_export_base_url")]
    pub export_base_url: String,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_language() -> String {
    "en-US".to_string()
}
fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_export_base_url() -> String {
    "http://files.tmdb.org/p/exports".to_string()
}
fn default_requests_per_second() -> u32 {
    4
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            include_adult: false,
            base_url: default_tmdb_base_url(),
            export_base_url: default_export_base_url(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Address of the rclone remote-control daemon
    #[serde(default = "default_rc_url")]
    pub rc_url: String,

    /// Optional basic-auth credentials for the daemon
    #[serde(default)]
    pub rc_user: Option<String>,

    #[serde(default)]
    pub rc_pass: Option<String>,

    /// Listing depth for series categories (series / season / episode)
    #[serde(default = "default_series_max_depth")]
    pub series_max_depth: u32,

    #[serde(default = "default_list_timeout")]
    pub timeout_secs: u64,
}

fn default_rc_url() -> String {
    "http://localhost:35530".to_string()
}
fn default_series_max_depth() -> u32 {
    3
}
fn default_list_timeout() -> u64 {
    300
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            rc_url: default_rc_url(),
            rc_user: None,
            rc_pass: None,
            series_max_depth: default_series_max_depth(),
            timeout_secs: default_list_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Parallel resolve/fetch tasks per category
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retry unresolved titles against the local ID cache
    #[serde(default = "default_fuzzy_fallback")]
    pub fuzzy_fallback: bool,
}

fn default_concurrency() -> usize {
    4
}
fn default_fuzzy_fallback() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fuzzy_fallback: default_fuzzy_fallback(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file; `~` is expanded
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "~/.local/share/cinedex/cinedex.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl DatabaseConfig {
    /// Database path with `~` and environment variables expanded.
    pub fn resolved_path(&self) -> String {
        shellexpand::full(&self.path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.path.clone())
    }
}
