mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable consulted when `tmdb.api_key` is empty.
pub const TMDB_API_KEY_ENV: &str = "TMDB_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./cinedex.toml",
        "~/.config/cinedex/config.toml",
        "/etc/cinedex/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

fn apply_env(config: &mut Config) {
    if config.tmdb.api_key.trim().is_empty() {
        if let Ok(key) = std::env::var(TMDB_API_KEY_ENV) {
            config.tmdb.api_key = key.trim().to_string();
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.pipeline.concurrency == 0 {
        anyhow::bail!("pipeline.concurrency must be at least 1");
    }

    if config.tmdb.requests_per_second == 0 {
        anyhow::bail!("tmdb.requests_per_second must be at least 1");
    }

    let mut seen = HashSet::new();
    for category in &config.categories {
        if category.id.trim().is_empty() {
            anyhow::bail!("Category '{}' has an empty id", category.name);
        }
        if !seen.insert(category.id.as_str()) {
            anyhow::bail!("Duplicate category id '{}'", category.id);
        }
    }

    if !config.categories.is_empty() && config.tmdb.api_key.trim().is_empty() {
        anyhow::bail!(
            "Categories are configured but no TMDB API key is set (tmdb.api_key or {})",
            TMDB_API_KEY_ENV
        );
    }

    if config.remote.series_max_depth < 3 {
        tracing::warn!(
            depth = config.remote.series_max_depth,
            "remote.series_max_depth below 3 will not list episode files"
        );
    }

    Ok(())
}
