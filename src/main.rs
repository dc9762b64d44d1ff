mod cli;

use cinedex::catalog::SqliteSink;
use cinedex::config::{self, Config};
use cinedex::metadata::{MetadataProvider, TmdbProvider};
use cinedex::pipeline::Pipeline;
use cinedex::remote::RcloneLister;
use cinedex::resolve::{normalize_query, IdCache, Resolver};
use cinedex_common::{MediaKind, TmdbId};
use cinedex_db::pool::{get_conn, init_pool, DbPool};
use cinedex_db::queries::{builds, catalog};
use cinedex_parser::{clean_file_name, parse_episode, parse_release_name, parse_season_folder};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cinedex=trace,cinedex_db=debug,cinedex_common=debug,cinedex_parser=debug".to_string()
        } else {
            "cinedex=debug,cinedex_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build { category } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(build(cli.config.as_deref(), category.as_deref()))
        }
        Commands::ImportIds { kind, force } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(import_ids(cli.config.as_deref(), kind, force))
        }
        Commands::Parse { name, kind, json } => parse_name(&name, kind, json),
        Commands::Search {
            query,
            category,
            limit,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(search(
                cli.config.as_deref(),
                &query,
                category.as_deref(),
                limit,
            ))
        }
        Commands::Show { category, id, json } => {
            show(cli.config.as_deref(), &category, id.map(TmdbId::new), json)
        }
        Commands::Recent { limit } => recent(cli.config.as_deref(), limit),
        Commands::History { category, limit } => {
            history(cli.config.as_deref(), category.as_deref(), limit)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cinedex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_db(config: &Config) -> Result<DbPool> {
    let path = config.database.resolved_path();
    tracing::debug!("Opening database at {}", path);
    init_pool(&path).with_context(|| format!("Failed to open database at {path}"))
}

async fn build(config_path: Option<&Path>, only: Option<&str>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let categories = match only {
        Some(id) => vec![config
            .category(id)
            .cloned()
            .with_context(|| format!("Unknown category '{id}'"))?],
        None => config.categories.clone(),
    };
    if categories.is_empty() {
        println!("No categories configured, nothing to build.");
        return Ok(());
    }

    let pool = open_db(&config)?;
    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(&config.tmdb));
    if !provider.is_available() {
        anyhow::bail!("TMDB API key is not configured");
    }

    let id_cache = config
        .pipeline
        .fuzzy_fallback
        .then(|| Arc::new(IdCache::new(pool.clone(), provider.clone())));
    let resolver = Arc::new(Resolver::new(provider.clone(), id_cache));
    let pipeline = Pipeline::new(
        Arc::new(RcloneLister::new(&config.remote)),
        provider,
        resolver,
        Arc::new(SqliteSink::new(pool)),
    )
    .with_config(&config);

    let mut failed = 0;
    for (category, result) in pipeline.run(&categories).await {
        match result {
            Ok(report) => println!(
                "{}: {} entities, {} files ({} candidates, {} identified, {} skipped)",
                category,
                report.entities,
                report.files,
                report.candidates,
                report.identified,
                report.skipped
            ),
            Err(e) => {
                failed += 1;
                println!("{}: failed: {:#}", category, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} categories failed", categories.len());
    }
    Ok(())
}

async fn import_ids(config_path: Option<&Path>, kind: MediaKind, force: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_db(&config)?;
    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(&config.tmdb));
    let cache = IdCache::new(pool, provider);

    if force {
        let summary = cache.reimport(kind).await?;
        println!(
            "Imported {} {} ids from the {} export ({} lines skipped)",
            summary.flag.row_count, kind, summary.flag.export_date, summary.skipped_lines
        );
    } else {
        let flag = cache.ensure_imported(kind).await?;
        println!(
            "{} id cache holds {} rows from the {} export (imported {})",
            kind, flag.row_count, flag.export_date, flag.imported_at
        );
    }
    Ok(())
}

fn parse_name(name: &str, kind: MediaKind, json: bool) -> Result<()> {
    if json {
        let episode = (kind == MediaKind::Series).then(|| parse_episode(name));
        let out = serde_json::json!({
            "parsed": parse_release_name(name, kind),
            "cleaned": clean_file_name(name),
            "episode": episode,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match parse_release_name(name, kind) {
        Some(parsed) => {
            println!("Title: {}", parsed.title);
            println!(
                "Year: {}",
                parsed.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into())
            );
            if let Some(ext) = &parsed.extension {
                println!("Extension: {}", ext);
            }
            println!(
                "Query: {}",
                normalize_query(&parsed.title).unwrap_or_else(|| "-".into())
            );
        }
        None => println!("No title found"),
    }

    println!("Cleaned: {}", clean_file_name(name));
    if kind == MediaKind::Series {
        let numbers = parse_episode(name);
        if numbers.season.is_some() || numbers.episode.is_some() {
            println!(
                "Episode: season {:?}, episode {:?}",
                numbers.season, numbers.episode
            );
        }
        println!("Season folder: {}", parse_season_folder(name));
    }
    Ok(())
}

async fn search(
    config_path: Option<&Path>,
    query: &str,
    category: Option<&str>,
    limit: usize,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let sink = SqliteSink::new(open_db(&config)?);

    let hits = sink.search_titles(query, category, limit).await?;
    if hits.is_empty() {
        println!("No matches.");
    }
    for hit in hits {
        let year = hit.year.map(|y| format!(" ({y})")).unwrap_or_default();
        println!(
            "{:>8}  {}{}  [{} {}]",
            hit.tmdb_id, hit.title, year, hit.category_id, hit.kind
        );
    }
    Ok(())
}

fn show(config_path: Option<&Path>, category: &str, id: Option<TmdbId>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_db(&config)?;
    let conn = get_conn(&pool)?;

    let Some(id) = id else {
        let entries = catalog::list_category(&conn, category)?;
        println!("{}: {} entries", category, catalog::count_entries(&conn, category)?);
        for entry in entries {
            let year = entry.year.map(|y| format!(" ({y})")).unwrap_or_default();
            println!("{:>8}  {}{}", entry.tmdb_id, entry.title, year);
        }
        return Ok(());
    };

    let entry = catalog::get_entry(&conn, category, id)?
        .with_context(|| format!("No entry {id} in category '{category}'"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entry.body)?);
        return Ok(());
    }

    println!("{} [{}]", entry.title, entry.tmdb_id);
    if let Some(original) = &entry.original_title {
        println!("  Original title: {}", original);
    }
    if let Some(year) = entry.year {
        println!("  Year: {}", year);
    }
    println!("  Updated: {}", entry.updated_at);
    if entry.kind == MediaKind::Series {
        for episode in catalog::list_episodes(&conn, category, id)? {
            println!(
                "  S{:02}E{:02}  {}  {}",
                episode.season_number,
                episode.episode_number,
                episode.name.as_deref().unwrap_or("-"),
                episode.path
            );
        }
    }
    Ok(())
}

fn recent(config_path: Option<&Path>, limit: usize) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_db(&config)?;
    let conn = get_conn(&pool)?;

    for recent in catalog::recent_episodes(&conn, limit)? {
        println!(
            "{}  {} S{:02}E{:02}  {}",
            recent.episode.modified_time.as_deref().unwrap_or("-"),
            recent.series_title,
            recent.episode.season_number,
            recent.episode.episode_number,
            recent.episode.name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn history(config_path: Option<&Path>, category: Option<&str>, limit: usize) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_db(&config)?;
    let conn = get_conn(&pool)?;

    if let Some(id) = category {
        if builds::last_build(&conn, id)?.is_none() {
            println!("Category '{}' has never been built.", id);
            return Ok(());
        }
    }
    for build in builds::list_builds(&conn, category, limit)? {
        println!(
            "{}  {:<12} {:<6} {} entities, {} files, {}/{} identified, {} skipped",
            build.finished_at.format("%Y-%m-%d %H:%M:%S"),
            build.category_id,
            build.kind,
            build.entities,
            build.files,
            build.identified,
            build.candidates,
            build.skipped
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  TMDB: {}", config.tmdb.base_url);
            println!(
                "  API key: {}",
                if config.tmdb.api_key.is_empty() { "missing" } else { "set" }
            );
            println!("  rclone: {}", config.remote.rc_url);
            println!("  Database: {}", config.database.resolved_path());
            println!("  Concurrency: {}", config.pipeline.concurrency);
            println!("  Categories: {}", config.categories.len());
            for category in &config.categories {
                println!("    {} ({}): {}", category.id, category.kind, category.name);
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  TMDB: {}", config.tmdb.base_url);
            println!("  rclone: {}", config.remote.rc_url);
            println!("  Database: {}", config.database.resolved_path());
        }
    }

    Ok(())
}
