use cinedex_common::MediaKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cinedex")]
#[command(author, version, about = "Media catalog builder backed by TMDB")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the catalog for every configured category
    Build {
        /// Only rebuild this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Import the provider's bulk ID export into the local cache
    ImportIds {
        /// movie or series
        #[arg(long)]
        kind: MediaKind,

        /// Import again even if an import already completed
        #[arg(long)]
        force: bool,
    },

    /// Show how a file or folder name is parsed
    Parse {
        /// Name to parse
        name: String,

        /// movie or series
        #[arg(long, default_value = "movie")]
        kind: MediaKind,

        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search catalog titles
    Search {
        /// Text to search for
        query: String,

        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of hits
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show a category, or one of its entries
    Show {
        /// Category id
        category: String,

        /// TMDB id of a single entry
        #[arg(long)]
        id: Option<u64>,

        /// Output the stored document as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the most recently modified episode files
    Recent {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// List past catalog builds
    History {
        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
