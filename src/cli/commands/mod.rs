//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod crawl;
mod listing;
mod query;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "reelscout")]
#[command(about = "Collect popular movies from TMDb and browse them by language and genre")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the movie table (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Collect popular movies for every configured language and save them
    Crawl {
        /// Pages to fetch per language (default from config, 10)
        #[arg(short, long)]
        pages: Option<u32>,
    },

    /// Show the most popular collected movies for a language and genre
    Query {
        /// Language name (e.g. "English") or code (e.g. "en")
        language: String,
        /// Genre name (e.g. "Action")
        genre: String,
    },

    /// List genres available for querying
    Genres,

    /// List languages known to TMDb
    Languages,

    /// Show where the movie table lives and what it contains
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let settings = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Crawl { pages } => crawl::cmd_crawl(&settings, pages).await,
        Commands::Query { language, genre } => {
            query::cmd_query(&settings, &language, &genre).await
        }
        Commands::Genres => listing::cmd_genres(&settings).await,
        Commands::Languages => listing::cmd_languages(&settings).await,
        Commands::Status => status::cmd_status(&settings).await,
    }
}
