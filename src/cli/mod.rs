pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "News source ingestion: feed discovery and article extraction", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/tributary/tributary.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (default: <config dir>/tributary/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of sources polled in parallel (overrides the config file)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a source and poll it once
    Subscribe {
        /// URL of the source's site or feed
        url: String,

        /// Exit without waiting for queued article fetches
        #[arg(long)]
        no_wait: bool,
    },
    /// Poll every source
    Poll {
        /// Exit without waiting for queued article fetches
        #[arg(long)]
        no_wait: bool,
    },
    /// Show which feed would be used for a URL, without storing anything
    Discover {
        /// URL of the site or feed
        url: String,
    },
    /// Fetch a single article and print it as JSON
    Article {
        /// URL of the article
        url: String,
    },
    /// Print the cleaned content of a page
    Extract {
        /// URL of the page
        url: String,
    },
    /// List sources, or a source's articles
    List {
        /// Show articles of this source instead of listing sources
        #[arg(long)]
        source: Option<String>,

        /// Maximum number of articles shown
        #[arg(short, long, default_value_t = 25)]
        limit: usize,
    },
}
