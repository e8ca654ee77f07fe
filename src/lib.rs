//! # Tributary
//!
//! News-source ingestion: finds a site's feed, turns its entries into
//! deduplicated article records, and extracts readable article content.
//!
//! ## Architecture
//!
//! Tributary follows a pipeline architecture:
//!
//! ```text
//! Source → FeedDiscovery → FetchResult → ArticleIngestor → TaskQueue
//!                                                            ↓
//!                      Store ← ArticleFetcher ← ContentExtractor
//! ```
//!
//! - [`discovery`]: Runs feed-detection strategies and picks one result
//! - [`ingest`]: Dedupes entries into articles and schedules fetches
//! - [`article`]: Fetches an article page and persists its content
//! - [`extractor`]: Merges a readability pass with per-host overrides
//! - [`store`]: SQLite persistence layer
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a source and poll it
//! tributary subscribe https://blog.rust-lang.org/
//!
//! # Poll every source
//! tributary poll
//!
//! # List a source's articles
//! tributary list --source https://blog.rust-lang.org/
//!
//! # Clean up a single page
//! tributary extract https://example.com/2024/01/story.html
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, discovery, extractor, task queue.
pub mod app;

/// Single-article fetching.
///
/// - [`ArticleFetcher`](article::ArticleFetcher): fetch, extract, resolve title, persist
/// - [`SocialMetadata`](article::SocialMetadata): Open Graph / Twitter card tags
pub mod article;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `subscribe <url>` - Add a source and poll it
/// - `poll` - Poll all sources
/// - `discover <url>` - Show the feed discovery result
/// - `article <url>` - Fetch one article
/// - `extract <url>` - Print cleaned page content
/// - `list [--source <url>]` - List sources or articles
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/tributary/config.toml`, supporting:
/// - Fetcher timeout and user agent
/// - Ingestion cap and fetch stagger
/// - Extra hardcoded feeds
/// - Extractor whitelist/blacklist overrides per host
pub mod config;

/// Feed discovery.
pub mod discovery;

/// Core domain models.
///
/// - [`Source`](domain::Source): A polled news source
/// - [`Article`](domain::Article): An article with SHA256 ID and lifecycle state
pub mod domain;

/// Readable content extraction.
pub mod extractor;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelPoller`](fetcher::parallel::ParallelPoller): Concurrent source polling with semaphore
pub mod fetcher;

/// Article ingestion and the background task queue.
pub mod ingest;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`FeedEntry`](normalizer::FeedEntry) structs.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Longest common suffix of article titles.
pub mod suffix;

/// URL canonicalization and host normalization.
pub mod urls;

#[cfg(test)]
pub(crate) mod testing;
