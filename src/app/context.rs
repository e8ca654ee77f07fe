use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, TributaryError};
use crate::article::ArticleFetcher;
use crate::config::Config;
use crate::discovery::{FeedDiscovery, FeedTable};
use crate::extractor::{ContentExtractor, ReadabilitySummarizer};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelPoller;
use crate::fetcher::Fetcher;
use crate::ingest::{spawn_background_queue, ArticleIngestor, QueueHandle};
use crate::store::sqlite::SqliteStore;

/// Wires the pipeline together. Must be built inside a tokio runtime: the
/// background queue worker is spawned on construction.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub discovery: Arc<FeedDiscovery>,
    pub articles: Arc<ArticleFetcher<SqliteStore>>,
    pub queue: QueueHandle,
    pub poller: ParallelPoller<SqliteStore>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetcher)?);

        let overrides = config.override_store()?;
        tracing::debug!("Loaded extractor overrides for {} hosts", overrides.len());
        let extractor = ContentExtractor::new(
            Arc::new(ReadabilitySummarizer::new()),
            Arc::new(overrides),
        );

        let table = FeedTable::builtin().with_entries(&config.discovery.feeds);
        let discovery = Arc::new(FeedDiscovery::new(fetcher.clone(), table));

        let articles = Arc::new(ArticleFetcher::new(
            store.clone(),
            fetcher.clone(),
            extractor,
        ));
        let queue = spawn_background_queue(articles.clone());

        let ingestor = Arc::new(ArticleIngestor::new(
            store.clone(),
            Arc::new(queue.clone()),
            config.ingest.clone(),
        ));
        let poller = ParallelPoller::with_workers(discovery.clone(), ingestor, config.ingest.workers);

        Ok(Self {
            store,
            discovery,
            articles,
            queue,
            poller,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TributaryError::Other("Could not find data directory".into()))?;
        let tributary_dir = data_dir.join("tributary");
        std::fs::create_dir_all(&tributary_dir)?;
        Ok(tributary_dir.join("tributary.db"))
    }
}
