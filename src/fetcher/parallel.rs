use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::instrument;

use crate::app::{Result, TributaryError};
use crate::discovery::FeedDiscovery;
use crate::domain::Source;
use crate::ingest::{ArticleIngestor, IngestReport};
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 10;

/// Polls sources concurrently: discovery, then ingestion, per source.
pub struct ParallelPoller<S> {
    discovery: Arc<FeedDiscovery>,
    ingestor: Arc<ArticleIngestor<S>>,
    semaphore: Arc<Semaphore>,
}

impl<S: Store + Send + Sync + 'static> ParallelPoller<S> {
    pub fn new(discovery: Arc<FeedDiscovery>, ingestor: Arc<ArticleIngestor<S>>) -> Self {
        Self::with_workers(discovery, ingestor, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        discovery: Arc<FeedDiscovery>,
        ingestor: Arc<ArticleIngestor<S>>,
        workers: usize,
    ) -> Self {
        Self {
            discovery,
            ingestor,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn poll_all(&self, sources: Vec<Source>) -> Vec<(String, Result<IngestReport>)> {
        let mut handles = Vec::new();

        for source in sources {
            let discovery = self.discovery.clone();
            let ingestor = self.ingestor.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                let url = source.url.clone();
                let result = match semaphore.acquire().await {
                    Ok(_permit) => poll_source(&discovery, &ingestor, source).await,
                    Err(e) => Err(TributaryError::Other(e.to_string())),
                };
                (url, result)
            });

            handles.push(handle);
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }

    pub async fn poll(&self, source: Source) -> Result<IngestReport> {
        poll_source(&self.discovery, &self.ingestor, source).await
    }
}

#[instrument(skip_all, fields(source = %source.url))]
async fn poll_source<S: Store>(
    discovery: &FeedDiscovery,
    ingestor: &ArticleIngestor<S>,
    mut source: Source,
) -> Result<IngestReport> {
    let result = discovery.discover(&source).await;
    if result.is_none() {
        tracing::warn!("No feed found for {}", source.url);
    }

    ingestor.ingest(&mut source, result.as_ref())
}
