//! Turning discovered feed entries into article records.
//!
//! Entries are capped to the configured count in feed order and keyed by
//! [`Article::id_for`], so re-observing an entry is a no-op once its record
//! is populated. Each newly populated record gets a content fetch scheduled
//! `(index + 1) * stagger` from now.

pub mod queue;

pub use queue::{spawn_background_queue, BackgroundQueue, QueueHandle, Task, TaskQueue, TaskRunner};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::app::Result;
use crate::config::IngestConfig;
use crate::discovery::FetchResult;
use crate::domain::{Article, ArticleState, Source};
use crate::store::Store;
use crate::suffix::shared_suffix;
use crate::urls::canonical_url;

/// Outcome of ingesting one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Entries considered after capping.
    pub entries: usize,
    /// Records populated for the first time.
    pub populated: usize,
}

pub struct ArticleIngestor<S> {
    store: Arc<S>,
    queue: Arc<dyn TaskQueue>,
    config: IngestConfig,
}

impl<S: Store> ArticleIngestor<S> {
    pub fn new(store: Arc<S>, queue: Arc<dyn TaskQueue>, config: IngestConfig) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Records one poll of `source`. `result` is `None` when discovery found
    /// nothing; the source's `last_fetched` is stamped either way.
    pub fn ingest(&self, source: &mut Source, result: Option<&FetchResult>) -> Result<IngestReport> {
        let now = Utc::now();

        let report = match result {
            Some(result) => self.ingest_entries(source, result, now)?,
            None => IngestReport::default(),
        };

        source.last_fetched = Some(now);
        self.store.put_source(source)?;

        Ok(report)
    }

    fn ingest_entries(
        &self,
        source: &mut Source,
        result: &FetchResult,
        now: DateTime<Utc>,
    ) -> Result<IngestReport> {
        let entries = &result.entries[..result.entries.len().min(self.config.max_entries)];
        let urls: Vec<String> = entries.iter().map(|e| canonical_url(&e.url)).collect();
        let ids: Vec<String> = urls
            .iter()
            .map(|url| Article::id_for(url, &source.url))
            .collect();

        let mut records: HashMap<String, Article> = self
            .store
            .get_or_create_articles(&ids)?
            .into_iter()
            .map(|(article, _)| (article.id.clone(), article))
            .collect();

        let mut populated = Vec::new();
        for (index, (entry, (url, id))) in entries.iter().zip(urls.iter().zip(&ids)).enumerate() {
            let Some(article) = records.get_mut(id) else {
                continue;
            };
            if article.is_populated() {
                debug!("Already have {}", url);
                continue;
            }

            article.state = ArticleState::Populated;
            article.source_url = source.url.clone();
            article.url = url.clone();
            article.submission_url = entry.submission_url.as_deref().map(canonical_url);
            article.published = Some(entry.published.unwrap_or(now));
            article.added_date = Some(now);
            article.added_order = Some(index as i64);
            if article.title.is_none() {
                article.title = entry.title.clone().filter(|t| !t.is_empty());
            }

            populated.push((index, article.clone()));
        }

        if !populated.is_empty() {
            let articles: Vec<Article> = populated.iter().map(|(_, a)| a.clone()).collect();
            self.store.put_articles(&articles)?;

            for (index, article) in &populated {
                self.queue.enqueue(
                    Task::FetchArticle {
                        article_id: article.id.clone(),
                    },
                    self.config.fetch_delay(*index),
                )?;
            }
            source.most_recent_article_added_date = Some(now);
        }

        if let Some(ref title) = result.feed_title {
            source.title = Some(title.clone());
        }
        if result.brand.is_some() {
            source.brand = result.brand.clone();
        }

        let titles: Vec<&str> = entries.iter().filter_map(|e| e.title.as_deref()).collect();
        let suffix = shared_suffix(&titles);
        source.shared_title_suffix = (!suffix.is_empty()).then_some(suffix);

        info!(
            "Ingested {} of {} entries from {} via {}",
            populated.len(),
            entries.len(),
            source.url,
            result.method
        );

        Ok(IngestReport {
            entries: entries.len(),
            populated: populated.len(),
        })
    }
}
