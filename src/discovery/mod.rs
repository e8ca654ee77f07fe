//! Feed discovery for a source.
//!
//! The source page is fetched once. Every strategy then plans against that
//! markup together: synchronous strategies report during dispatch, the rest
//! each spawn one secondary fetch. Spawned fetches are joined in the order
//! they were issued, not the order they finish. The first non-empty report
//! wins, synchronous reports counting before joined ones; losing fetches
//! are never cancelled.

pub mod brand;
pub mod hardcoded;
pub mod hooks;
pub mod strategies;

pub use brand::extract_brand;
pub use hardcoded::FeedTable;
pub use hooks::{EntryHook, HookRegistry};
pub use strategies::{default_strategies, platform_feed_url, Plan, Strategy};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Brand, Source};
use crate::fetcher::{fetch_markup, Fetcher};
use crate::normalizer::{FeedEntry, Normalizer};

/// Draft article record taken from one feed entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDraft {
    pub title: Option<String>,
    pub url: String,
    pub submission_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl From<&FeedEntry> for EntryDraft {
    fn from(entry: &FeedEntry) -> Self {
        Self {
            title: entry.title.clone(),
            url: entry.url.clone(),
            submission_url: None,
            published: entry.published,
        }
    }
}

/// A discovered feed, in feed order.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub method: &'static str,
    pub feed_title: Option<String>,
    pub brand: Option<Brand>,
    pub entries: Vec<EntryDraft>,
}

/// Parses feed markup and runs the per-host entry hooks.
#[derive(Clone, Default)]
pub struct FeedReader {
    normalizer: Normalizer,
    hooks: HookRegistry,
}

impl FeedReader {
    pub fn new(hooks: HookRegistry) -> Self {
        Self {
            normalizer: Normalizer::new(),
            hooks,
        }
    }

    /// `None` when `body` is not a feed or has no usable entries.
    pub fn read(
        &self,
        method: &'static str,
        source_url: &str,
        feed_url: &str,
        body: &str,
    ) -> Option<FetchResult> {
        let feed = match self.normalizer.normalize(feed_url, body.as_bytes()) {
            Ok(feed) => feed,
            Err(e) => {
                debug!("{}: {} is not a feed: {}", method, feed_url, e);
                return None;
            }
        };

        if feed.entries.is_empty() {
            debug!("{}: {} has no entries", method, feed_url);
            return None;
        }

        Some(FetchResult {
            method,
            feed_title: feed.title,
            brand: None,
            entries: self.hooks.drafts(source_url, &feed.entries),
        })
    }
}

pub struct FeedDiscovery {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    strategies: Vec<Box<dyn Strategy>>,
    reader: FeedReader,
}

impl FeedDiscovery {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, table: FeedTable) -> Self {
        Self::with_strategies(fetcher, default_strategies(table))
    }

    pub fn with_strategies(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        Self {
            fetcher,
            strategies,
            reader: FeedReader::default(),
        }
    }

    #[instrument(skip_all, fields(source = %source.url))]
    pub async fn discover(&self, source: &Source) -> Option<FetchResult> {
        let page_url = source.fetch_url();
        let markup = fetch_markup(self.fetcher.as_ref(), page_url).await?.body;

        // One slot per strategy, indexed by declared rank.
        let mut slots: Vec<Option<FetchResult>> = self.strategies.iter().map(|_| None).collect();
        let mut reported = Vec::with_capacity(slots.len());
        let mut pending = Vec::new();

        for (rank, strategy) in self.strategies.iter().enumerate() {
            let method = strategy.method();
            let plan = panic::catch_unwind(AssertUnwindSafe(|| {
                strategy.plan(source, &markup, &self.reader)
            }));

            match plan {
                Ok(Plan::Ready(result)) => {
                    debug!("{} reported: {}", method, describe(&result));
                    slots[rank] = result;
                    reported.push(rank);
                }
                Ok(Plan::Fetch(feed_url)) => {
                    debug!("{} fetching {}", method, feed_url);
                    let fetcher = self.fetcher.clone();
                    let reader = self.reader.clone();
                    let source_url = source.url.clone();

                    let handle = tokio::spawn(async move {
                        let feed = fetch_markup(fetcher.as_ref(), &feed_url).await?;
                        reader.read(method, &source_url, &feed.final_url, &feed.body)
                    });
                    pending.push((rank, method, handle));
                }
                Err(_) => warn!("Strategy {} panicked; skipping it", method),
            }
        }

        for (rank, method, handle) in pending {
            match handle.await {
                Ok(result) => {
                    debug!("{} reported: {}", method, describe(&result));
                    slots[rank] = result;
                    reported.push(rank);
                }
                Err(e) => error!("Strategy {} failed: {}", method, e),
            }
        }

        let winner = reported.into_iter().find(|&rank| {
            slots[rank]
                .as_ref()
                .is_some_and(|result| !result.entries.is_empty())
        })?;
        let mut result = slots[winner].take()?;
        result.brand = extract_brand(&markup, page_url);

        info!(
            "Discovered {} entries via {}",
            result.entries.len(),
            result.method
        );
        Some(result)
    }
}

fn describe(result: &Option<FetchResult>) -> String {
    match result {
        Some(r) => format!("{} entries", r.entries.len()),
        None => "nothing".to_string(),
    }
}
