//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::app::{Result, TributaryError};
use crate::extractor::{Summarizer, Summary};
use crate::fetcher::{Fetcher, Page};
use crate::ingest::{Task, TaskQueue};

struct Canned {
    body: String,
    content_type: Option<String>,
    delay: Duration,
    final_url: Option<String>,
}

/// Map-backed fetcher. Unknown URLs fail; every request is logged.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Canned>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_delayed_page(url, body, Duration::ZERO)
    }

    pub fn with_typed_page(mut self, url: &str, body: &str, content_type: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned {
                body: body.to_string(),
                content_type: Some(content_type.to_string()),
                delay: Duration::ZERO,
                final_url: None,
            },
        );
        self
    }

    pub fn with_delayed_page(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned {
                body: body.to_string(),
                content_type: None,
                delay,
                final_url: None,
            },
        );
        self
    }

    /// Serves `body` for `url` as if the server redirected to `final_url`.
    pub fn with_redirect(mut self, url: &str, final_url: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Canned {
                body: body.to_string(),
                content_type: None,
                delay: Duration::ZERO,
                final_url: Some(final_url.to_string()),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        self.requests.lock().unwrap().push(url.to_string());

        let (body, content_type, delay, final_url) = match self.pages.get(url) {
            Some(c) => (
                c.body.clone(),
                c.content_type.clone(),
                c.delay,
                c.final_url.clone().unwrap_or_else(|| url.to_string()),
            ),
            None => return Err(TributaryError::Other(format!("no page for {}", url))),
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(Page {
            body,
            content_type,
            final_url,
        })
    }
}

/// Oracle stand-in that keeps every element matching one selector.
pub struct SelectorOracle {
    selector: Option<Selector>,
    title: Option<String>,
}

impl SelectorOracle {
    pub fn keeping(selector: &str) -> Self {
        Self {
            selector: Some(Selector::parse(selector).unwrap()),
            title: None,
        }
    }

    pub fn keeping_nothing() -> Self {
        Self {
            selector: None,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

impl Summarizer for SelectorOracle {
    fn summarize(&self, html: &str, _url: Option<&str>) -> Option<Summary> {
        let selector = self.selector.as_ref()?;
        let document = Html::parse_document(html);
        let content: String = document.select(selector).map(|e| e.html()).collect();

        Some(Summary {
            title: self.title.clone(),
            content,
        })
    }
}

/// Queue that only records what was enqueued.
#[derive(Default)]
pub struct RecordingQueue {
    tasks: Mutex<Vec<(Task, Duration)>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> Vec<(Task, Duration)> {
        self.tasks.lock().unwrap().clone()
    }
}

impl TaskQueue for RecordingQueue {
    fn enqueue(&self, task: Task, delay: Duration) -> Result<()> {
        self.tasks.lock().unwrap().push((task, delay));
        Ok(())
    }
}
