pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// A successfully retrieved page.
#[derive(Debug, Clone)]
pub struct Page {
    pub body: String,
    pub content_type: Option<String>,
    /// URL after redirects.
    pub final_url: String,
}

impl Page {
    /// Whether the body is something the HTML or feed parsers can use.
    /// A missing content type is given the benefit of the doubt.
    pub fn is_markup(&self) -> bool {
        let Some(ref content_type) = self.content_type else {
            return true;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        mime.starts_with("text/") || mime.contains("xml") || mime == "application/json"
    }
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Page>;
}

/// Fetches `url` and collapses every failure (network, HTTP status,
/// non-markup content) into `None`.
pub async fn fetch_markup(fetcher: &(dyn Fetcher + Send + Sync), url: &str) -> Option<Page> {
    match fetcher.fetch(url).await {
        Ok(page) if page.is_markup() => Some(page),
        Ok(page) => {
            tracing::warn!(
                "Non-markup response from {}: {}",
                url,
                page.content_type.as_deref().unwrap_or_default()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Error fetching {}: {}", url, e);
            None
        }
    }
}
