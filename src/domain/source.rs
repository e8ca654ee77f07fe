use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::suffix::trim_suffix;

/// Site branding scraped from a source's landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub theme_color: Option<String>,
}

impl Brand {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.theme_color.is_none()
    }
}

/// A polled news source, identified by its canonical URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: Option<String>,
    pub brand: Option<Brand>,
    pub featured_priority: Option<f64>,
    pub categories: Vec<String>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub most_recent_article_added_date: Option<DateTime<Utc>>,
    pub shared_title_suffix: Option<String>,
    pub fetch_url_override: Option<String>,
}

impl Source {
    pub fn new(url: String) -> Self {
        Self {
            url,
            title: None,
            brand: None,
            featured_priority: None,
            categories: Vec::new(),
            last_fetched: None,
            most_recent_article_added_date: None,
            shared_title_suffix: None,
            fetch_url_override: None,
        }
    }

    /// URL to poll: the override when one is configured.
    pub fn fetch_url(&self) -> &str {
        self.fetch_url_override.as_deref().unwrap_or(&self.url)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Strips this source's shared title boilerplate from an article title.
    pub fn trim_article_title<'a>(&self, title: &'a str) -> &'a str {
        match self.shared_title_suffix.as_deref() {
            Some(suffix) => trim_suffix(title, suffix),
            None => title,
        }
    }
}
