use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Where an article record is in its life.
///
/// A record is `Created` by get-or-create, `Populated` once the ingestor has
/// filled in the feed entry (and again after any successful content fetch),
/// and `FetchFailed` when the most recent content fetch failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleState {
    #[default]
    Created,
    Populated,
    FetchFailed,
}

impl ArticleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleState::Created => "created",
            ArticleState::Populated => "populated",
            ArticleState::FetchFailed => "fetch_failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "populated" => ArticleState::Populated,
            "fetch_failed" => ArticleState::FetchFailed,
            _ => ArticleState::Created,
        }
    }
}

/// Content produced by the article fetcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedContent {
    pub article_text: String,
    pub article_html: String,
    pub description: Option<String>,
    pub top_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub state: ArticleState,
    pub source_url: String,
    pub url: String,
    pub submission_url: Option<String>,
    pub title: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub added_date: Option<DateTime<Utc>>,
    pub added_order: Option<i64>,
    pub fetch_date: Option<DateTime<Utc>>,
    pub parsed: Option<ParsedContent>,
}

impl Article {
    /// Empty placeholder as returned by get-or-create.
    pub fn placeholder(id: String) -> Self {
        Self {
            id,
            state: ArticleState::Created,
            source_url: String::new(),
            url: String::new(),
            submission_url: None,
            title: None,
            published: None,
            added_date: None,
            added_order: None,
            fetch_date: None,
            parsed: None,
        }
    }

    /// Deterministic id from the canonical article URL and its source URL.
    pub fn id_for(canonical_url: &str, source_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(source_url.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_populated(&self) -> bool {
        self.state != ArticleState::Created
    }

    pub fn fetch_failed(&self) -> bool {
        self.state == ArticleState::FetchFailed
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}
