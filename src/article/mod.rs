//! Per-article content pipeline: fetch, extract, resolve the title, persist.

pub mod metadata;

pub use metadata::SocialMetadata;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use html_escape::encode_text;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::{info, instrument, warn};

use crate::app::{Result, TributaryError};
use crate::domain::{Article, ArticleState, ParsedContent};
use crate::extractor::{ContentExtractor, Extraction};
use crate::fetcher::{fetch_markup, Fetcher};
use crate::ingest::{Task, TaskRunner};
use crate::store::Store;
use crate::urls::canonical_url;

/// Elements followed by a line break in extracted plain text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

struct Processed {
    extraction: Extraction,
    text: String,
    meta: SocialMetadata,
}

pub struct ArticleFetcher<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    extractor: ContentExtractor,
}

impl<S: Store + Send + Sync + 'static> ArticleFetcher<S> {
    pub fn new(
        store: Arc<S>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        extractor: ContentExtractor,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
        }
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Article> {
        let mut article = self
            .store
            .get_article(id)?
            .ok_or_else(|| TributaryError::ArticleNotFound(id.to_string()))?;

        self.fetch(&mut article).await?;
        Ok(article)
    }

    /// Fetches and extracts `article`'s content, then persists it.
    ///
    /// A failed fetch is recorded on the article rather than returned; the
    /// error path is reserved for persistence and extraction failures.
    #[instrument(skip_all, fields(url = %article.url))]
    pub async fn fetch(&self, article: &mut Article) -> Result<()> {
        let now = Utc::now();

        let Some(page) = fetch_markup(self.fetcher.as_ref(), &article.url).await else {
            article.state = ArticleState::FetchFailed;
            article.fetch_date = Some(now);
            return self.store.put_article(article);
        };

        let Processed {
            extraction,
            text,
            meta,
        } = self.process(page.body, page.final_url).await?;

        article.title = [article.title.take(), extraction.oracle_title, meta.title]
            .into_iter()
            .flatten()
            .find(|title| !title.trim().is_empty());

        article.parsed = Some(ParsedContent {
            article_text: text,
            article_html: extraction.html,
            description: meta.description,
            top_image: meta.image,
        });
        article.state = ArticleState::Populated;
        article.fetch_date = Some(now);

        info!("Fetched {} ({})", article.url, article.display_title());
        self.store.put_article(article)
    }

    /// Get-or-creates the standalone record for `url` (one not tied to any
    /// source) without fetching it.
    pub fn ensure_article(&self, url: &str) -> Result<Article> {
        let url = canonical_url(url);
        let id = Article::id_for(&url, "");

        let (mut article, _) = self
            .store
            .get_or_create_articles(std::slice::from_ref(&id))?
            .into_iter()
            .next()
            .ok_or_else(|| TributaryError::ArticleNotFound(id.clone()))?;

        if !article.is_populated() {
            article.state = ArticleState::Populated;
            article.url = url;
            article.added_date = Some(Utc::now());
            self.store.put_article(&article)?;
        }

        Ok(article)
    }

    /// Cleaned content of `url` with its resolved title as a heading,
    /// without touching the store.
    pub async fn preview(&self, url: &str) -> Result<String> {
        let page = fetch_markup(self.fetcher.as_ref(), url)
            .await
            .ok_or_else(|| TributaryError::Extract(format!("could not fetch {}", url)))?;

        let Processed {
            extraction, meta, ..
        } = self.process(page.body, page.final_url).await?;

        let title = extraction.oracle_title.or(meta.title).unwrap_or_default();
        Ok(format!("<h1>{}</h1>{}", encode_text(&title), extraction.html))
    }

    /// Extraction and metadata run against `url`, the post-redirect page
    /// address, so override lookup and relative links use the real host.
    async fn process(&self, markup: String, url: String) -> Result<Processed> {
        let extractor = self.extractor.clone();

        tokio::task::spawn_blocking(move || {
            let extraction = extractor.extract(&markup, &url);
            Processed {
                text: plain_text(&extraction.html),
                meta: SocialMetadata::from_html(&markup, &url),
                extraction,
            }
        })
        .await
        .map_err(|e| TributaryError::Extract(e.to_string()))
    }
}

#[async_trait]
impl<S: Store + Send + Sync + 'static> TaskRunner for ArticleFetcher<S> {
    async fn run(&self, task: Task) -> Result<()> {
        match task {
            Task::FetchArticle { article_id } => {
                let article = self.fetch_by_id(&article_id).await?;
                if article.fetch_failed() {
                    warn!("Could not fetch {}", article.url);
                }
                Ok(())
            }
        }
    }
}

/// Text content of an HTML fragment, one line per block element.
pub fn plain_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut out = String::new();
    write_text(parsed.root_element(), &mut out);

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_text(child, out);
                }
                if BLOCK_ELEMENTS.contains(&el.name()) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverrideStore;
    use crate::store::SqliteStore;
    use crate::testing::{SelectorOracle, StaticFetcher};

    const URL: &str = "https://example.com/2024/story";

    const PAGE: &str = r#"<html><head>
        <title>Story | Example</title>
        <meta property="og:title" content="Social Title">
        <meta property="og:image" content="/lead.jpg">
        <meta property="og:description" content="What happened">
    </head><body>
        <nav>Home</nav>
        <div class="story"><p>First paragraph.</p><p>Second <b>paragraph</b>.</p></div>
    </body></html>"#;

    fn fetcher_with(
        oracle: SelectorOracle,
        pages: StaticFetcher,
    ) -> (Arc<SqliteStore>, ArticleFetcher<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let extractor = ContentExtractor::new(Arc::new(oracle), Arc::new(OverrideStore::new()));
        let fetcher = ArticleFetcher::new(store.clone(), Arc::new(pages), extractor);
        (store, fetcher)
    }

    fn stored_article(store: &SqliteStore, title: Option<&str>) -> Article {
        let id = Article::id_for(URL, "https://example.com/");
        let (mut article, _) = store.get_or_create_articles(&[id]).unwrap().remove(0);
        article.state = ArticleState::Populated;
        article.url = URL.into();
        article.title = title.map(String::from);
        store.put_article(&article).unwrap();
        article
    }

    #[tokio::test]
    async fn test_fetch_populates_parsed_content() {
        let (store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story").with_title("Oracle Title"),
            StaticFetcher::new().with_page(URL, PAGE),
        );
        let article = stored_article(&store, None);

        let fetched = fetcher.fetch_by_id(&article.id).await.unwrap();
        assert_eq!(fetched.state, ArticleState::Populated);
        assert_eq!(fetched.title.as_deref(), Some("Oracle Title"));
        assert!(fetched.fetch_date.is_some());

        let parsed = fetched.parsed.unwrap();
        assert_eq!(parsed.article_text, "First paragraph.\nSecond paragraph.");
        assert!(parsed.article_html.contains("<p>Second <b>paragraph</b>.</p>"));
        assert!(!parsed.article_html.contains("Home"));
        assert_eq!(parsed.description.as_deref(), Some("What happened"));
        assert_eq!(parsed.top_image.as_deref(), Some("https://example.com/lead.jpg"));

        let reloaded = store.get_article(&article.id).unwrap().unwrap();
        assert_eq!(reloaded.title.as_deref(), Some("Oracle Title"));
    }

    #[tokio::test]
    async fn test_existing_title_survives_refetch() {
        let (store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story").with_title("Oracle Title"),
            StaticFetcher::new().with_page(URL, PAGE),
        );
        let article = stored_article(&store, Some("Edited Title"));

        fetcher.fetch_by_id(&article.id).await.unwrap();
        let refetched = fetcher.fetch_by_id(&article.id).await.unwrap();
        assert_eq!(refetched.title.as_deref(), Some("Edited Title"));
    }

    #[tokio::test]
    async fn test_social_title_is_last_resort() {
        let (store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story"),
            StaticFetcher::new().with_page(URL, PAGE),
        );
        let article = stored_article(&store, None);

        let fetched = fetcher.fetch_by_id(&article.id).await.unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Social Title"));
    }

    #[tokio::test]
    async fn test_redirected_page_resolves_against_final_url() {
        let (store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story"),
            StaticFetcher::new().with_redirect(URL, "https://cdn.example.net/news/story", PAGE),
        );
        let article = stored_article(&store, None);

        let fetched = fetcher.fetch_by_id(&article.id).await.unwrap();
        assert_eq!(fetched.url, URL);
        assert_eq!(fetched.id, article.id);
        assert_eq!(
            fetched.parsed.unwrap().top_image.as_deref(),
            Some("https://cdn.example.net/lead.jpg")
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_recorded() {
        let (store, fetcher) = fetcher_with(SelectorOracle::keeping(".story"), StaticFetcher::new());
        let article = stored_article(&store, Some("Kept"));

        let fetched = fetcher.fetch_by_id(&article.id).await.unwrap();
        assert!(fetched.fetch_failed());
        assert!(fetched.fetch_date.is_some());
        assert!(fetched.parsed.is_none());

        let reloaded = store.get_article(&article.id).unwrap().unwrap();
        assert_eq!(reloaded.state, ArticleState::FetchFailed);
        assert_eq!(reloaded.title.as_deref(), Some("Kept"));
    }

    #[tokio::test]
    async fn test_missing_article() {
        let (_store, fetcher) = fetcher_with(SelectorOracle::keeping_nothing(), StaticFetcher::new());
        assert!(matches!(
            fetcher.fetch_by_id("nope").await,
            Err(TributaryError::ArticleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_runs_as_queued_task() {
        let (store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story"),
            StaticFetcher::new().with_page(URL, PAGE),
        );
        let article = stored_article(&store, None);

        fetcher
            .run(Task::FetchArticle {
                article_id: article.id.clone(),
            })
            .await
            .unwrap();

        let reloaded = store.get_article(&article.id).unwrap().unwrap();
        assert!(reloaded.parsed.is_some());
    }

    #[tokio::test]
    async fn test_ensure_article_is_idempotent() {
        let (store, fetcher) = fetcher_with(SelectorOracle::keeping_nothing(), StaticFetcher::new());

        let first = fetcher.ensure_article("https://example.com/a?utm_campaign=x").unwrap();
        let second = fetcher.ensure_article("https://example.com/a").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.url, "https://example.com/a");
        assert!(second.added_date.is_some());
        assert!(store.get_article(&first.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_preview_prefixes_title() {
        let (_store, fetcher) = fetcher_with(
            SelectorOracle::keeping(".story"),
            StaticFetcher::new().with_page(URL, PAGE),
        );
        let html = fetcher.preview(URL).await.unwrap();
        assert!(html.starts_with("<h1>Social Title</h1><div>"));
        assert!(fetcher.preview("https://example.com/missing").await.is_err());
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            plain_text("<div><h2>Heading</h2><p>One <i>two</i></p>  <ul><li>a</li><li>b</li></ul></div>"),
            "Heading\nOne two\na\nb"
        );
        assert_eq!(plain_text("<div></div>"), "");
    }
}
