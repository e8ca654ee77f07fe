use scraper::{ElementRef, Html};
use url::Url;

use super::hardcoded::FeedTable;
use super::{FeedReader, FetchResult};
use crate::domain::Source;
use crate::urls::resolve;

const FEED_TYPES: &[&str] = &["application/rss+xml", "application/atom+xml"];

/// What a strategy does with the already-fetched source markup.
#[derive(Debug)]
pub enum Plan {
    /// Resolved from the markup alone.
    Ready(Option<FetchResult>),
    /// Needs one secondary fetch; the body is read as a feed.
    Fetch(String),
}

/// One way of finding a source's feed.
pub trait Strategy: Send + Sync {
    /// Tag recorded on a [`FetchResult`] this strategy produced.
    fn method(&self) -> &'static str;

    fn plan(&self, source: &Source, markup: &str, reader: &FeedReader) -> Plan;
}

/// Strategies in declared priority order.
pub fn default_strategies(table: FeedTable) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(SourceSpecific),
        Box::new(Hardcoded { table }),
        Box::new(Direct),
        Box::new(DefaultFeed),
        Box::new(Linked),
    ]
}

/// Feed URL conventions of hosted blogging and video platforms.
pub struct SourceSpecific;

impl Strategy for SourceSpecific {
    fn method(&self) -> &'static str {
        "source_specific"
    }

    fn plan(&self, source: &Source, _markup: &str, _reader: &FeedReader) -> Plan {
        match platform_feed_url(source.fetch_url()) {
            Some(feed_url) => Plan::Fetch(feed_url),
            None => Plan::Ready(None),
        }
    }
}

pub struct Hardcoded {
    pub table: FeedTable,
}

impl Strategy for Hardcoded {
    fn method(&self) -> &'static str {
        "hardcoded"
    }

    fn plan(&self, source: &Source, _markup: &str, _reader: &FeedReader) -> Plan {
        match self.table.lookup(&source.url) {
            Some(feed_url) => Plan::Fetch(feed_url.to_string()),
            None => Plan::Ready(None),
        }
    }
}

/// The source URL itself serves a feed.
pub struct Direct;

impl Strategy for Direct {
    fn method(&self) -> &'static str {
        "direct"
    }

    fn plan(&self, source: &Source, markup: &str, reader: &FeedReader) -> Plan {
        Plan::Ready(reader.read(self.method(), &source.url, source.fetch_url(), markup))
    }
}

/// WordPress-style `?feed=rss` guess.
pub struct DefaultFeed;

impl Strategy for DefaultFeed {
    fn method(&self) -> &'static str {
        "default_feed"
    }

    fn plan(&self, source: &Source, _markup: &str, _reader: &FeedReader) -> Plan {
        Plan::Fetch(format!("{}/?feed=rss", source.fetch_url().trim_end_matches('/')))
    }
}

/// `<link rel="alternate">` feed advertised by the page.
pub struct Linked;

impl Strategy for Linked {
    fn method(&self) -> &'static str {
        "linked"
    }

    fn plan(&self, source: &Source, markup: &str, _reader: &FeedReader) -> Plan {
        match linked_feed(markup) {
            Some(href) => Plan::Fetch(resolve(source.fetch_url(), &href)),
            None => Plan::Ready(None),
        }
    }
}

fn linked_feed(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let head = document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "head")?;

    head.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "link")
        .find_map(|el| {
            let value = el.value();
            let rel = value.attr("rel")?.to_ascii_lowercase();
            let content_type = value.attr("type")?.trim().to_ascii_lowercase();
            let href = value.attr("href")?.trim();

            let is_feed = rel.split_ascii_whitespace().any(|r| r == "alternate")
                && FEED_TYPES.contains(&content_type.as_str())
                && !href.is_empty();
            is_feed.then(|| href.to_string())
        })
}

/// Derives the feed URL of a page hosted on a known platform.
pub fn platform_feed_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let bare = host.strip_prefix("www.").unwrap_or(&host);
    let scheme = parsed.scheme();
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if bare.ends_with(".tumblr.com") {
        return Some(format!("{}://{}/rss", scheme, host));
    }
    if bare.ends_with(".blogspot.com") {
        return Some(format!("{}://{}/feeds/posts/default", scheme, host));
    }
    if bare == "medium.com" {
        return segments
            .first()
            .filter(|user| user.starts_with('@'))
            .map(|user| format!("https://medium.com/feed/{}", user));
    }
    if bare.ends_with(".medium.com") {
        return Some(format!("https://{}/feed", host));
    }
    if bare == "reddit.com" || bare.ends_with(".reddit.com") {
        if let ["r", sub, ..] = segments.as_slice() {
            return Some(format!("https://www.reddit.com/r/{}/.rss", sub));
        }
        return None;
    }
    if bare == "youtube.com" || bare == "m.youtube.com" {
        if let ["channel", id, ..] = segments.as_slice() {
            return Some(format!(
                "https://www.youtube.com/feeds/videos.xml?channel_id={}",
                id
            ));
        }
    }

    None
}
