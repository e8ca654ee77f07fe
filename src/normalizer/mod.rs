use chrono::{DateTime, Utc};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TributaryError};
use crate::urls::resolve;

/// One feed entry as parsed, before any per-host hook runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    /// Absolute link, resolved against the feed URL.
    pub url: String,
    pub published: Option<DateTime<Utc>>,
    /// Entry body (or summary) HTML, used by entry hooks.
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parses RSS, Atom or JSON Feed markup fetched from `feed_url`.
    ///
    /// Entries without a link are skipped; relative links are resolved
    /// against `feed_url`.
    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<ParsedFeed> {
        let feed = parser::parse(body).map_err(|e| TributaryError::FeedParse(e.to_string()))?;

        let title = feed
            .title
            .map(|t| decode_html_entities(&t.content).trim().to_string())
            .filter(|t| !t.is_empty());

        let entries = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let link = entry.links.first().map(|l| l.href.trim().to_string())?;
                if link.is_empty() {
                    return None;
                }

                Some(FeedEntry {
                    title: entry
                        .title
                        .map(|t| decode_html_entities(&t.content).trim().to_string()),
                    url: resolve(feed_url, &link),
                    published: entry.published.or(entry.updated).map(|dt| dt.with_timezone(&Utc)),
                    content: entry
                        .content
                        .and_then(|c| c.body)
                        .or(entry.summary.map(|s| s.content)),
                })
            })
            .collect();

        Ok(ParsedFeed { title, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed &amp; Friends</title>
    <link>https://example.com/</link>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid isPermaLink="false">item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Relative Item</title>
      <link>/posts/2</link>
      <guid isPermaLink="false">item-2</guid>
    </item>
    <item>
      <title>No link</title>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:test</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <content type="html">&lt;p&gt;Body&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let parsed = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(parsed.title, Some("Test Feed & Friends".into()));
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].title, Some("Test Item 1".into()));
        assert_eq!(parsed.entries[0].url, "https://example.com/item1");
        assert!(parsed.entries[0].published.is_some());
        assert_eq!(parsed.entries[0].content, Some("This is item 1".into()));
    }

    #[test]
    fn test_relative_links_resolved_against_feed_url() {
        let parsed = Normalizer::new()
            .normalize("https://example.com/blog/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        assert_eq!(parsed.entries[1].url, "https://example.com/posts/2");
        assert_eq!(parsed.entries[1].published, None);
    }

    #[test]
    fn test_parse_atom() {
        let parsed = Normalizer::new()
            .normalize("https://example.com/feed.atom", ATOM_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(parsed.title, Some("Atom Test Feed".into()));
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].url, "https://example.com/atom1");
        assert!(parsed.entries[0].published.is_some());
        assert_eq!(parsed.entries[0].content.as_deref(), Some("<p>Body</p>"));
    }

    #[test]
    fn test_html_page_is_not_a_feed() {
        let result = Normalizer::new().normalize(
            "https://example.com/",
            b"<!DOCTYPE html><html><head><title>Home</title></head><body></body></html>",
        );
        assert!(matches!(result, Err(TributaryError::FeedParse(_))));
    }
}
