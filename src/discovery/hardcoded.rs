use std::collections::HashMap;

use crate::urls::normalize_host;

/// Feeds for sites whose pages do not advertise one, or advertise a poor one.
const BUILTIN_FEEDS: &[(&str, &str)] = &[
    ("nytimes.com", "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml"),
    ("bbc.com", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("bbc.co.uk", "https://feeds.bbci.co.uk/news/rss.xml"),
    ("theverge.com", "https://www.theverge.com/rss/index.xml"),
    ("techcrunch.com", "https://techcrunch.com/feed/"),
    ("news.ycombinator.com", "https://news.ycombinator.com/rss"),
    ("arstechnica.com", "https://feeds.arstechnica.com/arstechnica/index"),
    ("npr.org", "https://feeds.npr.org/1001/rss.xml"),
    ("theguardian.com", "https://www.theguardian.com/international/rss"),
];

/// Normalized host to feed URL.
#[derive(Debug, Clone)]
pub struct FeedTable {
    feeds: HashMap<String, String>,
}

impl Default for FeedTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FeedTable {
    pub fn builtin() -> Self {
        Self {
            feeds: BUILTIN_FEEDS
                .iter()
                .map(|(host, feed)| (host.to_string(), feed.to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }

    /// Layers configured entries over the table. Keys are normalized, so
    /// `"https://www.example.com"` and `"example.com"` name the same host.
    pub fn with_entries(mut self, entries: &HashMap<String, String>) -> Self {
        for (host, feed) in entries {
            self.feeds.insert(normalize_host(host), feed.clone());
        }
        self
    }

    pub fn lookup(&self, url: &str) -> Option<&str> {
        self.feeds.get(&normalize_host(url)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_host() {
        let table = FeedTable::builtin();
        assert_eq!(
            table.lookup("https://www.theverge.com/tech"),
            Some("https://www.theverge.com/rss/index.xml")
        );
        assert_eq!(table.lookup("https://example.com/"), None);
    }

    #[test]
    fn test_configured_entries_override_builtin() {
        let entries = HashMap::from([
            ("www.TheVerge.com".to_string(), "https://mirror.example/verge.xml".to_string()),
            ("example.com".to_string(), "https://example.com/feed".to_string()),
        ]);
        let table = FeedTable::builtin().with_entries(&entries);

        assert_eq!(
            table.lookup("https://theverge.com/"),
            Some("https://mirror.example/verge.xml")
        );
        assert_eq!(table.lookup("http://example.com/news"), Some("https://example.com/feed"));
    }
}
