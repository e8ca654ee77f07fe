use dom_smoothie::{Config, Readability};

/// What the boilerplate oracle kept of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Short article title with site-name decorations removed.
    pub title: Option<String>,
    /// Reduced article fragment. May omit the outer document structure.
    pub content: String,
}

/// Boilerplate remover: strips navigation, ads and chrome from a page,
/// returning probable article content.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, html: &str, url: Option<&str>) -> Option<Summary>;
}

/// Readability-based oracle backed by `dom_smoothie`.
///
/// Attributes on kept elements survive summarization, which is what lets
/// the extractor map the reduced fragment back onto the original tree.
#[derive(Debug, Clone)]
pub struct ReadabilitySummarizer {
    max_elements: usize,
}

impl Default for ReadabilitySummarizer {
    fn default() -> Self {
        Self {
            max_elements: 9000,
        }
    }
}

impl ReadabilitySummarizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Summarizer for ReadabilitySummarizer {
    fn summarize(&self, html: &str, url: Option<&str>) -> Option<Summary> {
        let cfg = Config {
            max_elements_to_parse: self.max_elements,
            ..Default::default()
        };

        let mut readability = match Readability::new(html, url, Some(cfg)) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Readability setup failed: {}", e);
                return None;
            }
        };

        match readability.parse() {
            Ok(article) => {
                let title = article.title.to_string();
                Some(Summary {
                    title: (!title.trim().is_empty()).then(|| title.trim().to_string()),
                    content: article.content.to_string(),
                })
            }
            Err(e) => {
                tracing::debug!("Readability found no article: {}", e);
                None
            }
        }
    }
}
