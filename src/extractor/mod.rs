//! Readable article content from noisy HTML.
//!
//! # Architecture
//!
//! ```text
//! HTML → preorder ids → oracle (tagged HTML) → kept ids ─┐
//!                     → override selectors → white/black ids ─┤→ classify walk → fragment
//! ```
//!
//! Each element is classified as it is entered:
//!
//! - a whitelisted or blacklisted parent passes its state down
//! - otherwise the element is oracle-included if the oracle kept it
//! - the element's own whitelist match then applies, and its blacklist
//!   match after that, so blacklist wins on a doubly matched element
//!
//! Text is copied only under whitelisted or oracle-included elements. On exit
//! an element survives if it kept a child, or if it is an image, video,
//! object, `hr` or `br` in a content-keeping state.

mod oracle;
mod output;
mod tagging;

pub use oracle::{ReadabilitySummarizer, Summarizer, Summary};
pub use tagging::ID_ATTR;

use std::collections::HashSet;
use std::sync::Arc;

use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::config::{OverrideRules, OverrideStore};
use output::OutputTree;

/// Void elements that count as content on their own.
const CONTENT_VOIDS: &[&str] = &["img", "video", "object", "hr", "br"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    None,
    Whitelisted,
    OracleIncluded,
    Blacklisted,
}

impl Class {
    fn keeps_content(self) -> bool {
        matches!(self, Class::Whitelisted | Class::OracleIncluded)
    }

    fn is_forced(self) -> bool {
        matches!(self, Class::Whitelisted | Class::Blacklisted)
    }
}

/// Output of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Cleaned fragment wrapped in a single `<div>`.
    pub html: String,
    /// Short title reported by the oracle, if it found an article.
    pub oracle_title: Option<String>,
}

/// Scratch identifier sets for one parsed document.
struct Classification {
    oracle: HashSet<usize>,
    whitelist: HashSet<usize>,
    blacklist: HashSet<usize>,
}

impl Classification {
    fn classify(&self, id: usize, parent: Class) -> Class {
        let mut state = if parent.is_forced() {
            parent
        } else if self.oracle.contains(&id) {
            Class::OracleIncluded
        } else {
            Class::None
        };

        if self.whitelist.contains(&id) {
            state = Class::Whitelisted;
        }
        if self.blacklist.contains(&id) {
            state = Class::Blacklisted;
        }

        state
    }
}

enum Step<'a> {
    Enter(ElementRef<'a>),
    Text(&'a str),
    Exit,
}

/// Merges the boilerplate oracle with curated per-host override rules.
#[derive(Clone)]
pub struct ContentExtractor {
    oracle: Arc<dyn Summarizer>,
    overrides: Arc<OverrideStore>,
}

impl ContentExtractor {
    pub fn new(oracle: Arc<dyn Summarizer>, overrides: Arc<OverrideStore>) -> Self {
        Self { oracle, overrides }
    }

    /// Extracts the readable content of `html`, fetched from `url`.
    pub fn extract(&self, html: &str, url: &str) -> Extraction {
        let document = Html::parse_document(html);
        let summary = self
            .oracle
            .summarize(&tagging::tagged_html(&document), Some(url));

        let oracle = summary
            .as_ref()
            .map(|s| tagging::ids_in_fragment(&s.content))
            .unwrap_or_default();

        let rules = self.overrides.rules_for(url);
        let classification = Self::resolve_rules(&document, oracle, rules);

        tracing::debug!(
            "Extracting {}: {} oracle, {} whitelisted, {} blacklisted elements",
            url,
            classification.oracle.len(),
            classification.whitelist.len(),
            classification.blacklist.len()
        );

        Extraction {
            html: Self::walk(&document, &classification),
            oracle_title: summary.and_then(|s| s.title),
        }
    }

    fn resolve_rules(
        document: &Html,
        oracle: HashSet<usize>,
        rules: &OverrideRules,
    ) -> Classification {
        Classification {
            oracle,
            whitelist: tagging::resolve(document, &rules.whitelist),
            blacklist: tagging::resolve(document, &rules.blacklist),
        }
    }

    /// Depth-first walk with parallel output-node and state stacks.
    ///
    /// Elements are entered in the same preorder used for tagging, so the
    /// running counter is the element's identifier.
    fn walk(document: &Html, classification: &Classification) -> String {
        let mut tree = OutputTree::new("div");
        let mut nodes = vec![tree.root()];
        let mut states = vec![Class::None];
        let mut names: Vec<&str> = Vec::new();
        let mut steps = vec![Step::Enter(document.root_element())];
        let mut next_id = 0;

        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(element) => {
                    let parent_state = states.last().copied().unwrap_or(Class::None);
                    let state = classification.classify(next_id, parent_state);
                    next_id += 1;

                    let value = element.value();
                    let parent = nodes.last().copied().unwrap_or(tree.root());
                    let clone = tree.append_element(parent, value.name(), value.attrs());

                    nodes.push(clone);
                    states.push(state);
                    names.push(value.name());

                    steps.push(Step::Exit);
                    for child in element.children().rev() {
                        match child.value() {
                            Node::Element(_) => {
                                if let Some(child) = ElementRef::wrap(child) {
                                    steps.push(Step::Enter(child));
                                }
                            }
                            Node::Text(text) => steps.push(Step::Text(text)),
                            _ => {}
                        }
                    }
                }
                Step::Text(text) => {
                    if states.last().is_some_and(|s| s.keeps_content()) {
                        if let Some(&node) = nodes.last() {
                            tree.append_text(node, text);
                        }
                    }
                }
                Step::Exit => {
                    let (Some(node), Some(state), Some(name)) =
                        (nodes.pop(), states.pop(), names.pop())
                    else {
                        break;
                    };

                    let has_content = tree.has_children(node);
                    let is_content = CONTENT_VOIDS.contains(&name) && state.keeps_content();
                    if !has_content && !is_content {
                        let parent = nodes.last().copied().unwrap_or(tree.root());
                        tree.detach_last(parent, node);
                    }
                }
            }
        }

        tree.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverrideSpec;
    use crate::testing::SelectorOracle;

    fn extractor(oracle: SelectorOracle, overrides: &[(&str, &[&str], &[&str])]) -> ContentExtractor {
        let mut store = OverrideStore::new();
        for (host, whitelist, blacklist) in overrides {
            let spec = OverrideSpec {
                whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
                blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
            };
            store.insert(host, &spec).unwrap();
        }
        ContentExtractor::new(Arc::new(oracle), Arc::new(store))
    }

    const URL: &str = "https://www.example.com/2024/01/story.html";

    #[test]
    fn test_nothing_kept_yields_empty_root() {
        let ex = extractor(SelectorOracle::keeping_nothing(), &[]);
        let result = ex.extract("<html><body><div><p>Text</p></div></body></html>", URL);
        assert_eq!(result.html, "<div></div>");
        assert_eq!(result.oracle_title, None);
    }

    #[test]
    fn test_oracle_kept_content_survives_with_ancestors() {
        let ex = extractor(SelectorOracle::keeping(".article"), &[]);
        let result = ex.extract(
            r#"<html><body><nav>Menu</nav><div class="article"><p>Hello <b>world</b></p></div></body></html>"#,
            URL,
        );
        assert_eq!(
            result.html,
            r#"<div><html><body><div class="article"><p>Hello <b>world</b></p></div></body></html></div>"#
        );
    }

    #[test]
    fn test_scratch_ids_never_emitted() {
        let ex = extractor(SelectorOracle::keeping("body"), &[]);
        let result = ex.extract("<html><body><p>a</p><img src=\"x.png\"></body></html>", URL);
        assert!(!result.html.contains(ID_ATTR));
        assert!(result.html.contains("<img src=\"x.png\">"));
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let ex = extractor(
            SelectorOracle::keeping_nothing(),
            &[("example.com", &[".both", ".other"], &[".both"])],
        );
        let result = ex.extract(
            r#"<html><body><div class="both">Hidden</div><div class="other">Shown</div></body></html>"#,
            URL,
        );
        assert!(!result.html.contains("Hidden"));
        assert!(result.html.contains("Shown"));
    }

    #[test]
    fn test_whitelist_outside_oracle_and_blacklist_inside_oracle() {
        let ex = extractor(
            SelectorOracle::keeping(".article"),
            &[("example.com", &[".byline"], &[".promo"])],
        );
        let result = ex.extract(
            r#"<html><body>
                <header><span class="byline">By Ada</span><span>Logo</span></header>
                <div class="article"><p>First</p><div class="promo"><p>Subscribe!</p></div><p>Second</p></div>
            </body></html>"#,
            URL,
        );

        assert!(result.html.contains("By Ada"));
        assert!(!result.html.contains("Logo"));
        assert!(result.html.contains("<p>First</p>"));
        assert!(result.html.contains("<p>Second</p>"));
        assert!(!result.html.contains("Subscribe!"));
        assert!(!result.html.contains("promo"));
    }

    #[test]
    fn test_descendant_can_flip_out_of_blacklist() {
        let ex = extractor(
            SelectorOracle::keeping_nothing(),
            &[("example.com", &[".keep"], &[".sidebar"])],
        );
        let result = ex.extract(
            r#"<html><body><aside class="sidebar"><p>Ad</p><p class="keep">Note</p></aside></body></html>"#,
            URL,
        );
        assert_eq!(
            result.html,
            r#"<div><html><body><aside class="sidebar"><p class="keep">Note</p></aside></body></html></div>"#
        );
    }

    #[test]
    fn test_forced_state_overrides_oracle_for_descendants() {
        let ex = extractor(
            SelectorOracle::keeping(".article"),
            &[("example.com", &[], &[".article"])],
        );
        let result = ex.extract(
            r#"<html><body><div class="article"><p>Body text</p></div></body></html>"#,
            URL,
        );
        assert_eq!(result.html, "<div></div>");
    }

    #[test]
    fn test_empty_wrappers_pruned_recursively() {
        let ex = extractor(
            SelectorOracle::keeping(".outer"),
            &[("example.com", &[], &[".deep"])],
        );
        let result = ex.extract(
            r#"<html><body><div class="outer"><section><div><span class="deep">gone</span></div></section></div><p>loose</p></body></html>"#,
            URL,
        );
        assert_eq!(result.html, "<div></div>");
    }

    #[test]
    fn test_content_voids_need_content_state() {
        let ex = extractor(SelectorOracle::keeping(".article"), &[]);
        let result = ex.extract(
            r#"<html><body><img src="logo.png"><div class="article"><img src="photo.jpg"><hr><input type="text"><br></div></body></html>"#,
            URL,
        );
        assert_eq!(
            result.html,
            r#"<div><html><body><div class="article"><img src="photo.jpg"><hr><br></div></body></html></div>"#
        );
    }

    #[test]
    fn test_overrides_ignored_for_other_hosts() {
        let ex = extractor(
            SelectorOracle::keeping_nothing(),
            &[("other.com", &["p"], &[])],
        );
        let result = ex.extract("<html><body><p>Text</p></body></html>", URL);
        assert_eq!(result.html, "<div></div>");
    }

    #[test]
    fn test_oracle_title_passed_through() {
        let ex = extractor(SelectorOracle::keeping("p").with_title("Short"), &[]);
        let result = ex.extract("<html><body><p>Text</p></body></html>", URL);
        assert_eq!(result.oracle_title.as_deref(), Some("Short"));
        assert!(result.html.contains("<p>Text</p>"));
    }

    #[test]
    fn test_text_is_escaped_in_output() {
        let ex = extractor(SelectorOracle::keeping("p"), &[]);
        let result = ex.extract("<html><body><p>1 &lt; 2 &amp; 3</p></body></html>", URL);
        assert!(result.html.contains("<p>1 &lt; 2 &amp; 3</p>"));
    }
}
