//! Per-host post-processing of feed entries.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::{ElementRef, Html};

use super::EntryDraft;
use crate::normalizer::FeedEntry;
use crate::urls::{normalize_host, resolve};

/// Rewrites a parsed feed entry into a draft for one host's feeds.
pub trait EntryHook: Send + Sync {
    fn apply(&self, entry: &FeedEntry, draft: &mut EntryDraft);
}

/// Link aggregators publish the discussion thread as the entry link and
/// the submitted article as a `[link]` anchor inside the entry body.
pub struct SubmissionLinkHook;

impl EntryHook for SubmissionLinkHook {
    fn apply(&self, entry: &FeedEntry, draft: &mut EntryDraft) {
        let Some(ref content) = entry.content else {
            return;
        };

        let fragment = Html::parse_fragment(content);
        let href = fragment
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "a")
            .find(|el| el.text().collect::<String>().trim() == "[link]")
            .and_then(|el| el.value().attr("href"));

        if let Some(href) = href {
            draft.submission_url = Some(draft.url.clone());
            draft.url = resolve(&entry.url, href);
        }
    }
}

/// Hooks keyed by normalized source host.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: HashMap<String, Arc<dyn EntryHook>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        let submission: Arc<dyn EntryHook> = Arc::new(SubmissionLinkHook);
        for host in ["reddit.com", "old.reddit.com"] {
            registry.register(host, submission.clone());
        }
        registry
    }
}

impl HookRegistry {
    pub fn empty() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    pub fn register(&mut self, host: &str, hook: Arc<dyn EntryHook>) {
        self.hooks.insert(normalize_host(host), hook);
    }

    /// Turns parsed entries into drafts, running the hook for `source_url`'s host.
    pub fn drafts(&self, source_url: &str, entries: &[FeedEntry]) -> Vec<EntryDraft> {
        let hook = self.hooks.get(&normalize_host(source_url));

        entries
            .iter()
            .map(|entry| {
                let mut draft = EntryDraft::from(entry);
                if let Some(hook) = hook {
                    hook.apply(entry, &mut draft);
                }
                draft
            })
            .collect()
    }
}
