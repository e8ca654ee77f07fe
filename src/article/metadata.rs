use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::urls::resolve;

/// Page-level sharing metadata from `<meta>` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialMetadata {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl SocialMetadata {
    /// Open Graph values first, Twitter card values as fallback. Relative
    /// image URLs are resolved against `page_url`.
    pub fn from_html(markup: &str, page_url: &str) -> Self {
        let document = Html::parse_document(markup);
        let values = meta_values(&document);

        let title = values
            .get("og:title")
            .or_else(|| values.get("twitter:title"))
            .cloned();

        let image = values
            .get("og:image")
            .or_else(|| values.get("og:image:url"))
            .or_else(|| values.get("twitter:image"))
            .or_else(|| values.get("twitter:image:src"))
            .map(|src| resolve(page_url, src));

        let description = values
            .get("og:description")
            .or_else(|| values.get("twitter:description"))
            .or_else(|| values.get("description"))
            .cloned();

        Self {
            title,
            image,
            description,
        }
    }
}

/// First non-empty `content` per lowercased `property` or `name`.
fn meta_values(document: &Html) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for meta in document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "meta")
    {
        let value = meta.value();
        let Some(content) = value.attr("content").map(str::trim).filter(|c| !c.is_empty())
        else {
            continue;
        };

        for key in [value.attr("property"), value.attr("name")].into_iter().flatten() {
            values
                .entry(key.trim().to_ascii_lowercase())
                .or_insert_with(|| content.to_string());
        }
    }

    values
}
