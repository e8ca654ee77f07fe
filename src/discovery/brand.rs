use scraper::{ElementRef, Html};

use crate::domain::Brand;
use crate::urls::resolve;

/// Reads site branding from a landing page's `<meta>` and `<link>` tags.
pub fn extract_brand(markup: &str, page_url: &str) -> Option<Brand> {
    let document = Html::parse_document(markup);

    let mut site_name = None;
    let mut app_name = None;
    let mut touch_icon = None;
    let mut icon = None;
    let mut theme_color = None;

    for el in document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
    {
        let value = el.value();
        match value.name() {
            "meta" => {
                let key = value
                    .attr("property")
                    .or_else(|| value.attr("name"))
                    .map(str::to_ascii_lowercase);
                let content = value.attr("content").map(str::trim).filter(|c| !c.is_empty());
                let (Some(key), Some(content)) = (key, content) else {
                    continue;
                };

                match key.as_str() {
                    "og:site_name" => {
                        site_name.get_or_insert_with(|| content.to_string());
                    }
                    "application-name" => {
                        app_name.get_or_insert_with(|| content.to_string());
                    }
                    "theme-color" => {
                        theme_color.get_or_insert_with(|| content.to_string());
                    }
                    _ => {}
                }
            }
            "link" => {
                let Some(href) = value.attr("href").filter(|h| !h.trim().is_empty()) else {
                    continue;
                };
                let rel = value.attr("rel").unwrap_or_default().to_ascii_lowercase();
                let rels: Vec<&str> = rel.split_ascii_whitespace().collect();

                if rels.iter().any(|r| r.starts_with("apple-touch-icon")) {
                    touch_icon.get_or_insert_with(|| resolve(page_url, href));
                } else if rels.contains(&"icon") {
                    icon.get_or_insert_with(|| resolve(page_url, href));
                }
            }
            _ => {}
        }
    }

    let brand = Brand {
        name: site_name.or(app_name),
        icon: touch_icon.or(icon),
        theme_color,
    };

    (!brand.is_empty()).then_some(brand)
}
