//! URL identity helpers.
//!
//! - [`canonical_url`]: identity form used for sources and article ids
//! - [`normalize_host`]: lookup key for override rules and the hardcoded feed table

use url::Url;

/// Query parameters that only carry tracking state.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "smid", "_r"];

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name.as_str())
}

/// Normalized identity form of a URL.
///
/// Lowercases scheme and host (the `url` crate does this on parse), drops the
/// fragment, the default port and tracking parameters. Input that does not
/// parse as an absolute URL is returned trimmed but otherwise unchanged.
pub fn canonical_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    url.to_string()
}

/// Host lookup key: lowercase, scheme and leading `www.` removed, path
/// dropped, and only alphanumerics plus space, `.`, `-` and `_` kept.
pub fn normalize_host(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme);
    let host = without_www.split('/').next().unwrap_or_default();

    host.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Resolves `href` against `base`, falling back to `href` itself.
pub fn resolve(base: &str, href: &str) -> String {
    let href = href.trim();
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_strips_tracking_and_fragment() {
        assert_eq!(
            canonical_url("https://Example.com/story?utm_source=rss&id=7#comments"),
            "https://example.com/story?id=7"
        );
    }

    #[test]
    fn test_canonical_drops_empty_query_and_default_port() {
        assert_eq!(
            canonical_url("http://example.com:80/a?utm_medium=x&_r=0"),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let once = canonical_url("https://www.nytimes.com/2016/02/15/us/scalia.html?smid=tw-share&utm_campaign=x");
        assert_eq!(canonical_url(&once), once);
        assert_eq!(once, "https://www.nytimes.com/2016/02/15/us/scalia.html");
    }

    #[test]
    fn test_canonical_keeps_ordinary_params() {
        let news = canonical_url("https://forum.example.org/index.php?module=news&id=7");
        let events = canonical_url("https://forum.example.org/index.php?module=events&id=7&gclid=abc");
        assert_eq!(news, "https://forum.example.org/index.php?module=news&id=7");
        assert_eq!(events, "https://forum.example.org/index.php?module=events&id=7");

        let source = "https://forum.example.org/";
        assert_ne!(
            crate::domain::Article::id_for(&news, source),
            crate::domain::Article::id_for(&events, source)
        );
    }

    #[test]
    fn test_canonical_passes_through_unparseable() {
        assert_eq!(canonical_url("  not a url "), "not a url");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("http://www.NYTimes.com/2016/02/15/us/x.html"), "nytimes.com");
        assert_eq!(normalize_host("https://blog.example.co.uk"), "blog.example.co.uk");
        assert_eq!(normalize_host("example.com:8080/path"), "example.com8080");
        assert_eq!(normalize_host("https://my_site-1.org/"), "my_site-1.org");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("https://example.com/blog/", "/feed.xml"),
            "https://example.com/feed.xml"
        );
        assert_eq!(
            resolve("https://example.com/blog/", "https://other.com/x"),
            "https://other.com/x"
        );
    }
}
