// src/utils/mod.rs

//! Utility functions and helpers.

use url::Url;

/// Resolve a potentially relative href against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/exchange/").unwrap();
        assert_eq!(
            resolve_url(&base, "/exchange/123/overview"),
            "https://example.com/exchange/123/overview"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_resolve_from_strings() {
        assert_eq!(
            resolve("https://example.com/exchange/", "/exchange/9/overview"),
            Some("https://example.com/exchange/9/overview".to_string())
        );
        assert_eq!(resolve("not a url", "/x"), None);
    }
}
