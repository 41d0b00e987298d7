// src/services/identity.rs

//! Resource identity derivation from catalog URLs.

use std::sync::OnceLock;

use regex::Regex;

/// Identity assigned to URLs without a recognizable resource ID.
///
/// Distinct ID-less items all collapse to this value and are therefore
/// indistinguishable to the diff engine. Known limitation, kept for
/// snapshot compatibility.
pub const SENTINEL_IDENTITY: u64 = 999_999;

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/exchange/(\d+)/").expect("valid identity regex"))
}

fn overview_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/exchange/\d+/overview$").expect("valid overview regex"))
}

/// Derive the canonical identity of a resource from its URL.
///
/// Extracts the first `/exchange/<digits>/` segment. Total function:
/// URLs without the pattern (or with a digit run that does not fit in
/// `u64`) map to [`SENTINEL_IDENTITY`].
pub fn resource_id(url: &str) -> u64 {
    id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(SENTINEL_IDENTITY)
}

/// Check whether an href is an exact item overview path
/// (`/exchange/<digits>/overview`), as emitted by the catalog listing.
pub fn is_item_overview_path(href: &str) -> bool {
    overview_pattern().is_match(href)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_from_overview_url() {
        assert_eq!(resource_id("https://host/exchange/1234/overview"), 1234);
    }

    #[test]
    fn test_resource_id_uses_first_match() {
        assert_eq!(resource_id("https://host/exchange/55/x/exchange/77/"), 55);
    }

    #[test]
    fn test_resource_id_sentinel_for_unmatched() {
        assert_eq!(resource_id("https://host/about"), SENTINEL_IDENTITY);
        assert_eq!(resource_id(""), SENTINEL_IDENTITY);
        assert_eq!(resource_id("https://host/exchange//overview"), SENTINEL_IDENTITY);
    }

    #[test]
    fn test_resource_id_sentinel_on_overflow() {
        let url = "https://host/exchange/99999999999999999999999999/overview";
        assert_eq!(resource_id(url), SENTINEL_IDENTITY);
    }

    #[test]
    fn test_resource_id_identical_for_both_diff_sides() {
        // The same URL must always resolve to the same identity.
        let url = "https://host/exchange/42/overview";
        assert_eq!(resource_id(url), resource_id(url));
    }

    #[test]
    fn test_overview_path_exact_match_only() {
        assert!(is_item_overview_path("/exchange/1234/overview"));
        assert!(!is_item_overview_path("/exchange/1234/overview/extra"));
        assert!(!is_item_overview_path("https://host/exchange/1234/overview"));
        assert!(!is_item_overview_path("/exchange/abc/overview"));
    }
}
