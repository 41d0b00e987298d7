// src/services/extract.rs

//! Heuristic field extraction for one catalog item.
//!
//! Each attribute is resolved through an ordered cascade of DOM
//! strategies; the first strategy producing usable text wins. Whatever
//! is still missing afterwards is mined from the structured payloads
//! captured while the page loaded, by matching keys against fixed
//! per-attribute keyword sets. Extraction never fails outward: a miss
//! is an absent field, not an error.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::models::{ResourceRecord, SelectorConfig};
use crate::services::identity::resource_id;
use crate::services::session::{parse_selector, CapturedPayload, FetchedPage};
use crate::services::version;

// Keyword substrings for the structured-payload fallback, matched
// case-insensitively against payload keys.
const KEYS_TITLE: &[&str] = &["title", "name", "resource_title"];
const KEYS_DEVELOPER: &[&str] = &[
    "author",
    "developer",
    "owner",
    "contributor",
    "created_by",
    "user",
];
const KEYS_VERSION: &[&str] = &["version", "latest", "latest_release", "release"];
const KEYS_UPDATED: &[&str] = &[
    "updated",
    "modified",
    "last_updated",
    "updated_at",
    "modified_at",
];
const KEYS_TAGLINE: &[&str] = &["tagline", "summary", "brief", "subtitle", "short_description"];
const KEYS_CONTRIBUTOR: &[&str] = &[
    "contributor",
    "contributor_name",
    "author_name",
    "developer_name",
    "username",
    "display_name",
];

fn user_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/user/(\d+)").expect("valid user id regex"))
}

/// Extracts the attributes of one [`ResourceRecord`] from a fetched page.
pub struct FieldExtractor {
    selectors: SelectorConfig,
}

impl FieldExtractor {
    /// Create an extractor with the given selector cascades.
    pub fn new(selectors: SelectorConfig) -> Self {
        Self { selectors }
    }

    /// Build the record for one item URL from its fetched page.
    pub fn extract(&self, url: &str, page: &FetchedPage) -> ResourceRecord {
        let document = Html::parse_document(&page.html);

        let mut title = self.first_text(&document, &self.selectors.title);
        let mut developer_id = self.developer_from_dom(&document);
        let mut version = self.first_text(&document, &self.selectors.version);
        let mut updated_date = self.updated_from_dom(&document);
        let mut tagline = self.tagline_from_dom(&document);
        let mut contributor = self.contributor_from_dom(&document);

        // Structured-payload fallback for whatever the DOM missed.
        // First success per attribute is never overwritten.
        if title.is_none() {
            title = scan_payloads(&page.payloads, KEYS_TITLE, accept_string);
        }
        if developer_id.is_none() {
            developer_id = scan_payloads(&page.payloads, KEYS_DEVELOPER, accept_digits);
        }
        if version.is_none() {
            version = scan_payloads(&page.payloads, KEYS_VERSION, accept_scalar);
        }
        if updated_date.is_none() {
            updated_date = scan_payloads(&page.payloads, KEYS_UPDATED, accept_string);
        }
        if tagline.is_none() {
            tagline = scan_payloads(&page.payloads, KEYS_TAGLINE, accept_string);
        }
        if contributor.is_none() {
            contributor = scan_payloads(&page.payloads, KEYS_CONTRIBUTOR, accept_non_numeric);
        }

        let version = version.map(|v| version::normalize(&v));

        // Last resort for the title: document title metadata.
        let title = title.or_else(|| self.document_title(&document));

        ResourceRecord {
            url: url.to_string(),
            identity: resource_id(url),
            title,
            developer_id,
            version,
            updated_date,
            tagline,
            contributor,
        }
    }

    /// First non-empty element text across a selector cascade.
    fn first_text(&self, document: &Html, cascade: &[String]) -> Option<String> {
        for selector in cascade {
            let Ok(sel) = parse_selector(selector) else {
                log::debug!("Skipping unparsable selector: {selector}");
                continue;
            };
            if let Some(text) = document.select(&sel).next().and_then(element_text) {
                return Some(text);
            }
        }
        None
    }

    /// Developer ID: a `/user/<digits>` href capture, or all-digit text.
    fn developer_from_dom(&self, document: &Html) -> Option<String> {
        for selector in &self.selectors.developer {
            let Ok(sel) = parse_selector(selector) else {
                continue;
            };
            if let Some(el) = document.select(&sel).next() {
                if let Some(href) = el.value().attr("href") {
                    if let Some(caps) = user_id_pattern().captures(href) {
                        return Some(caps[1].to_string());
                    }
                }
                if let Some(text) = element_text(el) {
                    if is_digits(&text) {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    /// Updated date: prefer a machine-readable `datetime` attribute
    /// over the element text.
    fn updated_from_dom(&self, document: &Html) -> Option<String> {
        for selector in &self.selectors.updated {
            let Ok(sel) = parse_selector(selector) else {
                continue;
            };
            if let Some(el) = document.select(&sel).next() {
                if let Some(datetime) = el.value().attr("datetime") {
                    if !datetime.is_empty() {
                        return Some(datetime.to_string());
                    }
                }
                if let Some(text) = element_text(el) {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Tagline: meta elements contribute their `content` attribute,
    /// everything else its text.
    fn tagline_from_dom(&self, document: &Html) -> Option<String> {
        for selector in &self.selectors.tagline {
            let Ok(sel) = parse_selector(selector) else {
                continue;
            };
            if let Some(el) = document.select(&sel).next() {
                if el.value().name() == "meta" {
                    if let Some(content) = el.value().attr("content") {
                        let content = content.trim();
                        if !content.is_empty() {
                            return Some(content.to_string());
                        }
                    }
                } else if let Some(text) = element_text(el) {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Contributor: non-numeric display text longer than one character.
    fn contributor_from_dom(&self, document: &Html) -> Option<String> {
        for selector in &self.selectors.contributor {
            let Ok(sel) = parse_selector(selector) else {
                continue;
            };
            if let Some(el) = document.select(&sel).next() {
                if let Some(text) = element_text(el) {
                    if !is_digits(&text) && text.len() > 1 {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    fn document_title(&self, document: &Html) -> Option<String> {
        let sel = parse_selector("title").ok()?;
        document.select(&sel).next().and_then(element_text)
    }
}

/// Collapse an element's text nodes and trim; empty text is a miss.
fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text: String = el.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Scan captured payloads in order; within each payload, candidates are
/// visited in key discovery order and the first value passing the shape
/// predicate wins.
fn scan_payloads(
    payloads: &[CapturedPayload],
    keys: &[&str],
    accept: fn(&Value) -> Option<String>,
) -> Option<String> {
    for payload in payloads {
        let mut candidates = Vec::new();
        collect_keyed(&payload.body, keys, &mut candidates);
        for value in candidates {
            if let Some(resolved) = accept(value) {
                return Some(resolved);
            }
        }
    }
    None
}

/// Recursively collect values whose key contains any keyword substring,
/// matched case-insensitively. A matched value is collected before its
/// own children are visited.
fn collect_keyed<'a>(value: &'a Value, keys: &[&str], out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key_lower = key.to_lowercase();
                if keys.iter().any(|sub| key_lower.contains(sub)) {
                    out.push(child);
                }
                collect_keyed(child, keys, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keyed(item, keys, out);
            }
        }
        _ => {}
    }
}

/// Non-empty string scalar.
fn accept_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Numeric-looking scalar: all-digit string or integer number.
fn accept_digits(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            is_digits(trimmed).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

/// Any non-empty string or number (version codes arrive both ways).
fn accept_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-numeric, non-empty string (display names, not IDs).
fn accept_non_numeric(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && !is_digits(trimmed)).then(|| trimmed.to_string())
        }
        _ => None,
    }
}
