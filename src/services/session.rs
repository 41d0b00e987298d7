// src/services/session.rs

//! Catalog session collaborator.
//!
//! The crawl engine drives the catalog through the [`CatalogSession`]
//! trait: open the listing, grow it ("load more"/scroll), enumerate
//! item links, and fetch individual item pages together with any
//! structured payloads intercepted while they loaded. All failures are
//! recoverable errors; the engine decides what is fatal.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::services::identity::is_item_overview_path;

/// A structured response payload captured while a page loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedPayload {
    /// URL of the intercepted response
    pub url: String,
    /// Parsed payload tree
    pub body: serde_json::Value,
}

/// Rendered content of one fetched item page.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Rendered document markup
    pub html: String,
    /// Structured payloads observed during the load, in capture order
    pub payloads: Vec<CapturedPayload>,
}

/// Driver for the paginated catalog listing and its item pages.
#[async_trait]
pub trait CatalogSession: Send {
    /// Navigate to the catalog listing page.
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Count item links currently present in the listing.
    async fn item_link_count(&mut self) -> Result<usize>;

    /// All candidate item hrefs currently present, in document order.
    async fn item_links(&mut self) -> Result<Vec<String>>;

    /// Try each candidate selector in order and activate the first
    /// actionable control. Returns `Ok(true)` if one was activated.
    async fn click_any(&mut self, selectors: &[String]) -> Result<bool>;

    /// Scroll the listing to the bottom (lazy-load fallback).
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Fetch one item page, including intercepted payloads.
    async fn fetch_item(&mut self, url: &str) -> Result<FetchedPage>;
}

/// Static-HTML session backed by a plain HTTP client.
///
/// A degraded stand-in for a scriptable browser: without JavaScript
/// there is nothing to click or scroll, so `click_any` never finds an
/// actionable control and `scroll_to_bottom` is a no-op. Discovery then
/// sees only the server-rendered first page and terminates through the
/// no-growth bound. `fetch_item` captures no payloads, so extraction
/// relies on markup strategies alone.
pub struct HttpSession {
    client: reqwest::Client,
    item_link_selector: String,
    listing_html: Option<String>,
}

impl HttpSession {
    /// Build a session from crawler configuration.
    pub fn new(config: &CrawlerConfig, item_link_selector: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            item_link_selector: item_link_selector.to_string(),
            listing_html: None,
        })
    }

    fn listing(&self) -> Result<&str> {
        self.listing_html
            .as_deref()
            .ok_or_else(|| AppError::validation("catalog session not opened"))
    }

    fn overview_hrefs(&self) -> Result<Vec<String>> {
        let document = Html::parse_document(self.listing()?);
        let selector = parse_selector(&self.item_link_selector)?;

        Ok(document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| is_item_overview_path(href))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl CatalogSession for HttpSession {
    async fn open(&mut self, url: &str) -> Result<()> {
        let html = self.client.get(url).send().await?.text().await?;
        self.listing_html = Some(html);
        Ok(())
    }

    async fn item_link_count(&mut self) -> Result<usize> {
        Ok(self.overview_hrefs()?.len())
    }

    async fn item_links(&mut self) -> Result<Vec<String>> {
        self.overview_hrefs()
    }

    async fn click_any(&mut self, _selectors: &[String]) -> Result<bool> {
        // Static HTML: controls exist but cannot be activated.
        Ok(false)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn fetch_item(&mut self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;
        let html = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        Ok(FetchedPage {
            html,
            payloads: Vec::new(),
        })
    }
}

/// Parse a CSS selector with a typed error.
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
