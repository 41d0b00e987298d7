//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Selector cascades for extraction and page control
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.base_url.trim().is_empty() {
            return Err(AppError::validation("crawler.base_url is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.load_more_attempts == 0 {
            return Err(AppError::validation(
                "crawler.load_more_attempts must be > 0",
            ));
        }
        if self.crawler.no_growth_limit == 0 {
            return Err(AppError::validation("crawler.no_growth_limit must be > 0"));
        }
        if self.selectors.load_more.is_empty() {
            return Err(AppError::validation("selectors.load_more is empty"));
        }
        if self.selectors.title.is_empty() {
            return Err(AppError::validation("selectors.title is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Catalog landing page URL
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request/navigation timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Settle delay after opening the catalog page, in milliseconds
    #[serde(default = "defaults::page_settle")]
    pub page_settle_ms: u64,

    /// Settle delay after clicking a "load more" control, in milliseconds
    #[serde(default = "defaults::click_settle")]
    pub click_settle_ms: u64,

    /// Settle delay after a scroll-to-bottom fallback, in milliseconds
    #[serde(default = "defaults::scroll_settle")]
    pub scroll_settle_ms: u64,

    /// Delay between per-item fetches, in milliseconds
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,

    /// Upper bound on discovery loop iterations
    #[serde(default = "defaults::load_more_attempts")]
    pub load_more_attempts: usize,

    /// Consecutive no-growth iterations before discovery gives up
    #[serde(default = "defaults::no_growth_limit")]
    pub no_growth_limit: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_settle_ms: defaults::page_settle(),
            click_settle_ms: defaults::click_settle(),
            scroll_settle_ms: defaults::scroll_settle(),
            item_delay_ms: defaults::item_delay(),
            load_more_attempts: defaults::load_more_attempts(),
            no_growth_limit: defaults::no_growth_limit(),
        }
    }
}

/// Selector cascades used for extraction and page control.
///
/// Each list is tried in order; the first selector producing usable
/// content wins for that attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Title element candidates
    #[serde(default = "defaults::title_selectors")]
    pub title: Vec<String>,

    /// Developer/author link candidates
    #[serde(default = "defaults::developer_selectors")]
    pub developer: Vec<String>,

    /// Version element candidates
    #[serde(default = "defaults::version_selectors")]
    pub version: Vec<String>,

    /// Updated-date element candidates
    #[serde(default = "defaults::updated_selectors")]
    pub updated: Vec<String>,

    /// Tagline/summary element candidates
    #[serde(default = "defaults::tagline_selectors")]
    pub tagline: Vec<String>,

    /// Contributor name candidates
    #[serde(default = "defaults::contributor_selectors")]
    pub contributor: Vec<String>,

    /// "Load more" control candidates
    #[serde(default = "defaults::load_more_selectors")]
    pub load_more: Vec<String>,

    /// Modal/overlay dismiss control candidates
    #[serde(default = "defaults::overlay_dismiss_selectors")]
    pub overlay_dismiss: Vec<String>,

    /// Anchor selector that matches catalog item links
    #[serde(default = "defaults::item_link_selector")]
    pub item_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: defaults::title_selectors(),
            developer: defaults::developer_selectors(),
            version: defaults::version_selectors(),
            updated: defaults::updated_selectors(),
            tagline: defaults::tagline_selectors(),
            contributor: defaults::contributor_selectors(),
            load_more: defaults::load_more_selectors(),
            overlay_dismiss: defaults::overlay_dismiss_selectors(),
            item_link: defaults::item_link_selector(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn base_url() -> String {
        "https://inductiveautomation.com/exchange/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn page_settle() -> u64 {
        2000
    }
    pub fn click_settle() -> u64 {
        3000
    }
    pub fn scroll_settle() -> u64 {
        2000
    }
    pub fn item_delay() -> u64 {
        500
    }
    pub fn load_more_attempts() -> usize {
        100
    }
    pub fn no_growth_limit() -> usize {
        3
    }

    // Selector cascade defaults
    pub fn title_selectors() -> Vec<String> {
        [
            "h1.exchange-resource__title",
            "h1.page-title",
            "h1.resource-title",
            "h1",
            ".resource-header h1",
            ".exchange-header h1",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn developer_selectors() -> Vec<String> {
        [
            "a.exchange-resource__author",
            "div.exchange-resource__author a",
            ".resource-author a",
            ".byline a",
            ".author a",
            ".resource-author",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn version_selectors() -> Vec<String> {
        [
            "div.exchange-release__version",
            ".resource-version",
            ".version",
            ".latest-release",
            ".release-version",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn updated_selectors() -> Vec<String> {
        [
            ".exchange-resource__updated",
            ".resource-updated",
            ".last-updated",
            ".updated-date",
            "time[datetime]",
            ".release-date",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn tagline_selectors() -> Vec<String> {
        [
            ".exchange-resource__tagline",
            ".resource-tagline",
            ".resource-summary",
            ".tagline",
            ".summary",
            ".description",
            "meta[name='description']",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn contributor_selectors() -> Vec<String> {
        [
            "a.exchange-resource__author",
            "div.exchange-resource__author a",
            ".resource-author a",
            ".byline a",
            ".author a",
            ".resource-author",
            ".contributor-name",
            ".author-name",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn load_more_selectors() -> Vec<String> {
        [
            "button.load-more",
            "button[class*='load']",
            "button[class*='more']",
            ".load-more",
            "#load-more",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn overlay_dismiss_selectors() -> Vec<String> {
        [
            ".modal button",
            ".ReactModal__Content button",
            "[data-testid='close-button']",
            "[aria-label='Close']",
            ".close-button",
            "button[class*='close']",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn item_link_selector() -> String {
        "a[href*='/exchange/']".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.crawler.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempt_bound() {
        let mut config = Config::default();
        config.crawler.load_more_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_load_more_cascade() {
        let mut config = Config::default();
        config.selectors.load_more.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            item_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.item_delay_ms, 0);
        assert_eq!(config.crawler.load_more_attempts, 100);
        assert!(!config.selectors.title.is_empty());
    }
}
