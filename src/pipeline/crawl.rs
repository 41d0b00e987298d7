// src/pipeline/crawl.rs

//! Crawl engine: catalog discovery and per-item extraction.
//!
//! Discovery grows the paginated listing through "load more" clicks
//! with a scroll fallback, bounded by an attempt limit and a
//! consecutive no-growth counter. The fetch phase then walks the
//! deduplicated item URLs strictly sequentially; parallel fetching
//! would invite the target site's anti-automation defenses.
//!
//! One engine value runs one crawl. The host constructs it with a
//! control receiver and a progress sink and owns it for the duration
//! of the invocation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::models::{Config, Snapshot};
use crate::pipeline::control::{Checkpoint, ControlReceiver, CrawlState};
use crate::pipeline::progress::{LogLevel, ProgressSink};
use crate::services::identity::is_item_overview_path;
use crate::services::session::CatalogSession;
use crate::services::FieldExtractor;
use crate::utils::resolve_url;

/// Summary of one crawl invocation.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Records collected, in discovery order. Valid even when the
    /// crawl was stopped early.
    pub snapshot: Snapshot,
    /// Terminal state: `Done` or `Stopped`
    pub state: CrawlState,
    /// Item URLs discovered (after dedup)
    pub discovered: usize,
    /// Per-item fetches that failed and were skipped
    pub fetch_failures: usize,
    /// Discovery iterations performed
    pub load_more_rounds: usize,
}

/// Result of the discovery phase.
struct Discovery {
    links: Vec<String>,
    rounds: usize,
}

/// Drives one crawl over a [`CatalogSession`].
pub struct CrawlEngine {
    config: Arc<Config>,
    extractor: FieldExtractor,
    control: ControlReceiver,
    sink: Arc<dyn ProgressSink>,
    state: CrawlState,
}

impl CrawlEngine {
    /// Create an engine for one crawl invocation.
    pub fn new(config: Arc<Config>, control: ControlReceiver, sink: Arc<dyn ProgressSink>) -> Self {
        let extractor = FieldExtractor::new(config.selectors.clone());
        Self {
            config,
            extractor,
            control,
            sink,
            state: CrawlState::Idle,
        }
    }

    /// Engine without a host control handle; runs to completion.
    pub fn detached(config: Arc<Config>, sink: Arc<dyn ProgressSink>) -> Self {
        Self::new(config, ControlReceiver::detached(), sink)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Run the full crawl: open the catalog, discover item URLs, fetch
    /// and extract each item. A stop request yields a partial snapshot
    /// with `CrawlState::Stopped`; only failing to drive the catalog
    /// session at all is an error.
    pub async fn run<S: CatalogSession>(&mut self, session: &mut S) -> Result<CrawlOutcome> {
        self.state = CrawlState::Running;

        match self.crawl(session).await {
            Ok(outcome) => {
                self.state = outcome.state;
                Ok(outcome)
            }
            Err(error) => {
                self.state = CrawlState::Failed;
                self.sink
                    .log(&format!("Crawl failed: {error}"), LogLevel::Error);
                Err(error)
            }
        }
    }

    async fn crawl<S: CatalogSession>(&mut self, session: &mut S) -> Result<CrawlOutcome> {
        let config = Arc::clone(&self.config);

        self.sink
            .log("Starting full catalog crawl...", LogLevel::Info);
        session.open(&config.crawler.base_url).await?;
        self.settle(config.crawler.page_settle_ms).await;

        self.dismiss_overlays(session).await;

        let discovery = self.discover(session).await?;
        let total = discovery.links.len();
        self.sink.log(
            &format!("Found {total} resources to scrape"),
            LogLevel::Info,
        );
        self.sink.progress(0, total, "Starting...");

        let mut snapshot = Vec::with_capacity(total);
        let mut fetch_failures = 0;
        let mut state = CrawlState::Done;

        for (idx, url) in discovery.links.iter().enumerate() {
            if self.checkpoint().await {
                state = CrawlState::Stopped;
                break;
            }

            match session.fetch_item(url).await {
                Ok(page) => {
                    let record = self.extractor.extract(url, &page);
                    self.sink.log(
                        &format!("Scraped: {} (v{})", record.label(), record.version_or_empty()),
                        LogLevel::Info,
                    );
                    self.sink.progress(idx + 1, total, record.label());
                    snapshot.push(record);
                }
                Err(error) => {
                    fetch_failures += 1;
                    self.sink
                        .log(&format!("Failed to scrape {url}: {error}"), LogLevel::Error);
                }
            }

            self.settle(config.crawler.item_delay_ms).await;
        }

        Ok(CrawlOutcome {
            snapshot,
            state,
            discovered: total,
            fetch_failures,
            load_more_rounds: discovery.rounds,
        })
    }

    /// Grow the listing until the attempt bound or the no-growth limit
    /// is reached, then collect the deduplicated item URLs.
    ///
    /// Every iteration counts against the attempt bound, click or
    /// scroll, so discovery terminates even if the page keeps growing
    /// forever. Iteration errors are logged and count as no growth.
    async fn discover<S: CatalogSession>(&mut self, session: &mut S) -> Result<Discovery> {
        let config = Arc::clone(&self.config);
        let mut rounds = 0;
        let mut no_growth = 0;

        while rounds < config.crawler.load_more_attempts
            && no_growth < config.crawler.no_growth_limit
        {
            if self.checkpoint().await {
                break;
            }
            rounds += 1;

            match self.grow_listing(session).await {
                Ok(true) => no_growth = 0,
                Ok(false) => {
                    no_growth += 1;
                    self.sink.log(
                        &format!(
                            "No new resources loaded (attempt {no_growth}/{})",
                            config.crawler.no_growth_limit
                        ),
                        LogLevel::Info,
                    );
                }
                Err(error) => {
                    no_growth += 1;
                    self.sink.log(
                        &format!("Error while loading more resources: {error}"),
                        LogLevel::Error,
                    );
                }
            }
        }

        let total_loaded = session.item_link_count().await?;
        self.sink.log(
            &format!("Finished loading. Total resources found: {total_loaded}"),
            LogLevel::Info,
        );

        let base = Url::parse(&config.crawler.base_url)?;
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for href in session.item_links().await? {
            if !is_item_overview_path(&href) {
                continue;
            }
            let url = resolve_url(&base, &href);
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        Ok(Discovery { links, rounds })
    }

    /// One discovery iteration: click a load-more control if one is
    /// actionable, otherwise fall back to scrolling. Returns whether
    /// the item link count grew.
    async fn grow_listing<S: CatalogSession>(&mut self, session: &mut S) -> Result<bool> {
        let config = Arc::clone(&self.config);
        let before = session.item_link_count().await?;

        if session.click_any(&config.selectors.load_more).await? {
            self.sink.log(
                &format!("Clicked load more (current resources: {before})"),
                LogLevel::Info,
            );
            self.settle(config.crawler.click_settle_ms).await;
        } else {
            session.scroll_to_bottom().await?;
            self.settle(config.crawler.scroll_settle_ms).await;
        }

        let after = session.item_link_count().await?;
        if after > before {
            self.sink.log(
                &format!("Loaded {} new resources (total: {after})", after - before),
                LogLevel::Info,
            );
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Dismiss cookie banners and modal popups that block the listing.
    async fn dismiss_overlays<S: CatalogSession>(&mut self, session: &mut S) {
        match session.click_any(&self.config.selectors.overlay_dismiss).await {
            Ok(true) => {
                self.sink.log("Dismissed overlay popup", LogLevel::Info);
                let settle = self.config.crawler.page_settle_ms;
                self.settle(settle).await;
            }
            Ok(false) => {}
            Err(error) => self.sink.log(
                &format!("Error handling overlay: {error}"),
                LogLevel::Warning,
            ),
        }
    }

    /// Yield-point check; returns true when the crawl should stop.
    /// Tracks the Paused/Running transitions on the engine state.
    async fn checkpoint(&mut self) -> bool {
        use crate::pipeline::control::CrawlCommand;

        if self.control.current() == CrawlCommand::Pause {
            self.state = CrawlState::Paused;
            self.sink.log("Paused", LogLevel::Warning);
        }

        match self.control.checkpoint().await {
            Checkpoint::Stop => {
                self.sink.log("Crawl stopped by request", LogLevel::Warning);
                true
            }
            Checkpoint::Resumed => {
                self.state = CrawlState::Running;
                self.sink.log("Resumed", LogLevel::Info);
                false
            }
            Checkpoint::Proceed => false,
        }
    }

    async fn settle(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::pipeline::control::CrawlControl;
    use crate::pipeline::progress::NullSink;
    use crate::services::session::FetchedPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable catalog: `growth_rounds` successful load-more clicks
    /// each reveal `links_per_round` additional items.
    struct FakeCatalog {
        growth_rounds: usize,
        links_per_round: usize,
        revealed: usize,
        grow_on_scroll: bool,
        scroll_calls: usize,
        fail_open: bool,
        failing_items: Vec<String>,
        fetched: Vec<String>,
        stop_after_fetches: Option<(usize, CrawlControl)>,
        fetch_count: Arc<AtomicUsize>,
    }

    impl FakeCatalog {
        fn new(growth_rounds: usize, links_per_round: usize) -> Self {
            Self {
                growth_rounds,
                links_per_round,
                revealed: links_per_round,
                grow_on_scroll: false,
                scroll_calls: 0,
                fail_open: false,
                failing_items: Vec::new(),
                fetched: Vec::new(),
                stop_after_fetches: None,
                fetch_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CatalogSession for FakeCatalog {
        async fn open(&mut self, _url: &str) -> crate::error::Result<()> {
            if self.fail_open {
                return Err(AppError::fetch("catalog", "connection refused"));
            }
            Ok(())
        }

        async fn item_link_count(&mut self) -> crate::error::Result<usize> {
            Ok(self.revealed)
        }

        async fn item_links(&mut self) -> crate::error::Result<Vec<String>> {
            Ok((1..=self.revealed)
                .map(|i| format!("/exchange/{i}/overview"))
                .collect())
        }

        async fn click_any(&mut self, selectors: &[String]) -> crate::error::Result<bool> {
            // The engine probes with the overlay cascade first and the
            // load-more cascade during discovery.
            let is_load_more = selectors.iter().any(|s| s.contains("load"));
            if is_load_more && self.growth_rounds > 0 {
                self.growth_rounds -= 1;
                self.revealed += self.links_per_round;
                return Ok(true);
            }
            Ok(false)
        }

        async fn scroll_to_bottom(&mut self) -> crate::error::Result<()> {
            self.scroll_calls += 1;
            if self.grow_on_scroll {
                self.revealed += 1;
            }
            Ok(())
        }

        async fn fetch_item(&mut self, url: &str) -> crate::error::Result<FetchedPage> {
            self.fetched.push(url.to_string());
            let count = self.fetch_count.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, control)) = &self.stop_after_fetches {
                if count >= *limit {
                    control.stop();
                }
            }
            if self.failing_items.iter().any(|u| url.ends_with(u)) {
                return Err(AppError::fetch(url, "HTTP 503"));
            }
            let id = crate::services::identity::resource_id(url);
            Ok(FetchedPage {
                html: format!(
                    "<h1 class=\"page-title\">Resource {id}</h1>\
                     <div class=\"resource-version\">100030000</div>"
                ),
                payloads: Vec::new(),
            })
        }
    }

    fn test_config() -> Arc<Config> {
        let mut config = Config::default();
        config.crawler.page_settle_ms = 0;
        config.crawler.click_settle_ms = 0;
        config.crawler.scroll_settle_ms = 0;
        config.crawler.item_delay_ms = 0;
        config.crawler.load_more_attempts = 20;
        config.crawler.no_growth_limit = 3;
        Arc::new(config)
    }

    fn detached_engine() -> CrawlEngine {
        CrawlEngine::detached(test_config(), Arc::new(NullSink))
    }

    #[tokio::test]
    async fn test_full_crawl_extracts_all_items() {
        let mut session = FakeCatalog::new(2, 3);
        let mut engine = detached_engine();

        let outcome = engine.run(&mut session).await.unwrap();

        // 3 initial + 2 growth rounds of 3.
        assert_eq!(outcome.snapshot.len(), 9);
        assert_eq!(outcome.discovered, 9);
        assert_eq!(outcome.state, CrawlState::Done);
    }

    #[tokio::test]
    async fn test_records_carry_extracted_fields() {
        let mut session = FakeCatalog::new(0, 2);
        let mut engine = detached_engine();

        let outcome = engine.run(&mut session).await.unwrap();

        assert_eq!(outcome.snapshot.len(), 2);
        let first = &outcome.snapshot[0];
        assert_eq!(first.identity, 1);
        assert_eq!(first.title.as_deref(), Some("Resource 1"));
        assert_eq!(first.version.as_deref(), Some("1.3.0"));
        assert!(first.url.starts_with("https://"));
    }

    #[tokio::test]
    async fn test_discovery_terminates_without_growth() {
        // No clickable control and scrolling never helps: the loop must
        // end after no_growth_limit iterations, all via scroll.
        let mut session = FakeCatalog::new(0, 4);
        let mut engine = detached_engine();

        let outcome = engine.run(&mut session).await.unwrap();

        assert_eq!(outcome.load_more_rounds, 3);
        assert_eq!(session.scroll_calls, 3);
        assert_eq!(outcome.snapshot.len(), 4);
        assert_eq!(outcome.state, CrawlState::Done);
    }

    #[tokio::test]
    async fn test_discovery_bounded_when_scroll_always_grows() {
        let mut session = FakeCatalog::new(0, 1);
        session.grow_on_scroll = true;
        let mut engine = detached_engine();

        let outcome = engine.run(&mut session).await.unwrap();

        // Growth never stalls, so only the attempt bound ends the loop.
        assert_eq!(outcome.load_more_rounds, 20);
        assert_eq!(outcome.state, CrawlState::Done);
    }

    #[tokio::test]
    async fn test_failed_items_are_skipped_not_fatal() {
        let mut session = FakeCatalog::new(0, 3);
        session.failing_items = vec!["/exchange/2/overview".to_string()];
        let mut engine = detached_engine();

        let outcome = engine.run(&mut session).await.unwrap();

        assert_eq!(outcome.state, CrawlState::Done);
        assert_eq!(outcome.fetch_failures, 1);
        assert_eq!(outcome.snapshot.len(), 2);
        assert!(outcome.snapshot.iter().all(|r| r.identity != 2));
    }

    #[tokio::test]
    async fn test_stop_mid_crawl_returns_partial_snapshot() {
        let (control, receiver) = CrawlControl::channel();
        let mut session = FakeCatalog::new(0, 5);
        session.stop_after_fetches = Some((2, control));

        let mut engine = CrawlEngine::new(test_config(), receiver, Arc::new(NullSink));
        let outcome = engine.run(&mut session).await.unwrap();

        // The stop lands during item 2; the checkpoint before item 3
        // observes it. Both collected records survive.
        assert_eq!(outcome.state, CrawlState::Stopped);
        assert_eq!(outcome.snapshot.len(), 2);
        assert_eq!(session.fetched.len(), 2);
        assert_eq!(engine.state(), CrawlState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_run_yields_empty_snapshot() {
        let (control, receiver) = CrawlControl::channel();
        control.stop();

        let mut session = FakeCatalog::new(2, 3);
        let mut engine = CrawlEngine::new(test_config(), receiver, Arc::new(NullSink));
        let outcome = engine.run(&mut session).await.unwrap();

        assert_eq!(outcome.state, CrawlState::Stopped);
        assert!(outcome.snapshot.is_empty());
        assert!(session.fetched.is_empty());
    }

    #[tokio::test]
    async fn test_pause_resume_completes_crawl() {
        let (control, receiver) = CrawlControl::channel();
        control.pause();

        let mut engine = CrawlEngine::new(test_config(), receiver, Arc::new(NullSink));
        let crawl = tokio::spawn(async move {
            let mut session = FakeCatalog::new(0, 2);
            engine.run(&mut session).await
        });

        // Let the engine reach the paused checkpoint, then release it.
        tokio::task::yield_now().await;
        control.resume();

        let outcome = crawl.await.unwrap().unwrap();
        assert_eq!(outcome.state, CrawlState::Done);
        assert_eq!(outcome.snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_open_failure_is_fatal() {
        let mut session = FakeCatalog::new(0, 2);
        session.fail_open = true;
        let mut engine = detached_engine();

        let result = engine.run(&mut session).await;

        assert!(result.is_err());
        assert_eq!(engine.state(), CrawlState::Failed);
    }

    #[tokio::test]
    async fn test_links_deduplicated_preserving_order() {
        struct DupCatalog;

        #[async_trait]
        impl CatalogSession for DupCatalog {
            async fn open(&mut self, _url: &str) -> crate::error::Result<()> {
                Ok(())
            }
            async fn item_link_count(&mut self) -> crate::error::Result<usize> {
                Ok(3)
            }
            async fn item_links(&mut self) -> crate::error::Result<Vec<String>> {
                Ok(vec![
                    "/exchange/7/overview".to_string(),
                    "/exchange/5/overview".to_string(),
                    "/exchange/7/overview".to_string(),
                    "/exchange/9/reviews".to_string(),
                ])
            }
            async fn click_any(&mut self, _s: &[String]) -> crate::error::Result<bool> {
                Ok(false)
            }
            async fn scroll_to_bottom(&mut self) -> crate::error::Result<()> {
                Ok(())
            }
            async fn fetch_item(&mut self, _url: &str) -> crate::error::Result<FetchedPage> {
                Ok(FetchedPage::default())
            }
        }

        let mut engine = detached_engine();
        let outcome = engine.run(&mut DupCatalog).await.unwrap();

        let identities: Vec<u64> = outcome.snapshot.iter().map(|r| r.identity).collect();
        assert_eq!(identities, vec![7, 5]);
    }
}
