//! Crawler coordinator - main crawl orchestration logic
//!
//! The control loop owns the frontier, the report and the storage handle. Fetches run
//! as futures in an in-flight set (at most one per origin, at most
//! `max-concurrent-origins` overall); their results come back to the loop, which is
//! the only place frontier and storage are mutated.

use crate::config::Config;
use crate::crawler::{CrawlFrontier, FetchedPage, FrontierEntry, Origin, Pacer, Transport};
use crate::extract::{Document, Extraction, ExtractorRegistry};
use crate::output::RunReport;
use crate::robots::PolitenessGate;
use crate::state::UrlState;
use crate::storage::{RunStatus, Storage};
use crate::url::{host_key, is_ignored_path, normalize_url};
use crate::CrawlError;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of the network half of a dispatch
#[derive(Debug)]
enum Fetch {
    Denied,
    Failed(String),
    Fetched(FetchedPage),
}

/// The crawl loop
pub struct Orchestrator<S: Storage> {
    frontier: CrawlFrontier,
    registry: ExtractorRegistry,
    gate: Arc<PolitenessGate>,
    pacer: Arc<Pacer>,
    transport: Arc<dyn Transport>,
    storage: S,
    report: RunReport,
    run_id: i64,
    max_pages: u64,
    concurrency: usize,
    fetch_timeout: Duration,
    ignored_paths: Vec<String>,
}

impl<S: Storage> Orchestrator<S> {
    /// Creates an orchestrator with every configured seed queued
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `transport` - Used for pages and robots.txt
    /// * `storage` - Receives documents, links and run bookkeeping
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(CrawlError)` - A seed is not a valid URL or no site covers its host
    pub fn new(config: &Config, transport: Arc<dyn Transport>, storage: S) -> Result<Self, CrawlError> {
        let registry = ExtractorRegistry::from_sites(&config.sites);
        let mut frontier = CrawlFrontier::new(config.crawler.extraction_quota);

        for seed in config.seeds() {
            let url = normalize_url(seed)?;
            if registry.resolve(&url).is_none() {
                return Err(CrawlError::NoExtractor {
                    url: url.to_string(),
                });
            }
            frontier.enqueue_seed(url);
        }

        let gate = PolitenessGate::new(
            Arc::clone(&transport),
            config.user_agent.crawler_name.clone(),
            &config.crawler,
        );

        Ok(Self {
            frontier,
            registry,
            gate: Arc::new(gate),
            pacer: Arc::new(Pacer::new()),
            transport,
            storage,
            report: RunReport::new(),
            run_id: 0,
            max_pages: u64::from(config.crawler.max_pages),
            concurrency: config.crawler.max_concurrent_origins.max(1) as usize,
            fetch_timeout: Duration::from_secs(config.crawler.fetch_timeout_secs),
            ignored_paths: config.crawler.ignored_paths.clone(),
        })
    }

    pub fn frontier(&self) -> &CrawlFrontier {
        &self.frontier
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Consumes the orchestrator, handing back its storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs until the frontier is exhausted or the page budget is reached
    pub async fn run(&mut self, config_hash: &str) -> Result<RunReport, CrawlError> {
        self.run_until(config_hash, futures::future::pending::<()>())
            .await
    }

    /// Runs until the frontier is exhausted, the page budget is reached, or `shutdown`
    /// completes
    ///
    /// Fetches still in flight when the loop stops are dropped. Only a failure to open
    /// the run in storage is returned as an error; everything after that is recorded
    /// in the report.
    pub async fn run_until<F>(&mut self, config_hash: &str, shutdown: F) -> Result<RunReport, CrawlError>
    where
        F: Future<Output = ()>,
    {
        self.run_id = self.storage.begin_run(config_hash)?;
        tracing::info!(
            "Starting crawl run {} with {} origins (budget {}, concurrency {})",
            self.run_id,
            self.frontier.origin_count(),
            self.max_pages,
            self.concurrency
        );

        let start_time = Instant::now();
        let mut in_flight: FuturesUnordered<BoxFuture<'static, (FrontierEntry, Fetch)>> =
            FuturesUnordered::new();
        let mut busy: HashSet<Origin> = HashSet::new();
        tokio::pin!(shutdown);

        loop {
            if self.budget_reached() {
                tracing::info!("Page budget of {} reached", self.max_pages);
                self.report.budget_reached = true;
                break;
            }

            while in_flight.len() < self.concurrency {
                let Some(entry) = self.frontier.next_matching(|origin| !busy.contains(origin)) else {
                    break;
                };
                if !self.frontier.mark_visited(&entry.url) {
                    tracing::debug!("Skipping already visited {}", entry.url);
                    self.report.duplicates_skipped += 1;
                    continue;
                }

                tracing::trace!("Dispatching {} (origin {})", entry.url, entry.origin);
                busy.insert(entry.origin.clone());
                in_flight.push(self.dispatch(entry));
            }

            if in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, dropping {} in-flight fetches", in_flight.len());
                    self.report.interrupted = true;
                    break;
                }
                Some((entry, fetch)) = in_flight.next() => {
                    busy.remove(&entry.origin);
                    self.complete(entry, fetch);

                    if self.report.visited % 10 == 0 {
                        tracing::info!(
                            "Progress: {} visited, {} saved, {} pending",
                            self.report.visited,
                            self.report.saved,
                            self.frontier.pending()
                        );
                    }
                }
            }
        }

        let status = if self.report.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        if let Err(e) = self.storage.finish_run(self.run_id, status, &self.report) {
            tracing::warn!("Failed to close run {}: {}", self.run_id, e);
        }

        tracing::info!(
            "Crawl run {} finished: {} visited, {} saved, {} skipped, {} ignored in {:?}",
            self.run_id,
            self.report.visited,
            self.report.saved,
            self.report.skipped(),
            self.report.ignored(),
            start_time.elapsed()
        );

        Ok(self.report.clone())
    }

    fn budget_reached(&self) -> bool {
        self.report.saved >= self.max_pages
    }

    /// Builds the network half of a dispatch: robots check, politeness wait, fetch
    fn dispatch(&self, entry: FrontierEntry) -> BoxFuture<'static, (FrontierEntry, Fetch)> {
        let gate = Arc::clone(&self.gate);
        let pacer = Arc::clone(&self.pacer);
        let transport = Arc::clone(&self.transport);
        let fetch_timeout = self.fetch_timeout;

        async move {
            let url = &entry.url;
            let fetch = if !gate.can_fetch(url).await {
                Fetch::Denied
            } else {
                let delay = gate.delay_for(url).await;
                pacer.wait_turn(&host_key(url), delay).await;

                tracing::debug!("Fetching {}", url);
                match tokio::time::timeout(fetch_timeout, transport.fetch(url)).await {
                    Ok(Ok(page)) if page.is_success() => Fetch::Fetched(page),
                    Ok(Ok(page)) => Fetch::Failed(format!("HTTP {}", page.status)),
                    Ok(Err(e)) => Fetch::Failed(e.to_string()),
                    Err(_) => Fetch::Failed(format!("request to {} timed out", url)),
                }
            };
            (entry, fetch)
        }
        .boxed()
    }

    /// Interprets a finished dispatch and records the URL's terminal state
    fn complete(&mut self, entry: FrontierEntry, fetch: Fetch) {
        let (state, detail) = match fetch {
            Fetch::Denied => {
                tracing::info!("{} disallowed by robots.txt", entry.url);
                (UrlState::Denied, Some("disallowed by robots.txt".to_string()))
            }
            Fetch::Failed(reason) => {
                tracing::warn!("Failed to fetch {}: {}", entry.url, reason);
                (UrlState::Failed, Some(reason))
            }
            Fetch::Fetched(page) => self.handle_page(&entry, &page),
        };

        self.report.record(state);
        if let Err(e) = self.storage.record_visit(
            self.run_id,
            &entry.url,
            &entry.origin,
            state,
            detail.as_deref(),
        ) {
            tracing::warn!("Failed to record visit of {}: {}", entry.url, e);
        }
    }

    fn handle_page(&mut self, entry: &FrontierEntry, page: &FetchedPage) -> (UrlState, Option<String>) {
        let Some(kind) = self.registry.resolve(entry.origin.seed()) else {
            tracing::warn!("No extractor covers the origin of {}", entry.url);
            return (UrlState::Unrecognized, Some("no extractor for origin host".to_string()));
        };

        tracing::debug!("Extracting {} with the {} extractor", entry.url, kind);
        match kind.process(&page.body, &entry.url, entry.is_seed) {
            Extraction::Links(links) => {
                let accepted = self.accept_links(entry, links);
                (UrlState::LinksFound, Some(format!("{} links accepted", accepted)))
            }
            Extraction::Document(document) => self.store_document(document),
            Extraction::Combined { links, document } => {
                self.accept_links(entry, links);
                self.store_document(document)
            }
            Extraction::Empty => {
                tracing::debug!("Nothing to extract from {}", entry.url);
                (UrlState::Empty, None)
            }
            Extraction::Unrecognized => {
                tracing::warn!("Unrecognized page shape at {}", entry.url);
                (UrlState::Unrecognized, None)
            }
        }
    }

    /// Feeds discovered links to the frontier and records the accepted ones
    fn accept_links(&mut self, entry: &FrontierEntry, links: Vec<url::Url>) -> usize {
        let (ignored, kept): (Vec<_>, Vec<_>) = links
            .into_iter()
            .partition(|link| is_ignored_path(link, &self.ignored_paths));
        if !ignored.is_empty() {
            tracing::debug!("Dropped {} links under ignored paths", ignored.len());
        }

        let offered = kept.len();
        let accepted = self.frontier.enqueue_discovered(&entry.origin, kept);
        let rejected = offered - accepted.len();
        if rejected > 0 {
            tracing::debug!(
                "{} of {} links from {} were known or over quota",
                rejected,
                offered,
                entry.url
            );
        }

        self.report.links_ignored += ignored.len() as u64;
        self.report.links_accepted += accepted.len() as u64;
        self.report.links_rejected += rejected as u64;

        if !accepted.is_empty() {
            if let Err(e) = self
                .storage
                .save_discovered_links(self.run_id, &entry.origin, &accepted)
            {
                tracing::warn!("Failed to record links from {}: {}", entry.url, e);
            }
        }

        accepted.len()
    }

    fn store_document(&mut self, document: Document) -> (UrlState, Option<String>) {
        let url = &document.metadata.url;

        if self.budget_reached() {
            tracing::debug!("Budget reached, not saving {}", url);
            return (UrlState::BudgetExhausted, None);
        }

        match self.storage.is_already_saved(url, &document.metadata) {
            Ok(true) => {
                tracing::info!("{} is already archived", url);
                return (UrlState::AlreadySaved, None);
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not check archive for {}: {}", url, e),
        }

        match self.storage.save(self.run_id, &document) {
            Ok(saved) => (UrlState::DocumentSaved, Some(saved.path.display().to_string())),
            Err(e) => {
                tracing::warn!("Failed to save {}: {}", url, e);
                (UrlState::Failed, Some(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, OutputConfig, SiteEntry, UserAgentConfig};
    use crate::crawler::TransportError;
    use crate::extract::{ExtractorKind, Metadata};
    use crate::storage::{SavedDocument, StorageResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use url::Url;

    const WIKI: &str = "https://pl.wikipedia.org";

    /// Serves canned responses and records every requested URL
    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, Result<(u16, String), TransportError>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn page(mut self, url: &str, body: String) -> Self {
            self.responses.insert(url.to_string(), Ok((200, body)));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_string(), Ok((status, String::new())));
            self
        }

        fn error(mut self, url: &str, error: TransportError) -> Self {
            self.responses.insert(url.to_string(), Err(error));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn was_fetched(&self, url: &str) -> bool {
            self.calls().iter().any(|call| call == url)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, TransportError> {
            self.calls.lock().unwrap().push(url.to_string());
            let (status, body) = match self.responses.get(url.as_str()) {
                Some(Ok(response)) => response.clone(),
                Some(Err(e)) => return Err(e.clone()),
                None => (404, String::new()),
            };
            Ok(FetchedPage {
                final_url: url.clone(),
                status,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body,
            })
        }
    }

    /// Keeps everything in memory
    #[derive(Default)]
    struct RecordingStorage {
        saved: Vec<Document>,
        preexisting: HashSet<String>,
        links: Vec<Url>,
        visits: Vec<(String, UrlState)>,
        finished: Option<RunStatus>,
    }

    impl RecordingStorage {
        fn saved_urls(&self) -> Vec<String> {
            self.saved
                .iter()
                .map(|doc| doc.metadata.url.to_string())
                .collect()
        }

        fn state_of(&self, url: &str) -> Option<UrlState> {
            self.visits
                .iter()
                .find(|(visited, _)| visited == url)
                .map(|(_, state)| *state)
        }
    }

    impl Storage for RecordingStorage {
        fn begin_run(&mut self, _config_hash: &str) -> StorageResult<i64> {
            Ok(1)
        }

        fn record_visit(
            &mut self,
            _run_id: i64,
            url: &Url,
            _origin: &Origin,
            state: UrlState,
            _detail: Option<&str>,
        ) -> StorageResult<()> {
            self.visits.push((url.to_string(), state));
            Ok(())
        }

        fn finish_run(&mut self, _run_id: i64, status: RunStatus, _report: &RunReport) -> StorageResult<()> {
            self.finished = Some(status);
            Ok(())
        }

        fn save(&mut self, _run_id: i64, document: &Document) -> StorageResult<SavedDocument> {
            self.saved.push(document.clone());
            Ok(SavedDocument {
                path: PathBuf::from(format!("{}.txt", self.saved.len())),
                created: true,
            })
        }

        fn is_already_saved(&self, url: &Url, _metadata: &Metadata) -> StorageResult<bool> {
            Ok(self.preexisting.contains(url.as_str())
                || self.saved.iter().any(|doc| &doc.metadata.url == url))
        }

        fn save_discovered_links(
            &mut self,
            _run_id: i64,
            _origin: &Origin,
            links: &[Url],
        ) -> StorageResult<Vec<Url>> {
            self.links.extend_from_slice(links);
            Ok(links.to_vec())
        }
    }

    fn create_test_config(seeds: &[&str]) -> Config {
        Config {
            crawler: CrawlerConfig {
                max_pages: 10,
                extraction_quota: 10,
                minimum_delay_ms: 0,
                fetch_timeout_secs: 5,
                robots_timeout_secs: 5,
                max_crawl_delay_secs: 60,
                robots_fallback: Default::default(),
                max_concurrent_origins: 1,
                ignored_paths: Vec::new(),
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                data_dir: "./data".to_string(),
                database_path: "./test.db".to_string(),
            },
            sites: vec![SiteEntry {
                domain: "*.wikipedia.org".to_string(),
                extractor: ExtractorKind::Encyclopedia,
                seeds: seeds.iter().map(|s| s.to_string()).collect(),
            }],
        }
    }

    fn wiki(path: &str) -> String {
        format!("{}{}", WIKI, path)
    }

    fn article(title: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#" <a href="{}">{}</a>"#, href, href.trim_start_matches("/wiki/")))
            .collect();
        format!(
            r#"<html lang="pl"><head><title>{title}</title></head><body>
            <div id="mw-content-text"><p>{title} to postać z mitologii greckiej.{anchors}</p></div>
            </body></html>"#
        )
    }

    fn robots_allowing_all() -> String {
        "User-agent: *\nAllow: /\n".to_string()
    }

    async fn run(config: &Config, transport: Arc<FakeTransport>, storage: RecordingStorage) -> (RunReport, RecordingStorage) {
        let mut orchestrator = Orchestrator::new(config, transport, storage).unwrap();
        let report = orchestrator.run("hash").await.unwrap();
        (report, orchestrator.into_storage())
    }

    #[tokio::test]
    async fn test_seed_links_are_followed_and_saved() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera", "/wiki/Ares"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[]))
                .page(&wiki("/wiki/Ares"), article("Ares", &[])),
        );

        let (report, storage) = run(&config, transport, RecordingStorage::default()).await;

        assert_eq!(report.visited, 3);
        assert_eq!(report.saved, 3);
        assert_eq!(report.links_accepted, 2);
        assert_eq!(
            storage.saved_urls(),
            vec![wiki("/wiki/Zeus"), wiki("/wiki/Hera"), wiki("/wiki/Ares")]
        );
        assert_eq!(storage.links.len(), 2);
        assert_eq!(storage.finished, Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_denied_url_is_never_fetched() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), "User-agent: *\nDisallow: /wiki/Tajne\n".to_string())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Tajne", "/wiki/Hera"]))
                .page(&wiki("/wiki/Tajne"), article("Tajne", &[]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[])),
        );

        let (report, storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert!(!transport.was_fetched(&wiki("/wiki/Tajne")));
        assert_eq!(report.denied, 1);
        assert_eq!(storage.state_of(&wiki("/wiki/Tajne")), Some(UrlState::Denied));
        assert!(!storage.saved_urls().contains(&wiki("/wiki/Tajne")));
        assert_eq!(report.visited, 3);
    }

    #[tokio::test]
    async fn test_already_saved_is_not_saved_again_but_links_are_mined() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[])),
        );
        let storage = RecordingStorage {
            preexisting: [wiki("/wiki/Zeus")].into_iter().collect(),
            ..Default::default()
        };

        let (report, storage) = run(&config, transport, storage).await;

        assert_eq!(storage.saved_urls(), vec![wiki("/wiki/Hera")]);
        assert_eq!(storage.state_of(&wiki("/wiki/Zeus")), Some(UrlState::AlreadySaved));
        assert_eq!(report.already_saved, 1);
        assert_eq!(report.links_accepted, 1);
    }

    #[test]
    fn test_extractor_follows_origin_host() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let mut orchestrator =
            Orchestrator::new(&config, Arc::new(FakeTransport::default()), RecordingStorage::default()).unwrap();

        let url = Url::parse("https://mirror.example.org/wiki/Hera").unwrap();
        let entry = FrontierEntry {
            url: url.clone(),
            origin: Origin::new(Url::parse(&wiki("/wiki/Zeus")).unwrap()),
            is_seed: false,
        };
        let page = FetchedPage {
            final_url: url,
            status: 200,
            content_type: Some("text/html".to_string()),
            body: article("Hera", &[]),
        };

        let (state, _) = orchestrator.handle_page(&entry, &page);
        assert_eq!(state, UrlState::DocumentSaved);
    }

    #[tokio::test]
    async fn test_huge_crawl_delay_does_not_stall_run() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), "User-agent: *\nCrawl-delay: 1.8e19\n".to_string())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &[])),
        );

        let (report, storage) = tokio::time::timeout(
            Duration::from_secs(5),
            run(&config, transport, RecordingStorage::default()),
        )
        .await
        .expect("run should finish");

        assert_eq!(report.saved, 1);
        assert_eq!(storage.finished, Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_transport_timeout_is_skipped() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera", "/wiki/Ares"]))
                .error(
                    &wiki("/wiki/Hera"),
                    TransportError::Timeout {
                        url: wiki("/wiki/Hera"),
                    },
                )
                .page(&wiki("/wiki/Ares"), article("Ares", &[])),
        );

        let (report, storage) = run(&config, transport, RecordingStorage::default()).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.saved, 2);
        assert_eq!(storage.state_of(&wiki("/wiki/Hera")), Some(UrlState::Failed));
        assert_eq!(storage.finished, Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_non_200_is_failed() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .status(&wiki("/wiki/Zeus"), 503),
        );

        let (report, storage) = run(&config, transport, RecordingStorage::default()).await;

        assert_eq!(report.failed, 1);
        assert!(storage.saved.is_empty());
    }

    #[tokio::test]
    async fn test_budget_stops_the_run() {
        let mut config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        config.crawler.max_pages = 2;
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera", "/wiki/Ares"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[]))
                .page(&wiki("/wiki/Ares"), article("Ares", &[])),
        );

        let (report, storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert_eq!(report.saved, 2);
        assert!(report.budget_reached);
        assert_eq!(storage.saved.len(), 2);
        assert!(!transport.was_fetched(&wiki("/wiki/Ares")));
    }

    #[tokio::test]
    async fn test_quota_limits_discovered_links() {
        let mut config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        config.crawler.extraction_quota = 1;
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera", "/wiki/Ares"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[])),
        );

        let (report, storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert_eq!(report.links_accepted, 1);
        assert_eq!(report.links_rejected, 1);
        assert_eq!(storage.links, vec![Url::parse(&wiki("/wiki/Hera")).unwrap()]);
        assert!(!transport.was_fetched(&wiki("/wiki/Ares")));
    }

    #[tokio::test]
    async fn test_ignored_paths_are_not_enqueued() {
        let mut config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        config.crawler.ignored_paths = vec!["/wiki/Ares".to_string()];
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera", "/wiki/Ares"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[])),
        );

        let (report, _storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert_eq!(report.links_ignored, 1);
        assert_eq!(report.links_accepted, 1);
        assert!(!transport.was_fetched(&wiki("/wiki/Ares")));
    }

    #[tokio::test]
    async fn test_unreachable_robots_denies_by_default() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .status(&wiki("/robots.txt"), 500)
                .page(&wiki("/wiki/Zeus"), article("Zeus", &[])),
        );

        let (report, _storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert_eq!(report.denied, 1);
        assert_eq!(transport.calls(), vec![wiki("/robots.txt")]);
    }

    #[tokio::test]
    async fn test_unrecognized_page_is_skipped() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), "<html><body><p>Strona</p></body></html>".to_string()),
        );

        let (report, storage) = run(&config, transport, RecordingStorage::default()).await;

        assert_eq!(report.unrecognized, 1);
        assert_eq!(storage.state_of(&wiki("/wiki/Zeus")), Some(UrlState::Unrecognized));
    }

    #[tokio::test]
    async fn test_concurrent_origins_all_complete() {
        let mut config = create_test_config(&[
            "https://pl.wikipedia.org/wiki/Zeus",
            "https://pl.wikipedia.org/wiki/Posejdon",
        ]);
        config.crawler.max_concurrent_origins = 2;
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &["/wiki/Hera"]))
                .page(&wiki("/wiki/Posejdon"), article("Posejdon", &["/wiki/Hera", "/wiki/Ares"]))
                .page(&wiki("/wiki/Hera"), article("Hera", &[]))
                .page(&wiki("/wiki/Ares"), article("Ares", &[])),
        );

        let (report, storage) = run(&config, Arc::clone(&transport), RecordingStorage::default()).await;

        assert_eq!(report.visited, 4);
        assert_eq!(report.saved, 4);
        assert_eq!(storage.saved.len(), 4);
        assert_eq!(
            transport.calls().iter().filter(|c| c.ends_with("/robots.txt")).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_the_run() {
        let config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        let transport = Arc::new(
            FakeTransport::default()
                .page(&wiki("/robots.txt"), robots_allowing_all())
                .page(&wiki("/wiki/Zeus"), article("Zeus", &[])),
        );

        let mut orchestrator =
            Orchestrator::new(&config, transport, RecordingStorage::default()).unwrap();
        let report = orchestrator
            .run_until("hash", futures::future::ready(()))
            .await
            .unwrap();

        assert!(report.interrupted);
        assert_eq!(report.visited, 0);
        assert_eq!(orchestrator.storage().finished, Some(RunStatus::Interrupted));
    }

    #[test]
    fn test_seed_without_site_is_rejected() {
        let mut config = create_test_config(&["https://pl.wikipedia.org/wiki/Zeus"]);
        config.sites[0].seeds.push("https://example.com/".to_string());

        let result = Orchestrator::new(
            &config,
            Arc::new(FakeTransport::default()),
            RecordingStorage::default(),
        );
        assert!(matches!(result, Err(CrawlError::NoExtractor { .. })));
    }

    #[test]
    fn test_duplicate_seeds_queued_once() {
        let config = create_test_config(&[
            "https://pl.wikipedia.org/wiki/Zeus",
            "https://pl.wikipedia.org/wiki/Zeus#Mity",
        ]);
        let orchestrator = Orchestrator::new(
            &config,
            Arc::new(FakeTransport::default()),
            RecordingStorage::default(),
        )
        .unwrap();
        assert_eq!(orchestrator.frontier().origin_count(), 1);
    }
}
