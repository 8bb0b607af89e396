//! Politeness gate
//!
//! Caches one robots policy per scheme+host(+port) for the lifetime of a run and
//! answers whether a URL may be fetched and how long to wait between fetches.

use crate::config::{CrawlerConfig, RobotsFallback};
use crate::crawler::Transport;
use crate::robots::ParsedRobots;
use crate::url::host_key;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

type PolicyCell = Arc<OnceCell<ParsedRobots>>;

/// Per-host robots cache with single-flight policy fetches
pub struct PolitenessGate {
    transport: Arc<dyn Transport>,
    agent: String,
    fallback: RobotsFallback,
    minimum_delay: Duration,
    max_crawl_delay: Duration,
    robots_timeout: Duration,
    policies: Mutex<HashMap<String, PolicyCell>>,
}

impl PolitenessGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `transport` - Used for robots.txt fetches
    /// * `agent` - Product token matched against robots.txt user-agent groups
    /// * `crawler` - Supplies the minimum delay, robots timeout and fallback policy
    pub fn new(transport: Arc<dyn Transport>, agent: impl Into<String>, crawler: &CrawlerConfig) -> Self {
        Self {
            transport,
            agent: agent.into(),
            fallback: crawler.robots_fallback,
            minimum_delay: Duration::from_millis(crawler.minimum_delay_ms),
            max_crawl_delay: Duration::from_secs(crawler.max_crawl_delay_secs),
            robots_timeout: Duration::from_secs(crawler.robots_timeout_secs),
            policies: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if robots.txt for the URL's host permits fetching it
    pub async fn can_fetch(&self, url: &Url) -> bool {
        let policy = self.policy_for(url).await;
        policy.is_allowed(url.as_str(), &self.agent)
    }

    /// Returns the interval to keep between two fetch starts on the URL's host
    ///
    /// This is the larger of the configured minimum delay and the host's crawl-delay,
    /// with the crawl-delay capped at `max-crawl-delay-secs`.
    pub async fn delay_for(&self, url: &Url) -> Duration {
        let policy = self.policy_for(url).await;
        let crawl_delay = match policy.crawl_delay(&self.agent) {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(delay) if delay <= self.max_crawl_delay => delay,
                _ => {
                    tracing::warn!(
                        "Crawl-delay of {}s for {} capped at {:?}",
                        secs,
                        host_key(url),
                        self.max_crawl_delay
                    );
                    if secs > 0.0 {
                        self.max_crawl_delay
                    } else {
                        Duration::ZERO
                    }
                }
            },
            None => Duration::ZERO,
        };
        self.minimum_delay.max(crawl_delay)
    }

    /// Number of hosts with a cached (or in-progress) policy
    pub fn cached_hosts(&self) -> usize {
        self.policies.lock().map(|p| p.len()).unwrap_or(0)
    }

    async fn policy_for(&self, url: &Url) -> ParsedRobots {
        let key = host_key(url);
        let cell = {
            let mut policies = match self.policies.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            policies.entry(key.clone()).or_default().clone()
        };

        cell.get_or_init(|| self.fetch_policy(key)).await.clone()
    }

    async fn fetch_policy(&self, key: String) -> ParsedRobots {
        let robots_url = match Url::parse(&format!("{}/robots.txt", key)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", key, e);
                return self.fallback_policy();
            }
        };

        tracing::info!("Fetching {}", robots_url);
        let fetched =
            tokio::time::timeout(self.robots_timeout, self.transport.fetch(&robots_url)).await;

        match fetched {
            Ok(Ok(page)) => match page.status {
                200..=299 => ParsedRobots::from_content(&page.body),
                401 | 403 => {
                    tracing::info!("robots.txt for {} is restricted ({}), disallowing host", key, page.status);
                    ParsedRobots::deny_all()
                }
                400..=499 => {
                    tracing::debug!("No robots.txt for {} ({})", key, page.status);
                    ParsedRobots::allow_all()
                }
                status => {
                    tracing::warn!("robots.txt for {} returned {}, applying fallback", key, status);
                    self.fallback_policy()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!("Failed to fetch robots.txt for {}: {}", key, e);
                self.fallback_policy()
            }
            Err(_) => {
                tracing::warn!("robots.txt fetch for {} timed out, applying fallback", key);
                self.fallback_policy()
            }
        }
    }

    fn fallback_policy(&self) -> ParsedRobots {
        match self.fallback {
            RobotsFallback::Deny => ParsedRobots::deny_all(),
            RobotsFallback::Allow => ParsedRobots::allow_all(),
        }
    }
}
