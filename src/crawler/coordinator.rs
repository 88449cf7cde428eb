//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Loading robots.txt once for the crawl origin
//! - Managing the frontier queue
//! - Dispatching fetches to a bounded pool of worker tasks
//! - Folding fetch results back into the frontier
//! - Handling cancellation and the optional time budget

use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, fetch, FetchOutcome, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::output::CrawlStats;
use crate::robots::{load_robots, RobotsPolicy};
use crate::url::{canonicalize_absolute, is_internal, origin_authority, CanonicalUrl};
use crate::{ConfigError, SitemapError};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of a crawl: the visited URLs in sorted order plus statistics
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub urls: Vec<CanonicalUrl>,
    pub stats: CrawlStats,
}

/// What a worker hands back to the coordinator after visiting one URL
#[derive(Debug)]
enum PageReport {
    /// HTML was fetched and parsed
    Expanded {
        url: CanonicalUrl,
        links: Vec<String>,
    },
    NonHtml {
        url: CanonicalUrl,
        content_type: String,
    },
    /// The server pointed somewhere else; the target is treated as a link
    Redirected {
        url: CanonicalUrl,
        location: Url,
    },
    Failed {
        url: CanonicalUrl,
        reason: String,
    },
}

/// Main crawler coordinator structure
///
/// The coordinator is the only owner of the [`Frontier`]. Fetch workers run on
/// a [`JoinSet`] and report back through [`PageReport`] values.
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    retry: RetryPolicy,
    seed: CanonicalUrl,
    origin_host: String,
    frontier: Frontier,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(SitemapError)` - The configuration is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self, SitemapError> {
        validate(&config)?;

        let seed = canonicalize_absolute(&config.crawler.seed_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Seed URL '{}': {}", config.crawler.seed_url, e))
        })?;

        let origin_host = origin_authority(&seed).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed))
        })?;

        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
        let retry = RetryPolicy::from(&config.retry);
        let frontier = Frontier::new(seed.clone(), config.crawler.max_pages);

        Ok(Self {
            config: Arc::new(config),
            client,
            retry,
            seed,
            origin_host,
            frontier,
            stats: CrawlStats::default(),
        })
    }

    /// Runs the crawl to completion
    pub async fn run(self) -> CrawlResult {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Runs the crawl until the frontier is exhausted, the visit limit is
    /// reached, or `cancel` fires
    ///
    /// Cancellation stops new dispatches; fetches already in flight are
    /// allowed to finish and the partial result is returned with
    /// `stats.cancelled` set.
    pub async fn run_with_cancellation(mut self, cancel: CancellationToken) -> CrawlResult {
        let started = Instant::now();
        let token = cancel.child_token();
        let deadline = self.spawn_deadline(&token);

        tracing::info!(
            seed = %self.seed,
            max_pages = self.config.crawler.max_pages,
            concurrency = self.config.crawler.concurrency,
            "Starting crawl"
        );

        let robots = load_robots(&self.client, self.seed.as_url()).await;
        polite_sleep(self.config.crawler.request_delay(), &token).await;

        self.crawl_loop(&robots, &token, started).await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        self.finish(&robots, token.is_cancelled(), started)
    }

    async fn crawl_loop(
        &mut self,
        robots: &RobotsPolicy,
        token: &CancellationToken,
        started: Instant,
    ) {
        let concurrency = self.config.crawler.concurrency.max(1);
        let mut workers: JoinSet<PageReport> = JoinSet::new();
        let mut cancel_logged = false;

        loop {
            while !token.is_cancelled() && workers.len() < concurrency {
                let Some(url) = self.next_dispatchable(robots) else {
                    break;
                };

                tracing::debug!(url = %url, in_flight = workers.len() + 1, "Dispatching fetch");
                workers.spawn(visit_page(
                    self.client.clone(),
                    url,
                    self.retry.clone(),
                    self.config.crawler.request_delay(),
                    token.clone(),
                ));
            }

            if workers.is_empty() {
                break;
            }

            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(report)) => {
                        self.absorb(report);
                        self.log_progress(started);
                    }
                    Some(Err(e)) => tracing::error!("Fetch worker failed: {}", e),
                    None => break,
                },
                _ = token.cancelled(), if !cancel_logged => {
                    cancel_logged = true;
                    tracing::warn!(
                        in_flight = workers.len(),
                        "Crawl cancelled, waiting for in-flight fetches"
                    );
                }
            }
        }
    }

    /// Pops queued URLs until one is eligible for fetching and marks it visited
    ///
    /// Already-visited URLs are skipped silently. Robots-disallowed URLs are
    /// counted and skipped; they stay discovered and are never re-queued.
    fn next_dispatchable(&mut self, robots: &RobotsPolicy) -> Option<CanonicalUrl> {
        let agent = &self.config.user_agent.crawler_name;

        while let Some(queued) = self.frontier.next_pending() {
            let url = match canonicalize_absolute(queued.as_str()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(url = %queued, error = %e, "Dropping queued URL");
                    self.stats.links_invalid += 1;
                    continue;
                }
            };

            if self.frontier.is_visited(&url) {
                continue;
            }

            if !robots.allows(agent, &url) {
                tracing::info!(url = %url, "Skipping URL disallowed by robots.txt");
                self.stats.robots_excluded += 1;
                continue;
            }

            if self.frontier.mark_visited(url.clone()) {
                return Some(url);
            }
        }

        None
    }

    /// Folds a worker's report into the frontier and statistics
    fn absorb(&mut self, report: PageReport) {
        match report {
            PageReport::Expanded { url, links } => {
                self.stats.pages_expanded += 1;
                let found = links.len();
                let admitted = self.admit_links(links);
                tracing::debug!(url = %url, found, admitted, "Expanded page");
            }
            PageReport::NonHtml { url, content_type } => {
                self.stats.non_html += 1;
                tracing::debug!(url = %url, content_type, "Not HTML, links not extracted");
            }
            PageReport::Redirected { url, location } => {
                self.stats.redirects += 1;
                let admitted = self.admit_links(vec![location.to_string()]);
                tracing::debug!(url = %url, location = %location, admitted, "Redirected");
            }
            PageReport::Failed { url, reason } => {
                self.stats.fetch_failures += 1;
                tracing::warn!(url = %url, reason, "Fetch failed");
            }
        }
    }

    fn admit_links(&mut self, links: Vec<String>) -> usize {
        let mut admitted = 0;

        for link in links {
            let url = match canonicalize_absolute(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(link, error = %e, "Ignoring link");
                    self.stats.links_invalid += 1;
                    continue;
                }
            };

            if !is_internal(&url, &self.origin_host) {
                self.stats.links_external += 1;
                continue;
            }

            if self.frontier.admit(url) {
                admitted += 1;
            }
        }

        self.stats.links_admitted += admitted;
        admitted
    }

    fn log_progress(&self, started: Instant) {
        let visited = self.frontier.visited_len();
        if visited == 0 || visited % 10 != 0 {
            return;
        }

        let rate = visited as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            "Progress: {} pages visited, {} in frontier, {:.2} pages/sec",
            visited,
            self.frontier.queued_len(),
            rate
        );
    }

    /// Cancels the crawl token once the configured time budget elapses
    fn spawn_deadline(&self, token: &CancellationToken) -> Option<tokio::task::JoinHandle<()>> {
        let budget = self.config.crawler.max_duration()?;
        let token = token.clone();

        Some(tokio::spawn(async move {
            tokio::time::sleep(budget).await;
            tracing::warn!(?budget, "Crawl time budget exhausted");
            token.cancel();
        }))
    }

    fn finish(mut self, robots: &RobotsPolicy, cancelled: bool, started: Instant) -> CrawlResult {
        let agent = &self.config.user_agent.crawler_name;
        let mut fetchable = 0;
        for url in self.frontier.drain() {
            if self.frontier.is_visited(&url) {
                continue;
            }
            if robots.allows(agent, &url) {
                fetchable += 1;
            } else {
                self.stats.robots_excluded += 1;
            }
        }

        self.stats.pending_discarded = fetchable;
        self.stats.truncated = self.frontier.limit_reached() && fetchable > 0;
        self.stats.cancelled = cancelled;
        self.stats.visited = self.frontier.visited_len();
        self.stats.elapsed = started.elapsed();

        if self.stats.truncated {
            tracing::warn!(
                limit = self.config.crawler.max_pages,
                discarded = self.stats.pending_discarded,
                "Visit limit reached, sitemap is truncated"
            );
        }

        self.stats.log_summary();

        CrawlResult {
            urls: self.frontier.into_sorted_urls(),
            stats: self.stats,
        }
    }
}

/// Fetches one URL, extracts its links, then waits out the politeness delay
async fn visit_page(
    client: Client,
    url: CanonicalUrl,
    retry: RetryPolicy,
    delay: Duration,
    cancel: CancellationToken,
) -> PageReport {
    let report = match fetch(&client, &url, &retry).await {
        FetchOutcome::HtmlPage { body, final_url } => {
            let base = Url::parse(&final_url).unwrap_or_else(|_| url.as_url().clone());
            let links = extract_links(&body, &base);
            PageReport::Expanded { url, links }
        }
        FetchOutcome::NonHtml { content_type } => PageReport::NonHtml { url, content_type },
        FetchOutcome::Redirect { location } => PageReport::Redirected { url, location },
        FetchOutcome::HttpError { status } => PageReport::Failed {
            url,
            reason: format!("HTTP {}", status),
        },
        FetchOutcome::TransportError { cause } => PageReport::Failed { url, reason: cause },
    };

    polite_sleep(delay, &cancel).await;
    report
}

/// Sleeps for `delay` unless the crawl is cancelled first
async fn polite_sleep(delay: Duration, cancel: &CancellationToken) {
    if delay.is_zero() {
        return;
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {}
    }
}

/// Runs a complete crawl for `config`
///
/// This function orchestrates the entire crawl process:
///
/// 1. Validate the configuration and canonicalize the seed
/// 2. Build the HTTP client
/// 3. Load robots.txt for the origin
/// 4. Main crawl loop:
///    a. Take the next URL from the frontier
///    b. Check robots.txt
///    c. Fetch the page (with retries)
///    d. Extract links from HTML pages
///    e. Admit new same-origin URLs (links and redirect targets) to the frontier
/// 5. Return the sorted visited set with statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl completed (possibly truncated)
/// * `Err(SitemapError)` - The crawl could not be started
///
/// # Example
///
/// ```no_run
/// use sumi_sitemap::config::load_config;
/// use sumi_sitemap::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let result = crawl(config).await?;
/// println!("{} URLs", result.urls.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlResult, SitemapError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}

/// Like [`crawl`], stopping early when `cancel` fires
pub async fn crawl_with_cancellation(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlResult, SitemapError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run_with_cancellation(cancel).await)
}
