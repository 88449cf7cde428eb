//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Retry with exponential backoff for transient failures
//! - Classifying every response into a [`FetchOutcome`]
//!
//! The client never follows redirects on its own. A redirect that only
//! changes the spelling of the requested URL (trailing slash, query) is
//! followed here; any other target is handed back to the coordinator as
//! [`FetchOutcome::Redirect`] so it passes the same origin and robots.txt
//! checks as a discovered link.

use crate::config::{RetryConfig, UserAgentConfig};
use crate::url::{canonicalize_absolute, CanonicalUrl};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum number of same-page redirect hops followed for one URL
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A 2xx response with an HTML content type
    HtmlPage {
        /// Page body content
        body: String,
        /// URL the body was served from, after same-page redirects
        final_url: String,
    },

    /// A 2xx response that is not HTML; the body is never read
    NonHtml {
        /// The Content-Type header value (empty if missing)
        content_type: String,
    },

    /// A redirect to a different page; the target was not requested
    Redirect {
        /// Absolute target from the `Location` header
        location: Url,
    },

    /// A non-2xx response, after any retries
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// The request never produced a response, after any retries
    TransportError {
        /// Error description
        cause: String,
    },
}

impl FetchOutcome {
    /// Short label used in logs and statistics
    pub fn label(&self) -> &'static str {
        match self {
            Self::HtmlPage { .. } => "html",
            Self::NonHtml { .. } => "non_html",
            Self::Redirect { .. } => "redirect",
            Self::HttpError { .. } => "http_error",
            Self::TransportError { .. } => "transport_error",
        }
    }

    /// Returns true for outcomes that count as failed fetches
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::HttpError { .. } | Self::TransportError { .. })
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_backoff: Duration,
    /// Multiplier applied after each retry
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Wait before retry number `retry` (1-based)
    ///
    /// `initial_backoff * backoff_factor^(retry - 1)`
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        self.initial_backoff.mul_f64(self.backoff_factor.powi(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            backoff_factor: config.backoff_factor,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_sitemap::config::UserAgentConfig;
/// use sumi_sitemap::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSitemap".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx + `text/html` | → HtmlPage |
/// | 2xx, other type | Immediate → NonHtml |
/// | 3xx to the same canonical URL | Follow (up to 10 hops) |
/// | 3xx elsewhere | Immediate → Redirect |
/// | HTTP 429, 500, 502, 503, 504 | Retry with backoff, then → HttpError |
/// | Other non-2xx | Immediate → HttpError |
/// | Timeout, connect, reset, body read | Retry with backoff, then → TransportError |
/// | Redirect loop, invalid request | Immediate → TransportError |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `retry` - The retry schedule
///
/// # Returns
///
/// A FetchOutcome describing the last attempt
pub async fn fetch(client: &Client, url: &CanonicalUrl, retry: &RetryPolicy) -> FetchOutcome {
    let mut target = url.as_url().clone();

    for _ in 0..=MAX_REDIRECTS {
        match fetch_with_retry(client, &target, retry).await {
            FetchOutcome::Redirect { location } if is_same_page(url, &location) => {
                tracing::debug!(url = %url, location = %location, "Following same-page redirect");
                target = location;
            }
            outcome => return outcome,
        }
    }

    tracing::warn!(url = %url, "Redirect loop");
    FetchOutcome::TransportError {
        cause: format!("More than {} redirects", MAX_REDIRECTS),
    }
}

fn is_same_page(url: &CanonicalUrl, location: &Url) -> bool {
    canonicalize_absolute(location.as_str()).map_or(false, |target| &target == url)
}

async fn fetch_with_retry(client: &Client, target: &Url, retry: &RetryPolicy) -> FetchOutcome {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let (outcome, transient) = fetch_once(client, target).await;

        if !transient || attempt >= max_attempts {
            if transient {
                tracing::warn!(
                    url = %target,
                    attempts = attempt,
                    outcome = outcome.label(),
                    "Giving up after retries"
                );
            }
            return outcome;
        }

        let wait = retry.backoff_for(attempt);
        tracing::info!(
            url = %target,
            attempt,
            max_attempts,
            outcome = ?outcome,
            "Transient failure, retrying in {:?}",
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// Performs a single GET and reports whether the outcome may be retried
async fn fetch_once(client: &Client, target: &Url) -> (FetchOutcome, bool) {
    let response = match client.get(target.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let transient = is_transient_error(&e);
            return (
                FetchOutcome::TransportError {
                    cause: describe_error(&e),
                },
                transient,
            );
        }
    };

    let status = response.status();
    if status.is_redirection() {
        if let Some(location) = redirect_location(&response) {
            return (FetchOutcome::Redirect { location }, false);
        }
    }

    if !status.is_success() {
        return (
            FetchOutcome::HttpError {
                status: status.as_u16(),
            },
            is_retryable_status(status),
        );
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.to_ascii_lowercase().contains("text/html") {
        return (FetchOutcome::NonHtml { content_type }, false);
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => (FetchOutcome::HtmlPage { body, final_url }, false),
        Err(e) => (
            FetchOutcome::TransportError {
                cause: describe_error(&e),
            },
            is_transient_error(&e),
        ),
    }
}

/// Resolves the `Location` header against the URL that answered
fn redirect_location(response: &Response) -> Option<Url> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()?;
    response.url().join(location).ok()
}

/// Status codes worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Transport errors worth another attempt
///
/// Request-builder errors fail the same way every time.
fn is_transient_error(e: &reqwest::Error) -> bool {
    !e.is_builder()
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
