use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Sitemap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from; its host defines the crawl origin
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum number of URLs to visit before the crawl is truncated
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Minimum time a worker waits after each request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Number of fetches allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Optional wall-clock budget; the crawl is cancelled when it elapses
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    1
}

/// Retry policy for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Wait before the first retry (milliseconds)
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    /// Multiplier applied to the wait after every retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_factor: 2.0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where the rendered sitemap is written
    #[serde(rename = "sitemap-path")]
    pub sitemap_path: String,
}

/// Publishing targets; every target is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishConfig {
    pub s3: Option<S3Config>,

    #[serde(rename = "object-store")]
    pub object_store: Option<ObjectStoreConfig>,

    pub git: Option<GitConfig>,
}

/// Upload to an S3 bucket with credentials from the environment
///
/// Credentials are resolved the usual AWS way: environment variables, the
/// shared config and credentials files, then instance or container roles.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub bucket: String,

    /// Object key of the sitemap
    #[serde(default = "default_s3_key")]
    pub key: String,

    pub region: String,

    /// Canned ACL applied to the object; empty disables it
    #[serde(default = "default_s3_acl")]
    pub acl: String,

    /// Endpoint override for S3-compatible stores; uses path-style addressing
    #[serde(rename = "endpoint-url", default)]
    pub endpoint_url: Option<String>,

    /// URL reported after upload; defaults to the bucket's virtual-hosted URL
    #[serde(rename = "public-url", default)]
    pub public_url: Option<String>,
}

fn default_s3_key() -> String {
    "sitemap.xml".to_string()
}

fn default_s3_acl() -> String {
    "public-read".to_string()
}

/// Object storage upload via HTTP PUT
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Object URL the sitemap is PUT to (for S3 usually a pre-signed URL)
    pub url: String,

    /// Canned ACL sent as `x-amz-acl`
    #[serde(default)]
    pub acl: Option<String>,

    /// Name of an environment variable holding a bearer token
    #[serde(rename = "token-env", default)]
    pub token_env: Option<String>,

    /// URL reported after upload; defaults to `url` without its query
    #[serde(rename = "public-url", default)]
    pub public_url: Option<String>,
}

/// Commit into a local git checkout
#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    /// Path to the working tree
    #[serde(rename = "repo-path")]
    pub repo_path: String,

    /// File name of the sitemap inside the repository
    #[serde(rename = "file-name", default = "default_git_file_name")]
    pub file_name: String,

    #[serde(rename = "commit-message", default = "default_commit_message")]
    pub commit_message: String,

    /// Whether to run `git push` after a successful commit
    #[serde(default = "default_push")]
    pub push: bool,
}

fn default_git_file_name() -> String {
    "sitemap.xml".to_string()
}

fn default_commit_message() -> String {
    "Automated sitemap update".to_string()
}

fn default_push() -> bool {
    true
}
