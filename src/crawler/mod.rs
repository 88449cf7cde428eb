//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{crawl, crawl_with_cancellation, Coordinator, CrawlResult};
pub use fetcher::{build_http_client, fetch, is_retryable_status, FetchOutcome, RetryPolicy};
pub use frontier::{Frontier, FrontierState};
pub use parser::extract_links;
