//! Crawl statistics
//!
//! The coordinator fills a [`CrawlStats`] while it runs; this module renders
//! it for the terminal and the log.

use std::time::Duration;

/// Counters collected over one crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// URLs marked visited (the sitemap size)
    pub visited: usize,

    /// The visit limit was reached while fetchable URLs were still queued
    pub truncated: bool,

    /// The crawl was stopped by Ctrl-C or the time budget
    pub cancelled: bool,

    /// URLs skipped because robots.txt disallows them
    pub robots_excluded: usize,

    /// Visited URLs whose fetch ended in an HTTP or transport error
    pub fetch_failures: usize,

    /// Visited URLs that answered with a non-HTML content type
    pub non_html: usize,

    /// Visited URLs whose links were extracted
    pub pages_expanded: usize,

    /// Visited URLs that redirected to another page
    pub redirects: usize,

    /// Links that were new, internal and enqueued
    pub links_admitted: usize,

    /// Links pointing to another host
    pub links_external: usize,

    /// Links that could not be canonicalized
    pub links_invalid: usize,

    /// Queued URLs that would have been fetched but were dropped when the
    /// crawl stopped early
    pub pending_discarded: usize,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Pages visited per second over the whole crawl
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.visited as f64 / secs
        } else {
            0.0
        }
    }

    /// Emits the end-of-crawl summary as a structured log event
    pub fn log_summary(&self) {
        tracing::info!(
            visited = self.visited,
            truncated = self.truncated,
            cancelled = self.cancelled,
            robots_excluded = self.robots_excluded,
            fetch_failures = self.fetch_failures,
            redirects = self.redirects,
            elapsed = ?self.elapsed,
            "Crawl finished"
        );
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs in sitemap: {}", stats.visited);
    println!("  Pages expanded: {}", stats.pages_expanded);
    println!("  Non-HTML responses: {}", stats.non_html);
    println!("  Redirects: {}", stats.redirects);
    println!("  Failed fetches: {}", stats.fetch_failures);
    println!(
        "  Duration: {:.1}s ({:.2} pages/sec)",
        stats.elapsed.as_secs_f64(),
        stats.pages_per_second()
    );
    println!();

    println!("Links:");
    println!("  Admitted: {}", stats.links_admitted);
    println!("  External (ignored): {}", stats.links_external);
    println!("  Invalid (ignored): {}", stats.links_invalid);
    println!("  Excluded by robots.txt: {}", stats.robots_excluded);
    println!();

    if stats.truncated {
        println!(
            "Visit limit reached: {} queued URLs were not crawled",
            stats.pending_discarded
        );
    }

    if stats.cancelled {
        println!("Crawl was cancelled; the sitemap is partial");
    }
}
