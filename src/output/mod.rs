//! Output module for crawl results
//!
//! This module handles:
//! - Rendering and writing sitemap.xml
//! - Recording and printing crawl statistics

mod sitemap;
pub mod stats;

pub use sitemap::{render_sitemap, write_sitemap, SITEMAP_NAMESPACE};
pub use stats::{print_statistics, CrawlStats};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize sitemap: {0}")]
    Serialize(#[from] quick_xml::errors::serialize::SeError),
}
