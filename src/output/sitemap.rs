//! sitemap.xml rendering
//!
//! Produces a document following the sitemaps.org 0.9 protocol. All URLs get
//! the same `lastmod`, `changefreq` and `priority`; the crawler does not know
//! anything more specific about individual pages.

use crate::output::OutputError;
use crate::url::CanonicalUrl;
use chrono::NaiveDate;
use quick_xml::se::to_string;
use serde::Serialize;
use std::path::Path;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const CHANGE_FREQUENCY: &str = "weekly";
const PRIORITY: &str = "0.5";

#[derive(Debug, Serialize)]
#[serde(rename = "urlset")]
struct UrlSet<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    url: Vec<UrlEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct UrlEntry<'a> {
    loc: &'a str,
    lastmod: &'a str,
    changefreq: &'static str,
    priority: &'static str,
}

/// Renders the sitemap document for `urls`
///
/// URLs are emitted in the order given; [`crate::CrawlResult`] already sorts
/// them. Special characters in URLs are XML-escaped.
///
/// # Arguments
///
/// * `urls` - The URLs to list
/// * `lastmod` - Date stamped on every entry
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use sumi_sitemap::output::render_sitemap;
/// use sumi_sitemap::url::canonicalize_absolute;
///
/// let urls = vec![canonicalize_absolute("https://example.com/").unwrap()];
/// let lastmod = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// let xml = render_sitemap(&urls, lastmod).unwrap();
/// assert!(xml.contains("<loc>https://example.com/</loc>"));
/// ```
pub fn render_sitemap(urls: &[CanonicalUrl], lastmod: NaiveDate) -> Result<String, OutputError> {
    let lastmod = lastmod.format("%Y-%m-%d").to_string();

    let urlset = UrlSet {
        xmlns: SITEMAP_NAMESPACE,
        url: urls
            .iter()
            .map(|url| UrlEntry {
                loc: url.as_str(),
                lastmod: &lastmod,
                changefreq: CHANGE_FREQUENCY,
                priority: PRIORITY,
            })
            .collect(),
    };

    let xml = to_string(&urlset)?;
    Ok(format!("{}\n{}\n", XML_DECLARATION, xml))
}

/// Renders the sitemap with today's date and writes it to `path`
///
/// Missing parent directories are created.
pub fn write_sitemap(urls: &[CanonicalUrl], path: &Path) -> Result<(), OutputError> {
    let today = chrono::Local::now().date_naive();
    let xml = render_sitemap(urls, today)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, xml)?;
    tracing::info!(path = %path.display(), urls = urls.len(), "Wrote sitemap");
    Ok(())
}
