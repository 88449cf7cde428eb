//! HTML parser for extracting links
//!
//! Only `<a href>` anchors are considered; stylesheets, scripts, images and
//! other link-bearing attributes are ignored.

use scraper::{Html, Selector};
use url::Url;

/// Schemes that never lead to a crawlable page
const NON_NAVIGABLE_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Extracts outbound anchor links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - empty hrefs and fragment-only hrefs (`#section`)
/// - `javascript:`, `mailto:`, `tel:` links (case-insensitive)
///
/// Relative hrefs are resolved against the document's `<base href>` when it
/// has one, otherwise against `base_url`. The returned strings are absolute
/// but not canonicalized. Hrefs that cannot be resolved are dropped.
///
/// Parsing never fails: malformed markup is handled by the HTML5 parser's
/// error recovery and at worst yields fewer links.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from
///
/// # Example
///
/// ```
/// use sumi_sitemap::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><a href="mailto:x@example.com">Mail</a>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base_url), vec!["https://example.com/about"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);

    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, &base) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Returns the effective base URL of a document
///
/// A `<base href>` element overrides the response URL; an unparseable one is
/// ignored.
fn document_base(document: &Html, base_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .unwrap_or_else(|| base_url.clone())
}

/// Resolves a link href to an absolute URL string
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - hrefs that do not resolve to a URL
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_NAVIGABLE_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => Some(absolute_url.to_string()),
        Err(e) => {
            tracing::debug!(href, error = %e, "Dropping unresolvable link");
            None
        }
    }
}
