use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// A URL in canonical comparison form
///
/// Only [`canonicalize`] and [`canonicalize_absolute`] construct values of this
/// type, so holding one means the URL is `http(s)`, has a host, and carries no
/// query, fragment or trailing slash (except for the root path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The (already lowercased) host, if any
    pub fn host_str(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Canonicalizes a possibly relative URL reference
///
/// # Canonicalization Steps
///
/// 1. Resolve `raw` against `base` (standard URI reference resolution,
///    including removal of `.` and `..` segments)
/// 2. Reject anything that is not `http` or `https`, or has no host
/// 3. Lowercase scheme and host (done by the parser)
/// 4. Remove the fragment
/// 5. Remove the query string; `/list?page=2` collapses onto `/list`
/// 6. Remove trailing slashes from the path unless the path is exactly `/`
///
/// The result is idempotent: canonicalizing a canonical URL returns it unchanged.
///
/// # Arguments
///
/// * `raw` - The URL reference as found in a document or config
/// * `base` - The URL `raw` is relative to
///
/// # Returns
///
/// * `Ok(CanonicalUrl)` - The canonical form
/// * `Err(UrlError)` - The input cannot be turned into a crawlable URL
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::canonicalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = canonicalize("../About/?lang=de#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn canonicalize(raw: &str, base: &Url) -> UrlResult<CanonicalUrl> {
    let url = base
        .join(raw.trim())
        .map_err(|e| UrlError::Parse(format!("'{}': {}", raw, e)))?;
    canonicalize_url(url)
}

/// Canonicalizes an absolute URL string, such as the crawl seed
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::canonicalize_absolute;
///
/// let url = canonicalize_absolute("HTTPS://EXAMPLE.COM").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn canonicalize_absolute(raw: &str) -> UrlResult<CanonicalUrl> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("'{}': {}", raw, e)))?;
    canonicalize_url(url)
}

fn canonicalize_url(mut url: Url) -> UrlResult<CanonicalUrl> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    url.set_query(None);

    let path = strip_trailing_slashes(url.path()).to_string();
    url.set_path(&path);

    Ok(CanonicalUrl(url))
}

/// Removes every trailing `/`, keeping a lone root slash
///
/// Stripping all of them (rather than one) keeps canonicalization idempotent
/// for paths such as `/a//`.
fn strip_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
