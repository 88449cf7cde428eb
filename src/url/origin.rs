use crate::url::CanonicalUrl;

/// The authority a crawl is confined to: host plus any non-default port
///
/// Default ports are left out, so `https://example.com:443/` and
/// `https://example.com/` share the authority `example.com`, while a dev
/// server on `127.0.0.1:8080` keeps its port.
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::{canonicalize_absolute, origin_authority};
///
/// let seed = canonicalize_absolute("http://127.0.0.1:8080/start").unwrap();
/// assert_eq!(origin_authority(&seed).as_deref(), Some("127.0.0.1:8080"));
///
/// let seed = canonicalize_absolute("https://Example.com:443/").unwrap();
/// assert_eq!(origin_authority(&seed).as_deref(), Some("example.com"));
/// ```
pub fn origin_authority(url: &CanonicalUrl) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.as_url().port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Decides whether a canonical URL belongs to the crawl origin
///
/// `origin_host` is an authority as returned by [`origin_authority`]. A URL
/// is internal when its host equals the authority's host (ignoring ASCII
/// case) and its non-default port matches, or when it has no host at all.
/// The scheme is not compared, so `http://example.com/a` and
/// `https://example.com/a` are both internal for an `example.com` crawl.
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::{canonicalize_absolute, is_internal};
///
/// let url = canonicalize_absolute("https://example.com/about").unwrap();
/// assert!(is_internal(&url, "EXAMPLE.com"));
///
/// let url = canonicalize_absolute("https://example.com:8443/").unwrap();
/// assert!(!is_internal(&url, "example.com"));
/// ```
pub fn is_internal(url: &CanonicalUrl, origin_host: &str) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };

    let (origin, origin_port) = split_authority(origin_host);
    host.eq_ignore_ascii_case(origin) && url.as_url().port() == origin_port
}

/// Splits `host[:port]`; bracketed IPv6 hosts keep their brackets
fn split_authority(authority: &str) -> (&str, Option<u16>) {
    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !port.ends_with(']') => {
            match port.parse() {
                Ok(port) => (host, Some(port)),
                Err(_) => (authority, None),
            }
        }
        _ => (authority, None),
    }
}
