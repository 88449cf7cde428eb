//! Robots.txt handling module
//!
//! This module fetches an origin's robots.txt once at crawl start and turns it
//! into an immutable [`RobotsPolicy`]. Failing to load robots.txt is never
//! fatal: the crawl continues under a permissive policy.

mod policy;

pub use policy::RobotsPolicy;

use reqwest::{Client, Response};
use url::Url;

/// Redirect hops followed for robots.txt, and only within the origin
const MAX_ROBOTS_REDIRECTS: usize = 5;

/// Builds the robots.txt location for an origin
///
/// # Examples
///
/// ```
/// use sumi_sitemap::robots::robots_url;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/blog/post?x=1").unwrap();
/// assert_eq!(robots_url(&seed).as_str(), "https://example.com/robots.txt");
/// ```
pub fn robots_url(origin: &Url) -> Url {
    let mut url = origin.clone();
    url.set_path("/robots.txt");
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Fetches and parses robots.txt for the origin of `origin`
///
/// Only a successful (2xx) response is turned into rules. Redirects are
/// followed while they stay on the same host and port (an http to https
/// upgrade, for instance). Any other status, a redirect off the origin, a
/// transport failure, or an unreadable body yields
/// [`RobotsPolicy::allow_all`] and a warning in the log.
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler's user agent and timeout
/// * `origin` - Any URL on the origin, typically the seed
pub async fn load_robots(client: &Client, origin: &Url) -> RobotsPolicy {
    let mut url = robots_url(origin);
    let mut hops = 0;

    let response = loop {
        tracing::debug!(url = %url, "Fetching robots.txt");

        let response = match client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "robots.txt unreachable, allowing all");
                return RobotsPolicy::allow_all();
            }
        };

        let Some(target) = same_origin_redirect(&response, origin) else {
            break response;
        };

        hops += 1;
        if hops > MAX_ROBOTS_REDIRECTS {
            tracing::warn!(url = %url, "Too many robots.txt redirects, allowing all");
            return RobotsPolicy::allow_all();
        }
        url = target;
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            url = %url,
            status = status.as_u16(),
            "robots.txt not available, allowing all"
        );
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::info!(url = %url, bytes = body.len(), "Loaded robots.txt");
            RobotsPolicy::from_content(&body)
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to read robots.txt, allowing all");
            RobotsPolicy::allow_all()
        }
    }
}

fn same_origin_redirect(response: &Response, origin: &Url) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }

    let location = response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()?;
    let target = response.url().join(location).ok()?;

    let same_host = match (target.host_str(), origin.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };
    (same_host && target.port() == origin.port()).then_some(target)
}
