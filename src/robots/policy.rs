//! Robots.txt policy implementation
//!
//! This module wraps the robotstxt crate's matcher behind an immutable policy
//! value that is built once per crawl.

use crate::url::CanonicalUrl;
use robotstxt::DefaultMatcher;

/// Allow/disallow rules of one origin's robots.txt
///
/// The policy never changes after construction, so it can be shared between
/// fetch workers behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or read.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this policy allows every URL unconditionally
    pub fn is_permissive(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// Matching follows the robots exclusion protocol as implemented by the
    /// robotstxt crate: the most specific group for the agent applies, the
    /// longest matching `Allow`/`Disallow` rule wins and unmatched URLs are
    /// allowed.
    ///
    /// # Arguments
    ///
    /// * `agent` - The crawler's product token (e.g. "SumiSitemap")
    /// * `url` - The URL to check
    pub fn allows(&self, agent: &str, url: &CanonicalUrl) -> bool {
        if self.is_permissive() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url.as_str())
    }
}
