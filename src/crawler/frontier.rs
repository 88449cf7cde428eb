//! Breadth-first crawl frontier
//!
//! The frontier tracks every URL the crawl has discovered, which of them have
//! been visited, and the FIFO queue of URLs still waiting to be fetched. It is
//! owned by the coordinator task; workers never touch it.

use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// Lifecycle of a frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    /// URLs are queued and the visit limit has not been reached
    Pending,
    /// The visit limit has been reached while URLs are still queued
    Draining,
    /// Nothing left to dispatch
    Done,
}

/// FIFO frontier with visited/discovered bookkeeping
///
/// Invariants:
/// - every queued URL is in `discovered`
/// - a URL enters the queue at most once per crawl
/// - `visited` never grows beyond `limit`
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CanonicalUrl>,
    visited: HashSet<CanonicalUrl>,
    discovered: HashSet<CanonicalUrl>,
    limit: usize,
}

impl Frontier {
    /// Creates a frontier seeded with a single URL
    ///
    /// # Arguments
    ///
    /// * `seed` - The first URL to visit
    /// * `limit` - Maximum number of URLs that may be marked visited
    pub fn new(seed: CanonicalUrl, limit: usize) -> Self {
        let mut discovered = HashSet::new();
        discovered.insert(seed.clone());

        let mut queue = VecDeque::new();
        queue.push_back(seed);

        Self {
            queue,
            visited: HashSet::new(),
            discovered,
            limit,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FrontierState {
        match (self.queue.is_empty(), self.limit_reached()) {
            (true, _) => FrontierState::Done,
            (false, true) => FrontierState::Draining,
            (false, false) => FrontierState::Pending,
        }
    }

    /// Dequeues the next URL to consider, oldest first
    ///
    /// Returns `None` once the queue is empty or the visit limit is reached.
    /// The returned URL may already be visited; callers check that.
    pub fn next_pending(&mut self) -> Option<CanonicalUrl> {
        if self.state() != FrontierState::Pending {
            return None;
        }
        self.queue.pop_front()
    }

    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    /// Records a URL as visited
    ///
    /// Returns false if the URL was already visited or the limit is reached.
    pub fn mark_visited(&mut self, url: CanonicalUrl) -> bool {
        if self.limit_reached() {
            return false;
        }
        self.visited.insert(url)
    }

    /// Adds a newly found URL to the queue
    ///
    /// Returns true if the URL had never been discovered before and was
    /// enqueued; false if it is a duplicate.
    pub fn admit(&mut self, url: CanonicalUrl) -> bool {
        if !self.discovered.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    pub fn limit_reached(&self) -> bool {
        self.visited.len() >= self.limit
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn discovered_len(&self) -> usize {
        self.discovered.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Empties the queue, handing back the URLs that were never dispatched
    pub fn drain(&mut self) -> Vec<CanonicalUrl> {
        self.queue.drain(..).collect()
    }

    /// Consumes the frontier, returning the visited URLs in sorted order
    pub fn into_sorted_urls(self) -> Vec<CanonicalUrl> {
        let mut urls: Vec<CanonicalUrl> = self.visited.into_iter().collect();
        urls.sort();
        urls
    }
}
