//! Link frontier
//!
//! The single deduplication point of discovery: at most one entry per
//! canonical profile URL, kept in discovery order.

use crate::crawler::types::ProfileLink;
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct Frontier {
    seen: HashSet<String>,
    links: Vec<ProfileLink>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a link unless its URL was already seen
    ///
    /// Returns true when the link is new. The first sighting keeps its
    /// source page and seed.
    pub fn add(&mut self, link: ProfileLink) -> bool {
        if self.seen.contains(&link.url) {
            return false;
        }
        self.seen.insert(link.url.clone());
        self.links.push(link);
        true
    }

    /// Adds every link and returns how many were new
    pub fn extend(&mut self, links: impl IntoIterator<Item = ProfileLink>) -> usize {
        let mut added = 0;
        for link in links {
            if self.add(link) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[ProfileLink] {
        &self.links
    }

    /// Consumes the frontier, yielding links in discovery order
    pub fn into_links(self) -> Vec<ProfileLink> {
        self.links
    }
}
