//! Candidate link filtering
//!
//! Decides which extracted links become crawl candidates: same-site content
//! pages the robots rules allow and that have not been seen before.

use crate::robots::RobotsPolicy;
use crate::state::VisitedSet;
use crate::url::normalize::{normalize_url, same_origin};
use std::collections::HashSet;
use url::Url;

/// Links that survived filtering, plus how many were rejected
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilteredLinks {
    /// Accepted links in first-seen order, without duplicates
    pub accepted: Vec<String>,
    pub discarded: usize,
}

/// Filter for outbound links found on crawled pages
#[derive(Debug, Clone)]
pub struct LinkFilter {
    site_base: Url,
    content_prefix: String,
}

impl LinkFilter {
    pub fn new(site_base: Url, content_prefix: impl Into<String>) -> Self {
        Self {
            site_base,
            content_prefix: content_prefix.into(),
        }
    }

    /// Checks the structural rules: same site, content prefix, no namespace
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use wiki_trawl::url::LinkFilter;
    ///
    /// let filter = LinkFilter::new(Url::parse("https://example.org").unwrap(), "/wiki/");
    /// assert!(filter.is_content_link(&Url::parse("https://example.org/wiki/Main_Page").unwrap()));
    /// assert!(!filter.is_content_link(&Url::parse("https://example.org/wiki/Special:Search").unwrap()));
    /// ```
    pub fn is_content_link(&self, url: &Url) -> bool {
        if !same_origin(url, &self.site_base) {
            return false;
        }

        let path = url.path();
        path.starts_with(&self.content_prefix) && !is_namespaced(path)
    }

    /// Filters raw link strings against the structural rules, robots and the visited set
    pub fn filter<I>(&self, links: I, robots: &RobotsPolicy, visited: &VisitedSet) -> FilteredLinks
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut result = FilteredLinks::default();
        let mut seen = HashSet::new();

        for link in links {
            let keep = normalize_url(link.as_ref())
                .filter(|url| self.is_content_link(url))
                .map(String::from)
                .filter(|url| robots.is_allowed(url))
                .filter(|url| !visited.contains(url))
                .filter(|url| seen.insert(url.clone()));

            match keep {
                Some(url) => result.accepted.push(url),
                None => result.discarded += 1,
            }
        }

        result
    }
}

/// Namespace-qualified paths (`Talk:`, `Special:`, `File:`...) carry a colon
fn is_namespaced(path: &str) -> bool {
    path.contains(':') || path.to_ascii_lowercase().contains("%3a")
}
