//! Robots.txt handling module
//!
//! The site's robots.txt is fetched once at startup. Its rules gate every
//! candidate link and may lower the crawl rate.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::RequestRate;
use reqwest::Client;
use url::Url;

/// Robots rules for one site, bound to the crawler's agent token
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    rules: ParsedRobots,
    agent: String,
}

impl RobotsPolicy {
    /// Builds a policy from robots.txt content
    pub fn from_content(content: &str, agent: &str) -> Self {
        Self {
            rules: ParsedRobots::from_content(content),
            agent: agent.to_string(),
        }
    }

    /// A policy that permits everything and suggests no rate
    pub fn allow_all(agent: &str) -> Self {
        Self {
            rules: ParsedRobots::allow_all(),
            agent: agent.to_string(),
        }
    }

    /// Fetches `{site_base}/robots.txt`
    ///
    /// Never fails: if the file cannot be fetched (network error or non-2xx)
    /// a warning is logged and the permissive policy is returned.
    pub async fn load(client: &Client, site_base: &Url, agent: &str) -> Self {
        let robots_url = match site_base.join("/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", site_base, e);
                return Self::allow_all(agent);
            }
        };

        let response = match client.get(robots_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch {}: {}; assuming everything is allowed",
                    robots_url,
                    e
                );
                return Self::allow_all(agent);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "{} returned {}; assuming everything is allowed",
                robots_url,
                status.as_u16()
            );
            return Self::allow_all(agent);
        }

        match response.text().await {
            Ok(content) => {
                tracing::info!("Loaded {} ({} bytes)", robots_url, content.len());
                Self::from_content(&content, agent)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}: {}; assuming everything is allowed",
                    robots_url,
                    e
                );
                Self::allow_all(agent)
            }
        }
    }

    /// Checks whether `user_agent` may fetch `path` (a path or full URL)
    pub fn can_fetch(&self, user_agent: &str, path: &str) -> bool {
        self.rules.is_allowed(path, user_agent)
    }

    /// [`can_fetch`](Self::can_fetch) for the bound agent
    pub fn is_allowed(&self, path: &str) -> bool {
        self.can_fetch(&self.agent, path)
    }

    /// The request rate the site asks of the bound agent, if any
    pub fn suggested_rate(&self) -> Option<RequestRate> {
        self.rules.request_rate(&self.agent)
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }
}
