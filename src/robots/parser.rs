//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate. Rate directives
//! (`Request-rate`, `Crawl-delay`) are not exposed by that crate, so they are
//! read here with a small group-aware line parser.

use crate::crawler::RequestRate;
use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this rule set restricts nothing
    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks if a URL (or bare path) is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the request rate the site asks of `user_agent`, if any
    ///
    /// An explicit `Request-rate` wins over `Crawl-delay` within a group, and a
    /// group naming the agent wins over the `*` group.
    pub fn request_rate(&self, user_agent: &str) -> Option<RequestRate> {
        if self.is_allow_all() {
            return None;
        }

        let agent = product_token(user_agent);
        let mut group_agents: Vec<String> = Vec::new();
        let mut reading_agents = false;
        let mut for_agent = GroupRate::default();
        let mut for_wildcard = GroupRate::default();

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive user-agent lines share one group
                if !reading_agents {
                    group_agents.clear();
                }
                group_agents.push(value.to_ascii_lowercase());
                reading_agents = true;
                continue;
            }
            reading_agents = false;

            let target = if group_agents.iter().any(|ua| *ua == agent) {
                &mut for_agent
            } else if group_agents.iter().any(|ua| ua == "*") {
                &mut for_wildcard
            } else {
                continue;
            };

            match key.as_str() {
                "request-rate" => {
                    if let Some(rate) = parse_request_rate(value) {
                        target.request_rate.get_or_insert(rate);
                    }
                }
                "crawl-delay" => {
                    if let Some(rate) = parse_crawl_delay(value) {
                        target.crawl_delay.get_or_insert(rate);
                    }
                }
                _ => {}
            }
        }

        for_agent.resolve().or_else(|| for_wildcard.resolve())
    }
}

#[derive(Debug, Default)]
struct GroupRate {
    request_rate: Option<RequestRate>,
    crawl_delay: Option<RequestRate>,
}

impl GroupRate {
    fn resolve(&self) -> Option<RequestRate> {
        self.request_rate.or(self.crawl_delay)
    }
}

/// Lowercased product token of a user agent string ("WikiTrawl/0.1 (...)" -> "wikitrawl")
fn product_token(user_agent: &str) -> String {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Parses `n/m[s|m|h]`, ignoring any trailing time-of-day window
fn parse_request_rate(value: &str) -> Option<RequestRate> {
    let directive = value.split_whitespace().next()?;
    let (requests, period) = directive.split_once('/')?;
    let requests: u32 = requests.trim().parse().ok()?;

    let period = period.trim().to_ascii_lowercase();
    let (amount, unit_secs) = match period.chars().last()? {
        's' => (&period[..period.len() - 1], 1),
        'm' => (&period[..period.len() - 1], 60),
        'h' => (&period[..period.len() - 1], 3600),
        _ => (period.as_str(), 1),
    };
    let amount: u64 = amount.parse().ok()?;

    if requests == 0 || amount == 0 {
        return None;
    }

    let secs = amount.checked_mul(unit_secs)?;
    Some(RequestRate::new(requests, Duration::from_secs(secs)))
}

/// Crawl-delay of `d` seconds means one request per `d` seconds
fn parse_crawl_delay(value: &str) -> Option<RequestRate> {
    let delay: f64 = value.parse().ok()?;
    if !delay.is_finite() || delay <= 0.0 {
        return None;
    }
    let period = Duration::try_from_secs_f64(delay).ok()?;
    Some(RequestRate::new(1, period))
}
