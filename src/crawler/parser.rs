//! HTML parser for extracting links and the page title
//!
//! Links are resolved to absolute URLs here but not filtered; the
//! [`LinkFilter`](crate::url::LinkFilter) decides which ones are crawled.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Article heading, falling back to the <title> tag
    pub title: Option<String>,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links (same page anchors)
///
/// # Example
///
/// ```
/// use url::Url;
/// use wiki_trawl::crawler::parse_html;
///
/// let html = r#"<html><body><h1 id="firstHeading">Rust</h1><a href="/wiki/Cargo">Cargo</a></body></html>"#;
/// let base_url = Url::parse("https://example.org/wiki/Rust").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Rust".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.org/wiki/Cargo".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the heading, preferring the article's `#firstHeading`
fn extract_title(document: &Html) -> Option<String> {
    ["#firstHeading", "title"].iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| {
                element
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|s| !s.is_empty())
    })
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .map(String::from)
        .collect()
}
