use url::Url;

/// Schemes and prefixes that never point at a crawlable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a link href against the page it was found on
///
/// # Normalization Steps
///
/// 1. Skip empty, fragment-only and special-scheme hrefs
/// 2. Resolve relative hrefs against `base`
/// 3. Reject anything that is not HTTP(S)
/// 4. Drop the fragment and any empty query string
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_trawl::url::resolve_link;
///
/// let base = Url::parse("https://example.org/wiki/Main_Page").unwrap();
/// let url = resolve_link("/wiki/Rust#History", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.org/wiki/Rust");
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }

    let url = base.join(href).ok()?;
    normalize(url)
}

/// Parses and normalizes an absolute URL string
pub fn normalize_url(url_str: &str) -> Option<Url> {
    Url::parse(url_str.trim()).ok().and_then(normalize)
}

fn normalize(mut url: Url) -> Option<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    Some(url)
}

/// Returns true if both URLs share scheme, host and port
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
