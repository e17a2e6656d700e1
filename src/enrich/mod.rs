//! Text enrichment for the search index
//!
//! Turns a raw HTML body into an ordered list of normalized tokens:
//! visible text is extracted, punctuation becomes whitespace, tokens are
//! lowercased, English stop words are removed and a light suffix-stripping
//! stemmer is applied. Enrichment is pure; it never touches storage.

use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::LazyLock;

/// English stop words
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Suffix rewrites, longest first; `(suffix, replacement)`
const SUFFIXES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("ization", "ize"),
    ("fulness", "ful"),
    ("iveness", "ive"),
    ("ousness", "ous"),
    ("ements", ""),
    ("ement", ""),
    ("ments", ""),
    ("ation", "ate"),
    ("sses", "ss"),
    ("ness", ""),
    ("ment", ""),
    ("ies", "i"),
    ("ing", ""),
    ("ed", ""),
    ("ly", ""),
    ("s", ""),
];

/// Shortest stem a suffix may be stripped down to
const MIN_STEM_LEN: usize = 3;

/// Any character that is neither a word character nor whitespace
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word pattern is valid"));

/// Tokenizer and normalizer for page text
#[derive(Debug, Clone)]
pub struct TextEnricher {
    stop_words: HashSet<&'static str>,
}

impl Default for TextEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEnricher {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Enriches a raw HTML body into normalized tokens, in document order
    ///
    /// # Example
    ///
    /// ```
    /// use wiki_trawl::enrich::TextEnricher;
    ///
    /// let words = TextEnricher::new().enrich("<p>The crawlers were running.</p>");
    /// assert_eq!(words, vec!["crawler", "runn"]);
    /// ```
    pub fn enrich(&self, raw: &str) -> Vec<String> {
        self.enrich_text(&visible_text(raw))
    }

    /// Enriches already-extracted plain text
    pub fn enrich_text(&self, text: &str) -> Vec<String> {
        NON_WORD
            .replace_all(text, " ")
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|word| !self.stop_words.contains(word.as_str()))
            .map(|word| stem(&word))
            .collect()
    }

}

/// Text content of the document, excluding script and style elements
fn visible_text(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let mut text = String::with_capacity(raw.len() / 2);

    for node in document.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| matches!(element.name(), "script" | "style" | "noscript"))
            .unwrap_or(false);
        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }

    text
}

/// Strips the first matching suffix if enough of the word remains
pub fn stem(word: &str) -> String {
    for (suffix, replacement) in SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.chars().count() >= MIN_STEM_LEN && has_vowel(base) && !base.ends_with('s') {
                return format!("{}{}", base, replacement);
            }
            if *suffix == "s" || base.chars().count() >= MIN_STEM_LEN {
                break;
            }
        }
    }
    word.to_string()
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
}

/// Adjacent character pairs of a word ("rust" -> ["ru", "us", "st"])
pub fn char_bigrams(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .windows(2)
        .map(|pair| pair.iter().collect())
        .collect()
}
