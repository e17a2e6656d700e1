use std::collections::HashSet;

/// URLs already scheduled or fetched
///
/// The set only ever grows: a URL that entered it is never fetched again in
/// this process, whether its fetch succeeded or not.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL, returning `true` if it was not already present
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.urls.iter()
    }
}

impl<S: Into<String>> Extend<S> for VisitedSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for url in iter {
            self.urls.insert(url.into());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
