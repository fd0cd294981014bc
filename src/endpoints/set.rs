//! Shared endpoint list.
//!
//! # Responsibilities
//! - Hold the ordered, interchangeable base URLs of one logical service
//! - Remember which endpoint last served a call successfully, so new calls
//!   start there instead of rediscovering a dead primary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use url::Url;

use crate::endpoints::SelectionError;

/// Ordered base URLs of one logical service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    urls: Arc<[Url]>,
    preferred: Arc<AtomicUsize>,
}

impl EndpointSet {
    /// Create a set from parsed URLs. The set must not be empty.
    pub fn new(urls: Vec<Url>) -> Result<Self, SelectionError> {
        if urls.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(Self {
            urls: urls.into(),
            preferred: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Parse and create a set from strings.
    pub fn parse<S: AsRef<str>>(urls: &[S]) -> Result<Self, SelectionError> {
        let parsed = urls
            .iter()
            .map(|s| {
                Url::parse(s.as_ref()).map_err(|_| SelectionError::InvalidUrl(s.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Url> {
        self.urls.get(index)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Index new calls start from.
    pub fn preferred(&self) -> usize {
        self.preferred.load(Ordering::Relaxed) % self.urls.len()
    }

    /// Record that `index` served a call successfully.
    pub fn mark_preferred(&self, index: usize) {
        if index < self.urls.len() {
            self.preferred.store(index, Ordering::Relaxed);
        }
    }

    /// Index of the known endpoint whose base URL is a prefix of `url`,
    /// with the remaining path and query below that base.
    pub fn resolve(&self, url: &Url) -> Option<(usize, String)> {
        let target = url.as_str();
        self.urls.iter().enumerate().find_map(|(index, base)| {
            let prefix = base.as_str().trim_end_matches('/');
            let rest = target.strip_prefix(prefix)?;
            if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
                Some((index, rest.to_string()))
            } else {
                None
            }
        })
    }
}
