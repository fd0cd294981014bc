//! Per-call endpoint traversal.

use thiserror::Error;
use url::{Position, Url};

use crate::endpoints::EndpointSet;

/// Why no further endpoint could be selected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("endpoint set is empty")]
    Empty,

    #[error("invalid endpoint URL '{0}'")]
    InvalidUrl(String),

    #[error("every endpoint has been tried")]
    NoEndpointsRemaining,

    #[error("relocation limit of {0} exceeded")]
    RelocationLimitExceeded(u32),
}

/// Where to go next.
#[derive(Debug, Clone, Copy)]
pub enum Relocation<'a> {
    /// Next untried endpoint in ring order.
    Next,
    /// Server-issued redirect to an absolute URL.
    Redirect(&'a Url),
}

/// The endpoint picked by a relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub base: Url,
    /// Replacement request target below `base`, set for redirects.
    pub path_and_query: Option<String>,
}

/// Traversal state of one logical call over an [`EndpointSet`].
///
/// Indices at or past `set.len()` refer to endpoints inserted by redirects.
#[derive(Debug)]
pub struct EndpointSelector {
    set: EndpointSet,
    transient: Vec<Url>,
    visited: Vec<bool>,
    current: usize,
    relocations: u32,
    max_relocations: u32,
}

impl EndpointSelector {
    /// Start at the set's preferred endpoint.
    pub fn new(set: EndpointSet, max_relocations: u32) -> Self {
        let start = set.preferred();
        Self::starting_at(set, start, max_relocations)
    }

    pub fn starting_at(set: EndpointSet, start: usize, max_relocations: u32) -> Self {
        let mut visited = vec![false; set.len()];
        let current = start % set.len();
        visited[current] = true;
        Self {
            set,
            transient: Vec::new(),
            visited,
            current,
            relocations: 0,
            max_relocations,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Base URL of the current endpoint.
    pub fn current(&self) -> &Url {
        self.url(self.current)
    }

    /// True when the current endpoint belongs to the shared set.
    pub fn is_known(&self, index: usize) -> bool {
        index < self.set.len()
    }

    pub fn relocations(&self) -> u32 {
        self.relocations
    }

    /// Distinct endpoints tried so far in this call.
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|v| **v).count()
    }

    fn url(&self, index: usize) -> &Url {
        match self.set.get(index) {
            Some(url) => url,
            None => &self.transient[index - self.set.len()],
        }
    }

    /// Move to another endpoint.
    pub fn relocate(&mut self, target: Relocation<'_>) -> Result<Selection, SelectionError> {
        if self.relocations >= self.max_relocations {
            return Err(SelectionError::RelocationLimitExceeded(self.max_relocations));
        }

        let (index, path_and_query) = match target {
            Relocation::Next => (self.next_unvisited()?, None),
            Relocation::Redirect(url) => {
                let (index, path) = self.resolve_redirect(url);
                (index, Some(path))
            }
        };

        self.relocations += 1;
        self.visited[index] = true;
        self.current = index;

        Ok(Selection {
            index,
            base: self.url(index).clone(),
            path_and_query,
        })
    }

    fn next_unvisited(&self) -> Result<usize, SelectionError> {
        let len = self.set.len();
        let start = if self.is_known(self.current) { self.current } else { len - 1 };
        (1..=len)
            .map(|step| (start + step) % len)
            .find(|index| !self.visited[*index])
            .ok_or(SelectionError::NoEndpointsRemaining)
    }

    fn resolve_redirect(&mut self, url: &Url) -> (usize, String) {
        if let Some(found) = self.set.resolve(url) {
            return found;
        }

        let known_transient = self.transient.iter().position(|base| same_origin(base, url));
        let index = match known_transient {
            Some(offset) => self.set.len() + offset,
            None => {
                let mut base = url.clone();
                base.set_path("");
                base.set_query(None);
                base.set_fragment(None);
                self.transient.push(base);
                self.visited.push(false);
                self.visited.len() - 1
            }
        };
        (index, url[Position::BeforePath..Position::AfterQuery].to_string())
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(n: usize) -> EndpointSet {
        let urls: Vec<String> = (0..n).map(|i| format!("http://node-{}:8080", i)).collect();
        EndpointSet::parse(&urls).unwrap()
    }

    #[test]
    fn test_ring_order_visits_each_once() {
        for k in 1..6 {
            for start in 0..k {
                let mut selector = EndpointSelector::starting_at(set(k), start, 20);
                let mut seen = vec![start];
                loop {
                    match selector.relocate(Relocation::Next) {
                        Ok(selection) => {
                            assert!(!seen.contains(&selection.index), "endpoint repeated");
                            seen.push(selection.index);
                        }
                        Err(e) => {
                            assert_eq!(e, SelectionError::NoEndpointsRemaining);
                            break;
                        }
                    }
                }
                assert_eq!(seen.len(), k);
                assert_eq!(selector.visited_count(), k);
            }
        }
    }

    #[test]
    fn test_ring_order_wraps_from_start() {
        let mut selector = EndpointSelector::starting_at(set(3), 1, 20);
        assert_eq!(selector.relocate(Relocation::Next).unwrap().index, 2);
        assert_eq!(selector.relocate(Relocation::Next).unwrap().index, 0);
    }

    #[test]
    fn test_redirect_to_known_endpoint() {
        let mut selector = EndpointSelector::starting_at(set(3), 0, 20);
        let location = Url::parse("http://node-2:8080/v2/items?id=4").unwrap();
        let selection = selector.relocate(Relocation::Redirect(&location)).unwrap();
        assert_eq!(selection.index, 2);
        assert_eq!(selection.path_and_query.as_deref(), Some("/v2/items?id=4"));
        assert_eq!(selector.relocations(), 1);
    }

    #[test]
    fn test_redirect_to_visited_endpoint_is_allowed() {
        let mut selector = EndpointSelector::starting_at(set(1), 0, 20);
        let location = Url::parse("http://node-0:8080/other").unwrap();
        let selection = selector.relocate(Relocation::Redirect(&location)).unwrap();
        assert_eq!(selection.index, 0);
        assert_eq!(
            selector.relocate(Relocation::Next),
            Err(SelectionError::NoEndpointsRemaining)
        );
    }

    #[test]
    fn test_redirect_to_unknown_origin_is_transient() {
        let shared = set(2);
        let mut selector = EndpointSelector::starting_at(shared.clone(), 0, 20);
        let location = Url::parse("http://standby:9000/v1/items").unwrap();

        let selection = selector.relocate(Relocation::Redirect(&location)).unwrap();
        assert_eq!(selection.index, 2);
        assert_eq!(selection.base.as_str(), "http://standby:9000/");
        assert_eq!(selection.path_and_query.as_deref(), Some("/v1/items"));
        assert!(!selector.is_known(selection.index));
        assert_eq!(shared.len(), 2);

        // Ring order continues over the shared set only.
        assert_eq!(selector.relocate(Relocation::Next).unwrap().index, 1);

        // Same origin again reuses the transient slot.
        let again = Url::parse("http://standby:9000/v1/other").unwrap();
        assert_eq!(selector.relocate(Relocation::Redirect(&again)).unwrap().index, 2);
    }

    #[test]
    fn test_relocation_cap() {
        let mut selector = EndpointSelector::starting_at(set(2), 0, 3);
        let location = Url::parse("http://node-1:8080/loop").unwrap();
        for _ in 0..3 {
            selector.relocate(Relocation::Redirect(&location)).unwrap();
        }
        assert_eq!(
            selector.relocate(Relocation::Redirect(&location)),
            Err(SelectionError::RelocationLimitExceeded(3))
        );
    }
}
