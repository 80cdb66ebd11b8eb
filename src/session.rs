//! Session-scoped visit list
//!
//! Owned by whoever drives the interaction (the chat loop, a single request)
//! and never persisted.

use serde::Serialize;

/// Ordered, de-duplicated list of place names chosen by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisitList {
    names: Vec<String>,
}

fn same_place(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl VisitList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a place. Returns false for blank names and for names already present.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Remove a place, returns whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.names.len();
        self.names.retain(|n| !same_place(n, name));
        self.names.len() != before
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.names.iter().any(|n| same_place(n, name))
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl<S: AsRef<str>> FromIterator<S> for VisitList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for name in iter {
            list.add(name.as_ref());
        }
        list
    }
}
