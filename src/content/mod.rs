//! # Content Module
//!
//! Holds the static content served by the jokeserver and the per-client
//! rotation state that decides which item a client sees next.
//!
//! ## Components
//!
//! - [`ContentTable`] - immutable label -> text mapping for each [`Category`],
//!   loaded once at startup and shared by reference with every worker
//! - [`cycler`] - shuffled per-client label queues that guarantee a full
//!   non-repeating cycle before any label is served again
//!
//! ## Categories
//!
//! There are exactly two categories, matching the two server modes:
//!
//! ```text
//! Mode::Joke    -> Category::Joke    (labels JA, JB, ...)
//! Mode::Proverb -> Category::Proverb (labels PA, PB, ...)
//! ```

pub mod cycler;

pub use cycler::{Cycler, Draw, SessionCyclers};

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One of the two rotating content sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Joke,
    Proverb,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Joke, Category::Proverb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Joke => "JOKE",
            Category::Proverb => "PROVERB",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problems found while building a [`ContentTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("no {0} entries configured")]
    Empty(Category),

    #[error("{0} entry has an empty label")]
    EmptyLabel(Category),

    #[error("{category} label '{label}' contains a line break")]
    MultilineLabel { category: Category, label: String },

    #[error("{category} text for '{label}' contains a line break")]
    MultilineText { category: Category, label: String },
}

/// Immutable label -> display text mapping for both categories.
///
/// Labels are kept in sorted order so that the unshuffled label list is
/// deterministic; the cyclers shuffle it per client anyway.
#[derive(Debug, Clone)]
pub struct ContentTable {
    jokes: BTreeMap<String, String>,
    proverbs: BTreeMap<String, String>,
    joke_labels: Vec<String>,
    proverb_labels: Vec<String>,
}

impl ContentTable {
    pub fn new(
        jokes: BTreeMap<String, String>,
        proverbs: BTreeMap<String, String>,
    ) -> Result<Self, ContentError> {
        validate(Category::Joke, &jokes)?;
        validate(Category::Proverb, &proverbs)?;
        let joke_labels = jokes.keys().cloned().collect();
        let proverb_labels = proverbs.keys().cloned().collect();
        Ok(Self {
            jokes,
            proverbs,
            joke_labels,
            proverb_labels,
        })
    }

    /// Full label set for a category, in sorted order.
    pub fn labels(&self, category: Category) -> &[String] {
        match category {
            Category::Joke => &self.joke_labels,
            Category::Proverb => &self.proverb_labels,
        }
    }

    /// Display text for a label, if the label belongs to the category.
    pub fn text(&self, category: Category, label: &str) -> Option<&str> {
        let map = match category {
            Category::Joke => &self.jokes,
            Category::Proverb => &self.proverbs,
        };
        map.get(label).map(String::as_str)
    }
}

fn validate(category: Category, entries: &BTreeMap<String, String>) -> Result<(), ContentError> {
    if entries.is_empty() {
        return Err(ContentError::Empty(category));
    }
    for (label, text) in entries {
        if label.trim().is_empty() {
            return Err(ContentError::EmptyLabel(category));
        }
        if label.contains(['\n', '\r']) {
            return Err(ContentError::MultilineLabel {
                category,
                label: label.clone(),
            });
        }
        if text.contains(['\n', '\r']) {
            return Err(ContentError::MultilineText {
                category,
                label: label.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn labels_are_sorted_and_texts_resolve() {
        let table = ContentTable::new(
            entries(&[("JB", "b"), ("JA", "a")]),
            entries(&[("PA", "pa")]),
        )
        .unwrap();
        assert_eq!(table.labels(Category::Joke), &["JA", "JB"]);
        assert_eq!(table.text(Category::Joke, "JB"), Some("b"));
        assert_eq!(table.text(Category::Proverb, "JB"), None);
    }

    #[test]
    fn rejects_empty_category() {
        let err = ContentTable::new(entries(&[("JA", "a")]), BTreeMap::new()).unwrap_err();
        assert_eq!(err, ContentError::Empty(Category::Proverb));
    }

    #[test]
    fn rejects_line_breaks() {
        let err = ContentTable::new(entries(&[("JA", "two\nlines")]), entries(&[("PA", "p")]))
            .unwrap_err();
        assert!(matches!(err, ContentError::MultilineText { .. }));

        let err = ContentTable::new(entries(&[("J\rA", "a")]), entries(&[("PA", "p")]))
            .unwrap_err();
        assert!(matches!(err, ContentError::MultilineLabel { .. }));
    }

    #[test]
    fn rejects_blank_label() {
        let err = ContentTable::new(entries(&[(" ", "a")]), entries(&[("PA", "p")])).unwrap_err();
        assert_eq!(err, ContentError::EmptyLabel(Category::Joke));
    }
}
