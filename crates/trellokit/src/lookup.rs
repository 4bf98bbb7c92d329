//! Name matching used to find boards, lists, cards and labels.
//!
//! Boards, lists and cards match on a case-insensitive substring so a card
//! renamed to `[PX0001] Write docs` is still found as `Write docs`. Labels
//! need an exact (case-insensitive) name. In every case the last match in
//! API order wins.

use crate::types::{Board, BoardList, Card, Label};
use std::collections::HashMap;

/// Anything with a display name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Board {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for BoardList {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Card {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Label {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Whether `query` occurs in `candidate`, ignoring case.
pub fn contains_ignore_case(candidate: &str, query: &str) -> bool {
    candidate.to_lowercase().contains(&query.to_lowercase())
}

/// Whether two names are equal, ignoring case.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

/// Last item whose name contains `query` (case-insensitive).
pub fn last_containing<T: Named>(items: Vec<T>, query: &str) -> Option<T> {
    items
        .into_iter()
        .rev()
        .find(|item| contains_ignore_case(item.name(), query))
}

/// Last item whose name equals `query` (case-insensitive).
pub fn last_named<T: Named>(items: Vec<T>, query: &str) -> Option<T> {
    items
        .into_iter()
        .rev()
        .find(|item| eq_ignore_case(item.name(), query))
}

/// Index of board labels keyed by upper-cased name.
///
/// Later labels with the same name overwrite earlier ones.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    by_name: HashMap<String, String>,
}

impl LabelIndex {
    pub fn new(labels: &[Label]) -> Self {
        let mut index = Self::default();
        for label in labels {
            index.insert(&label.name, &label.id);
        }
        index
    }

    pub fn insert(&mut self, name: &str, id: &str) {
        self.by_name.insert(name.to_uppercase(), id.to_string());
    }

    /// Id of the label called `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.to_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
