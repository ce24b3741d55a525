// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! The tag filter algebra from spec.md §3/§4.7: a [`Filter`] is a DNF
//! (disjunction of conjunctions) over tag key/value requirements. Evaluation
//! itself lives in [`crate::services::filter_engine`]; this module only
//! defines the shape and the two sugar constructors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::TAG_DOCUMENT_ID;

/// A single conjunction: every `(key, value)` pair must be present on a
/// record's tags for the conjunction to match. An empty conjunction matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conjunction {
    requirements: BTreeMap<String, Vec<String>>,
}

impl Conjunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an AND clause requiring `value` to be present under `key`.
    pub fn by_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.requirements
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

/// A filter is a list of conjunctions, OR'd together; an empty list means
/// "no filter" (scan/search the whole index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conjunctions: Vec<Conjunction>,
}

impl Filter {
    /// The unfiltered scan: no clauses at all.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// `ByTag(k, v)`: a filter with a single conjunction requiring `v` under `k`.
    pub fn by_tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            conjunctions: vec![Conjunction::new().by_tag(key, value)],
        }
    }

    /// `ByDocument(id)`: sugar for `ByTag("__document_id", id)`.
    pub fn by_document(id: impl Into<String>) -> Self {
        Self::by_tag(TAG_DOCUMENT_ID, id)
    }

    /// Adds an AND clause to every conjunction currently in the filter
    /// (or creates the first conjunction if the filter was unfiltered).
    pub fn and_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if self.conjunctions.is_empty() {
            self.conjunctions.push(Conjunction::new().by_tag(key, value));
        } else {
            for conjunction in &mut self.conjunctions {
                *conjunction = std::mem::take(conjunction).by_tag(key.clone(), value.clone());
            }
        }
        self
    }

    /// OR's `other` into this filter.
    pub fn or(mut self, other: Filter) -> Self {
        self.conjunctions.extend(other.conjunctions);
        self
    }

    /// A filter list with no clauses at all means "no filter".
    pub fn is_unfiltered(&self) -> bool {
        self.conjunctions.is_empty()
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.conjunctions
    }

    pub fn from_conjunctions(conjunctions: Vec<Conjunction>) -> Self {
        Self { conjunctions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_document_is_sugar_for_reserved_tag() {
        let f = Filter::by_document("d1");
        assert_eq!(f.conjunctions().len(), 1);
        let reqs: Vec<_> = f.conjunctions()[0].requirements().collect();
        assert_eq!(reqs, vec![(TAG_DOCUMENT_ID, "d1")]);
    }

    #[test]
    fn and_tag_adds_to_every_conjunction() {
        let f = Filter::by_tag("user", "admin").or(Filter::by_tag("user", "blake")).and_tag("type", "news");
        assert_eq!(f.conjunctions().len(), 2);
        for c in f.conjunctions() {
            assert!(c.requirements().any(|(k, v)| k == "type" && v == "news"));
        }
    }
}
