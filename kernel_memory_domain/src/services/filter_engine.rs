// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Pure evaluation of the [`Filter`] DNF algebra against a [`TagCollection`]
//! (spec.md §4.7). Kept separate from [`Filter`] itself so record-store
//! adapters that can push evaluation down to their own query language
//! (e.g. a SQL `WHERE` clause) don't have to depend on this module at all;
//! in-memory/test adapters call [`matches`] directly.

use crate::value_objects::{Conjunction, Filter, TagCollection};

/// Whether `tags` satisfies every requirement of `conjunction` (AND
/// semantics: every key/value pair must be present).
pub fn conjunction_matches(conjunction: &Conjunction, tags: &TagCollection) -> bool {
    conjunction.requirements().all(|(key, value)| tags.contains(key, value))
}

/// Whether `tags` satisfies `filter`: an unfiltered filter matches
/// everything; otherwise at least one conjunction must match (OR
/// semantics).
pub fn matches(filter: &Filter, tags: &TagCollection) -> bool {
    filter.is_unfiltered() || filter.conjunctions().iter().any(|c| conjunction_matches(c, tags))
}
