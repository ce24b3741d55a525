// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! A [`TagCollection`] maps a tag key to an ordered set of string values:
//! duplicates are dropped, insertion order is preserved for display, and a
//! handful of `__`-prefixed keys are reserved for pipeline bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved tag key carrying the owning document id, used for cascade deletes.
pub const TAG_DOCUMENT_ID: &str = "__document_id";
/// Reserved tag key carrying the source file id an artifact was derived from.
pub const TAG_FILE_ID: &str = "__file_id";
/// Reserved tag key carrying the partition number.
pub const TAG_PART_N: &str = "__part_n";
/// Reserved tag key carrying the section number within a partition.
pub const TAG_SECT_N: &str = "__sect_n";
/// Reserved tag key distinguishing synthetic records (e.g. summaries).
pub const TAG_SYNTHETIC: &str = "__synthetic";

/// Prefix that marks a tag key as reserved / pipeline-owned.
pub const RESERVED_PREFIX: &str = "__";

/// An ordered-set-valued multimap from tag key to tag values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCollection {
    tags: BTreeMap<String, Vec<String>>,
}

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, preserving insertion order and
    /// dropping the insert if `value` is already present for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let values = self.tags.entry(key.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    /// Builder-style variant of [`Self::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merges `other` into `self` without overwriting existing values;
    /// used by `save_records` to combine user tags with reserved ones.
    pub fn merge(&mut self, other: &TagCollection) -> &mut Self {
        for (key, values) in &other.tags {
            for value in values {
                self.insert(key.clone(), value.clone());
            }
        }
        self
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.tags.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.tags.get(key).is_some_and(|v| v.iter().any(|existing| existing == value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn document_id_tag(id: &str) -> (String, String) {
        (TAG_DOCUMENT_ID.to_string(), id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_values_collapse() {
        let mut tags = TagCollection::new();
        tags.insert("user", "admin").insert("user", "admin").insert("user", "owner");
        assert_eq!(tags.values("user"), &["admin".to_string(), "owner".to_string()]);
    }

    #[test]
    fn merge_does_not_overwrite() {
        let mut a = TagCollection::new().with("type", "news");
        let b = TagCollection::new().with("type", "blog").with("user", "admin");
        a.merge(&b);
        assert_eq!(a.values("type"), &["news".to_string(), "blog".to_string()]);
        assert_eq!(a.values("user"), &["admin".to_string()]);
    }

    #[test]
    fn unknown_key_has_no_values() {
        let tags = TagCollection::new();
        assert!(tags.values("nope").is_empty());
        assert!(!tags.contains("nope", "x"));
    }
}
