// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Index names are case-folded and normalized on construction so that two
//! callers spelling the same logical index differently (`"My Docs"`,
//! `"my/docs"`, `"my_docs"`) land in the same namespace.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Name of the default index used when a caller supplies an empty string.
pub const DEFAULT_INDEX_NAME: &str = "default";

static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\\/._:|]+").expect("valid regex"));

/// A normalized, namespace-safe index name.
///
/// Construction always normalizes: lowercased, with runs of
/// `[\s\\/._:|]` collapsed to a single `-`. The empty string maps to
/// [`DEFAULT_INDEX_NAME`]. Normalization is idempotent:
/// `IndexName::new(IndexName::new(x).as_str()) == IndexName::new(x)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexName(String);

impl IndexName {
    /// Normalizes `raw` into an [`IndexName`].
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Self(DEFAULT_INDEX_NAME.to_string());
        }
        let lowered = raw.to_lowercase();
        let collapsed = SEPARATOR_RUN.replace_all(&lowered, "-");
        let trimmed = collapsed.trim_matches('-');
        if trimmed.is_empty() {
            Self(DEFAULT_INDEX_NAME.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn default_index() -> Self {
        Self(DEFAULT_INDEX_NAME.to_string())
    }

    /// True iff the name matches `[a-z0-9-]+`, the invariant spec.md §8
    /// item 6 requires of every normalized name.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndexName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IndexName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_maps_to_default() {
        assert_eq!(IndexName::new(""), IndexName::default_index());
        assert_eq!(IndexName::new("   "), IndexName::default_index());
    }

    #[test]
    fn lowercases_and_collapses_separators() {
        assert_eq!(IndexName::new("My Docs").as_str(), "my-docs");
        assert_eq!(IndexName::new("my/docs\\v1").as_str(), "my-docs-v1");
        assert_eq!(IndexName::new("my...docs").as_str(), "my-docs");
        assert_eq!(IndexName::new("a:b|c").as_str(), "a-b-c");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["My Docs", "a//b", "___x___", "plain-name", ""] {
            let once = IndexName::new(raw);
            let twice = IndexName::new(once.as_str());
            assert_eq!(once, twice);
            assert!(twice.is_well_formed());
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_normalization_idempotent(raw in ".*") {
            let once = IndexName::new(&raw);
            let twice = IndexName::new(once.as_str());
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
