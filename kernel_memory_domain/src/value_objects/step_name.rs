// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a single pipeline step; must match the `Name` a [`crate::repositories::Handler`]
/// registers under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extract() -> Self {
        Self::new("extract")
    }

    pub fn partition() -> Self {
        Self::new("partition")
    }

    pub fn gen_embeddings() -> Self {
        Self::new("gen_embeddings")
    }

    pub fn gen_embeddings_parallel() -> Self {
        Self::new("gen_embeddings_parallel")
    }

    pub fn save_records() -> Self {
        Self::new("save_records")
    }

    pub fn summarize() -> Self {
        Self::new("summarize")
    }

    pub fn delete_document() -> Self {
        Self::new("delete_document")
    }

    pub fn delete_index() -> Self {
        Self::new("delete_index")
    }

    /// The default step list a freshly admitted document runs through.
    pub fn standard_chain() -> Vec<Self> {
        vec![
            Self::extract(),
            Self::partition(),
            Self::gen_embeddings(),
            Self::save_records(),
        ]
    }

    /// The step list a deletion pipeline runs through.
    pub fn deletion_chain() -> Vec<Self> {
        vec![Self::delete_document()]
    }

    /// The queue name a distributed worker binds to for this step:
    /// `km-<step>` per spec.md §4.1.
    pub fn queue_name(&self) -> String {
        format!("km-{}", self.0)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
