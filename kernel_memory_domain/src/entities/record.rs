// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! A [`Record`] is the addressable `{vector, tags, payload}` tuple stored in
//! the record store. Its [`RecordId`] is a pure function of its ingestion
//! coordinates (spec.md §3), so re-ingesting the same content upserts
//! instead of duplicating.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::value_objects::{RecordId, TagCollection};

/// A record persisted in the record store: a vector plus the tags and
/// human-visible payload fields used for filtering and citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub vector: Vec<f32>,
    pub tags: TagCollection,
    pub payload: HashMap<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, vector: Vec<f32>, tags: TagCollection, payload: HashMap<String, Value>) -> Self {
        Self { id, vector, tags, payload }
    }

    /// Payload text used to assemble grounded answers, if present.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }

    /// True if this record was produced by a handler other than
    /// `save_records` (e.g. a `summarize`-generated synthetic record),
    /// per the reserved `__synthetic` tag.
    pub fn is_synthetic(&self) -> bool {
        !self.tags.values(crate::value_objects::TAG_SYNTHETIC).is_empty()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.tags.values(crate::value_objects::TAG_DOCUMENT_ID).first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_detected_via_reserved_tag() {
        let tags = TagCollection::new().with(crate::value_objects::TAG_SYNTHETIC, "summary");
        let record = Record::new(RecordId::compute("i", "d", "f", 0, 0), vec![0.0], tags, HashMap::new());
        assert!(record.is_synthetic());
    }
}
