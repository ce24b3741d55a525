// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic record identity: `hex(sha256(index | document_id | file_id |
//! part_n | sect_n))`, so re-ingesting the same content upserts instead of
//! duplicating (spec.md §8 invariant 2).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const FIELD_SEPARATOR: u8 = 0x1f;

/// Deterministic record identifier, see module docs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Computes the id for the given coordinates. `part_n`/`sect_n` are
    /// formatted as plain decimal so the formula matches spec.md §6
    /// byte-for-byte.
    pub fn compute(index: &str, document_id: &str, file_id: &str, part_n: u32, sect_n: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(index.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(document_id.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(file_id.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(part_n.to_string().as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(sect_n.to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
