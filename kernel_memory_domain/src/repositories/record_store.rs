// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Record Store Port
//!
//! Vector/tag-searchable storage for [`Record`]s (spec.md §4.5). A concrete
//! implementation is an external collaborator (in-memory, Qdrant, Postgres
//! + pgvector, ...); this crate fixes only the contract and the filter
//! algebra records are searched against.

use async_trait::async_trait;

use crate::entities::Record;
use crate::error::KmError;
use crate::value_objects::{Filter, IndexName, RecordId};

/// A record paired with its similarity score against the query embedding
/// that produced it. Higher is more similar; the scale is store-defined
/// (implementations document whether it's cosine similarity, inner
/// product, or distance-derived) but must be monotonic with relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: Record,
    pub score: f32,
}

/// Vector + tag-filterable storage for records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates the collection backing `index`, if it doesn't already exist.
    async fn create_index(&self, index: &IndexName) -> Result<(), KmError>;

    /// Lists every index currently known to the store.
    async fn list_indexes(&self) -> Result<Vec<IndexName>, KmError>;

    /// Deletes the collection backing `index` and every record in it.
    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError>;

    /// Inserts `record`, or replaces the existing record sharing its
    /// [`RecordId`] (spec.md §8 invariant 2: re-ingestion upserts).
    async fn upsert(&self, index: &IndexName, record: Record) -> Result<(), KmError>;

    /// Finds the `limit` records in `index` most similar to `embedding`,
    /// restricted to those matching `filter`, and no less similar than
    /// `min_relevance`.
    async fn get_similar(
        &self,
        index: &IndexName,
        embedding: &[f32],
        filter: &Filter,
        min_relevance: f32,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, KmError>;

    /// Lists up to `limit` records in `index` matching `filter`, with no
    /// similarity ranking (used for tag-only browsing, e.g. listing a
    /// document's records before deletion).
    async fn get_list(&self, index: &IndexName, filter: &Filter, limit: usize) -> Result<Vec<Record>, KmError>;

    /// Deletes a single record by id.
    async fn delete(&self, index: &IndexName, id: &RecordId) -> Result<(), KmError>;
}
