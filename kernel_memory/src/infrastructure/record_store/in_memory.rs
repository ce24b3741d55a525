// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! In-process [`RecordStore`]: one `HashMap<RecordId, Record>` per index,
//! guarded by a single `RwLock`. Similarity is cosine; ties break by
//! record id ascending so results are deterministic across runs
//! (spec.md §4.5).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use kernel_memory_domain::entities::Record;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{RecordStore, ScoredRecord};
use kernel_memory_domain::services::filter_engine;
use kernel_memory_domain::value_objects::{Filter, IndexName, RecordId};

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    indexes: RwLock<HashMap<IndexName, HashMap<RecordId, Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_index(&self, index: &IndexName) -> Result<(), KmError> {
        self.indexes.write().unwrap().entry(index.clone()).or_default();
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexName>, KmError> {
        Ok(self.indexes.read().unwrap().keys().cloned().collect())
    }

    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError> {
        self.indexes.write().unwrap().remove(index);
        Ok(())
    }

    async fn upsert(&self, index: &IndexName, record: Record) -> Result<(), KmError> {
        let mut indexes = self.indexes.write().unwrap();
        let records = indexes.entry(index.clone()).or_default();
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_similar(&self, index: &IndexName, embedding: &[f32], filter: &Filter, min_relevance: f32, limit: usize) -> Result<Vec<ScoredRecord>, KmError> {
        let indexes = self.indexes.read().unwrap();
        let Some(records) = indexes.get(index) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredRecord> = records
            .values()
            .filter(|record| filter_engine::matches(filter, &record.tags))
            .map(|record| ScoredRecord { record: record.clone(), score: cosine_similarity(embedding, &record.vector) })
            .filter(|scored| scored.score >= min_relevance)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then_with(|| a.record.id.cmp(&b.record.id)));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn get_list(&self, index: &IndexName, filter: &Filter, limit: usize) -> Result<Vec<Record>, KmError> {
        let indexes = self.indexes.read().unwrap();
        let Some(records) = indexes.get(index) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<Record> = records.values().filter(|record| filter_engine::matches(filter, &record.tags)).cloned().collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn delete(&self, index: &IndexName, id: &RecordId) -> Result<(), KmError> {
        if let Some(records) = self.indexes.write().unwrap().get_mut(index) {
            records.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_domain::value_objects::TagCollection;
    use std::collections::HashMap as StdHashMap;

    fn record(id: &str, vector: Vec<f32>, tags: TagCollection) -> Record {
        Record::new(RecordId::compute("idx", id, "f", 0, 0), vector, tags, StdHashMap::new())
    }

    #[tokio::test]
    async fn get_similar_ranks_by_cosine_descending() {
        let store = InMemoryRecordStore::new();
        let index = IndexName::new("idx");
        store.create_index(&index).await.unwrap();
        store.upsert(&index, record("a", vec![1.0, 0.0], TagCollection::new())).await.unwrap();
        store.upsert(&index, record("b", vec![0.0, 1.0], TagCollection::new())).await.unwrap();

        let results = store.get_similar(&index, &[1.0, 0.0], &Filter::unfiltered(), -1.0, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn get_similar_respects_min_relevance() {
        let store = InMemoryRecordStore::new();
        let index = IndexName::new("idx");
        store.create_index(&index).await.unwrap();
        store.upsert(&index, record("a", vec![1.0, 0.0], TagCollection::new())).await.unwrap();
        store.upsert(&index, record("b", vec![-1.0, 0.0], TagCollection::new())).await.unwrap();

        let results = store.get_similar(&index, &[1.0, 0.0], &Filter::unfiltered(), 0.5, 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn get_list_applies_tag_filter() {
        let store = InMemoryRecordStore::new();
        let index = IndexName::new("idx");
        store.create_index(&index).await.unwrap();
        store.upsert(&index, record("a", vec![1.0], TagCollection::new().with("type", "news"))).await.unwrap();
        store.upsert(&index, record("b", vec![1.0], TagCollection::new().with("type", "blog"))).await.unwrap();

        let results = store.get_list(&index, &Filter::by_tag("type", "news"), 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }
}
