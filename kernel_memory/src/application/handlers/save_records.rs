// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `save_records` step (spec.md §4.2 table): upserts one record per
//! embedding artifact. Record id is deterministic over
//! `(index, document_id, file_id, part_n, sect_n)`; reserved tags are
//! added and user tags merged without collision (spec.md §3).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::entities::Record;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome, RecordStore};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, RecordId, TagCollection, TAG_DOCUMENT_ID, TAG_FILE_ID, TAG_PART_N, TAG_SECT_N};

use super::embed::EmbeddingArtifact;

pub struct SaveRecordsHandler {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
}

impl SaveRecordsHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self { document_store, record_store }
    }
}

/// Follows `source_file` back-references to the originating
/// [`ArtifactType::Source`] file name.
fn original_source_name<'a>(files: &'a [FileDescriptor], start: &'a str) -> &'a str {
    let mut current = start;
    loop {
        match files.iter().find(|f| f.name == current) {
            Some(descriptor) if descriptor.artifact_type != ArtifactType::Source => {
                match &descriptor.source_file {
                    Some(next) => current = next.as_str(),
                    None => return current,
                }
            }
            _ => return current,
        }
    }
}

#[async_trait]
impl Handler for SaveRecordsHandler {
    fn name(&self) -> &str {
        "save_records"
    }

    async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        self.record_store.create_index(&state.index).await?;

        let embeddings: Vec<FileDescriptor> = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Embedding).cloned().collect();

        for embedding_descriptor in embeddings {
            let part_n = embedding_descriptor.partition_number.unwrap_or(0);
            let sect_n = embedding_descriptor.section_number.unwrap_or(0);
            let partition_name = embedding_descriptor.source_file.clone().unwrap_or_default();
            let file_id = original_source_name(&state.files, &partition_name).to_string();

            let record_id = RecordId::compute(state.index.as_str(), state.document_id.as_str(), &file_id, part_n, sect_n);

            let vector_bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &embedding_descriptor.name).await?;
            let EmbeddingArtifact { vector } = serde_json::from_slice(&vector_bytes)?;

            let text_bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &partition_name).await?;
            let text = String::from_utf8(text_bytes).unwrap_or_default();

            let mut tags = TagCollection::new();
            tags.merge(&state.tags);
            tags.insert(TAG_DOCUMENT_ID, state.document_id.as_str());
            tags.insert(TAG_FILE_ID, &file_id);
            tags.insert(TAG_PART_N, part_n.to_string());
            tags.insert(TAG_SECT_N, sect_n.to_string());

            let mut payload: HashMap<String, Value> = HashMap::new();
            payload.insert("text".to_string(), Value::String(text));
            payload.insert("source_file".to_string(), Value::String(file_id));
            payload.insert("last_update".to_string(), Value::String(Utc::now().to_rfc3339()));

            let record = Record::new(record_id, vector, tags, payload);
            self.record_store.upsert(&state.index, record).await?;
        }

        Ok((HandlerOutcome::Success, state))
    }
}
