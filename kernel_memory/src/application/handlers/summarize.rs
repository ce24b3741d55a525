// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `summarize` step (spec.md §4.2 table, optional): produces one synthetic
//! summary per extracted source and upserts it directly into the record
//! store, tagged `__synthetic=summary` so retrieval can exclude or target
//! it explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::entities::Record;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome, RecordStore};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, RecordId, TagCollection, TAG_DOCUMENT_ID, TAG_FILE_ID, TAG_SYNTHETIC};

use crate::application::retrieval::{EmbeddingGenerator, TextGenerator};

/// Truncation fallback used when no [`TextGenerator`] is configured: the
/// first `NAIVE_SUMMARY_WORDS` words of the extracted text.
const NAIVE_SUMMARY_WORDS: usize = 60;

pub struct SummarizeHandler {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
    embedding_generator: Arc<dyn EmbeddingGenerator>,
    text_generator: Option<Arc<dyn TextGenerator>>,
}

impl SummarizeHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>, embedding_generator: Arc<dyn EmbeddingGenerator>) -> Self {
        Self { document_store, record_store, embedding_generator, text_generator: None }
    }

    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    async fn summarize(&self, text: &str) -> Result<String, KmError> {
        match &self.text_generator {
            Some(generator) => {
                let prompt = format!("Summarize the following text in a few sentences:\n\n{text}");
                generator.generate(&prompt).await
            }
            None => Ok(text.split_whitespace().take(NAIVE_SUMMARY_WORDS).collect::<Vec<_>>().join(" ")),
        }
    }
}

#[async_trait]
impl Handler for SummarizeHandler {
    fn name(&self) -> &str {
        "summarize"
    }

    async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        self.record_store.create_index(&state.index).await?;

        let extracted: Vec<FileDescriptor> = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Extracted).cloned().collect();

        for source in extracted {
            let record_id = RecordId::compute(state.index.as_str(), state.document_id.as_str(), &source.name, 0, 0);
            let existing_filter = kernel_memory_domain::value_objects::Filter::by_document(state.document_id.as_str());
            if self.record_store.get_list(&state.index, &existing_filter, usize::MAX).await?.iter().any(|r| r.id == record_id) {
                continue;
            }

            let bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &source.name).await?;
            let text = String::from_utf8(bytes).map_err(|_| KmError::terminal("extracted artifact is not valid UTF-8"))?;
            let summary = self.summarize(&text).await?;
            let vector = self.embedding_generator.embed(&summary).await?;

            let mut tags = TagCollection::new();
            tags.merge(&state.tags);
            tags.insert(TAG_DOCUMENT_ID, state.document_id.as_str());
            tags.insert(TAG_FILE_ID, &source.name);
            tags.insert(TAG_SYNTHETIC, "summary");

            let mut payload: HashMap<String, Value> = HashMap::new();
            payload.insert("text".to_string(), Value::String(summary));
            payload.insert("source_file".to_string(), Value::String(source.name.clone()));
            payload.insert("last_update".to_string(), Value::String(Utc::now().to_rfc3339()));

            let record = Record::new(record_id, vector, tags, payload);
            self.record_store.upsert(&state.index, record).await?;
        }

        Ok((HandlerOutcome::Success, state))
    }
}
