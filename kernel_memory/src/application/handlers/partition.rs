// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `partition` step (spec.md §4.2 table): a token-aware splitter with
//! target tokens per chunk and overlap tokens, never splitting inside a
//! sentence. "Tokens" here are whitespace-delimited words — an
//! approximation documented rather than a real tokenizer (SPEC_FULL.md
//! §4.6).

use std::sync::Arc;

use async_trait::async_trait;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, StepName};

const DEFAULT_TARGET_TOKENS: usize = 200;
const DEFAULT_OVERLAP_TOKENS: usize = 20;

pub struct PartitionHandler {
    document_store: Arc<dyn DocumentStore>,
    target_tokens: usize,
    overlap_tokens: usize,
}

impl PartitionHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>) -> Self {
        Self { document_store, target_tokens: DEFAULT_TARGET_TOKENS, overlap_tokens: DEFAULT_OVERLAP_TOKENS }
    }

    pub fn with_chunking(mut self, target_tokens: usize, overlap_tokens: usize) -> Self {
        self.target_tokens = target_tokens.max(1);
        self.overlap_tokens = overlap_tokens.min(self.target_tokens.saturating_sub(1));
        self
    }

    /// Splits `text` into sentences, then greedily packs sentences into
    /// chunks of roughly `target_tokens` words, repeating the trailing
    /// `overlap_tokens` words of one chunk at the head of the next so
    /// retrieval doesn't lose context at chunk boundaries.
    fn partition_text(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0usize;

        for sentence in &sentences {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            if current_len + words.len() > self.target_tokens && !current.is_empty() {
                chunks.push(current.join(" "));
                let overlap_start = current.len().saturating_sub(self.overlap_tokens);
                current = current[overlap_start..].to_vec();
                current_len = current.len();
            }
            current.extend(words.iter());
            current_len += words.len();
        }
        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        if chunks.is_empty() && !text.trim().is_empty() {
            chunks.push(text.trim().to_string());
        }
        chunks
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

#[async_trait]
impl Handler for PartitionHandler {
    fn name(&self) -> &str {
        "partition"
    }

    async fn process(&self, mut state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        let extracted: Vec<FileDescriptor> = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Extracted).cloned().collect();

        for source in extracted {
            // A source is split into however many chunks its length calls
            // for, so there's no fixed part_n/sect_n to probe for like the
            // other handlers do; any existing Partition descriptor derived
            // from this source means the split already ran.
            let already_done = state
                .files
                .iter()
                .any(|f| f.artifact_type == ArtifactType::Partition && f.generated_by_step.as_ref() == Some(&StepName::partition()) && f.source_file.as_deref() == Some(source.name.as_str()));
            if already_done {
                continue;
            }

            let bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &source.name).await?;
            let text = String::from_utf8(bytes).map_err(|_| KmError::terminal("extracted artifact is not valid UTF-8"))?;
            let chunks = self.partition_text(&text);

            for (part_n, chunk) in chunks.into_iter().enumerate() {
                let name = format!("part__{}__{part_n:04}.txt", source.name);
                let content = chunk.into_bytes();
                let size = content.len() as u64;
                self.document_store.write_file(&state.index, &state.document_id, &name, content).await?;

                let descriptor = FileDescriptor::generated(name, "text/plain".to_string(), size, ArtifactType::Partition, StepName::partition(), source.name.clone())
                    .with_partition(part_n as u32, 0);
                state.files.push(descriptor);
            }
        }

        Ok((HandlerOutcome::Success, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopStore;
    #[async_trait]
    impl DocumentStore for NoopStore {
        async fn create_index(&self, _: &kernel_memory_domain::value_objects::IndexName) -> Result<(), KmError> {
            Ok(())
        }
        async fn delete_index(&self, _: &kernel_memory_domain::value_objects::IndexName) -> Result<(), KmError> {
            Ok(())
        }
        async fn create_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn delete_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn empty_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn write_file(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId, _: &str, _: Vec<u8>) -> Result<(), KmError> {
            Ok(())
        }
        async fn read_file(
            &self,
            _: &kernel_memory_domain::value_objects::IndexName,
            _: &kernel_memory_domain::value_objects::DocumentId,
            _: &str,
        ) -> Result<kernel_memory_domain::repositories::FileStream, KmError> {
            Ok(Box::pin(futures::stream::empty()))
        }
        async fn list_files(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<Vec<String>, KmError> {
            Ok(vec![])
        }
        async fn exists(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<bool, KmError> {
            Ok(true)
        }
    }

    #[test]
    fn small_text_yields_single_chunk() {
        let handler = PartitionHandler::new(Arc::new(NoopStore));
        let chunks = handler.partition_text("A short sentence. Another one.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_is_split_with_overlap() {
        let handler = PartitionHandler::new(Arc::new(NoopStore)).with_chunking(5, 2);
        let text = "One. Two three four. Five six seven eight. Nine ten eleven twelve.";
        let chunks = handler.partition_text(text);
        assert!(chunks.len() > 1);
    }

    struct FixedTextStore {
        content: Vec<u8>,
    }

    #[async_trait]
    impl DocumentStore for FixedTextStore {
        async fn create_index(&self, _: &kernel_memory_domain::value_objects::IndexName) -> Result<(), KmError> {
            Ok(())
        }
        async fn delete_index(&self, _: &kernel_memory_domain::value_objects::IndexName) -> Result<(), KmError> {
            Ok(())
        }
        async fn create_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn delete_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn empty_document(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<(), KmError> {
            Ok(())
        }
        async fn write_file(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId, _: &str, _: Vec<u8>) -> Result<(), KmError> {
            Ok(())
        }
        async fn read_file(
            &self,
            _: &kernel_memory_domain::value_objects::IndexName,
            _: &kernel_memory_domain::value_objects::DocumentId,
            _: &str,
        ) -> Result<kernel_memory_domain::repositories::FileStream, KmError> {
            let content = self.content.clone();
            Ok(Box::pin(futures::stream::once(async move { Ok(content) })))
        }
        async fn list_files(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<Vec<String>, KmError> {
            Ok(vec![])
        }
        async fn exists(&self, _: &kernel_memory_domain::value_objects::IndexName, _: &kernel_memory_domain::value_objects::DocumentId) -> Result<bool, KmError> {
            Ok(true)
        }
    }

    fn extracted_source() -> FileDescriptor {
        FileDescriptor::generated("extracted__doc.txt.txt", "text/plain", 0, ArtifactType::Extracted, StepName::extract(), "doc.txt")
    }

    #[tokio::test]
    async fn reprocessing_an_already_partitioned_source_adds_no_duplicates() {
        use kernel_memory_domain::aggregates::PipelineState;
        use kernel_memory_domain::value_objects::{DocumentId, IndexName, TagCollection};

        let store: Arc<dyn DocumentStore> = Arc::new(FixedTextStore {
            content: b"One. Two. Three. Four.".to_vec(),
        });
        let handler = PartitionHandler::new(store).with_chunking(1, 0);

        let state = PipelineState::admit(IndexName::new("default"), DocumentId::new("d1"), vec![StepName::partition()], vec![extracted_source()], TagCollection::new());

        let (_, state) = handler.process(state).await.unwrap();
        let first_run_partitions = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Partition).count();
        assert!(first_run_partitions > 0);

        // Simulates a retried invocation of the same step before
        // `complete_step` ran (e.g. after a transient write failure).
        let (_, state) = handler.process(state).await.unwrap();
        let second_run_partitions = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Partition).count();
        assert_eq!(first_run_partitions, second_run_partitions);
    }
}
