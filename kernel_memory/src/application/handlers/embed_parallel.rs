// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `gen_embeddings_parallel`: fans out embedding calls across partitions
//! via [`EmbeddingGenerator::embed_batch`] instead of one call per
//! partition (spec.md §4.2).

use std::sync::Arc;

use async_trait::async_trait;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, StepName};

use super::embed::{embedding_name, EmbeddingArtifact};
use crate::application::retrieval::EmbeddingGenerator;

pub struct EmbedParallelHandler {
    document_store: Arc<dyn DocumentStore>,
    generator: Arc<dyn EmbeddingGenerator>,
}

impl EmbedParallelHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, generator: Arc<dyn EmbeddingGenerator>) -> Self {
        Self { document_store, generator }
    }
}

#[async_trait]
impl Handler for EmbedParallelHandler {
    fn name(&self) -> &str {
        "gen_embeddings_parallel"
    }

    async fn process(&self, mut state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        let pending: Vec<FileDescriptor> = state
            .files
            .iter()
            .filter(|f| f.artifact_type == ArtifactType::Partition)
            .filter(|partition| {
                !state
                    .files
                    .iter()
                    .any(|f| f.matches_back_reference(&StepName::gen_embeddings_parallel(), &partition.name, partition.partition_number, partition.section_number))
            })
            .cloned()
            .collect();

        if pending.is_empty() {
            return Ok((HandlerOutcome::Success, state));
        }

        let mut texts = Vec::with_capacity(pending.len());
        for partition in &pending {
            let bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &partition.name).await?;
            texts.push(String::from_utf8(bytes).map_err(|_| KmError::terminal("partition artifact is not valid UTF-8"))?);
        }

        let vectors = self.generator.embed_batch(&texts).await?;
        if vectors.len() != pending.len() {
            return Err(KmError::internal("embedding batch size mismatch"));
        }

        for (partition, vector) in pending.into_iter().zip(vectors) {
            let artifact_name = embedding_name(&partition.name);
            let payload = serde_json::to_vec(&EmbeddingArtifact { vector })?;
            let size = payload.len() as u64;
            self.document_store.write_file(&state.index, &state.document_id, &artifact_name, payload).await?;

            let mut descriptor = FileDescriptor::generated(
                artifact_name,
                "application/json".to_string(),
                size,
                ArtifactType::Embedding,
                StepName::gen_embeddings_parallel(),
                partition.name.clone(),
            );
            if let (Some(p), Some(s)) = (partition.partition_number, partition.section_number) {
                descriptor = descriptor.with_partition(p, s);
            }
            state.files.push(descriptor);
        }

        Ok((HandlerOutcome::Success, state))
    }
}
