// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `gen_embeddings` step (spec.md §4.2 table): one embedding artifact per
//! partition, via sequential calls to the [`EmbeddingGenerator`] port.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome};
use kernel_memory_domain::value_objects::{ArtifactType, FileDescriptor, StepName};

use crate::application::retrieval::EmbeddingGenerator;

/// On-disk shape of an embedding artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingArtifact {
    pub vector: Vec<f32>,
}

pub fn embedding_name(partition_name: &str) -> String {
    format!("embed__{partition_name}.json")
}

pub struct EmbedHandler {
    document_store: Arc<dyn DocumentStore>,
    generator: Arc<dyn EmbeddingGenerator>,
}

impl EmbedHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, generator: Arc<dyn EmbeddingGenerator>) -> Self {
        Self { document_store, generator }
    }
}

#[async_trait]
impl Handler for EmbedHandler {
    fn name(&self) -> &str {
        "gen_embeddings"
    }

    async fn process(&self, mut state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        let partitions: Vec<FileDescriptor> = state.files.iter().filter(|f| f.artifact_type == ArtifactType::Partition).cloned().collect();

        for partition in partitions {
            let part_n = partition.partition_number;
            let sect_n = partition.section_number;
            let already_done = state.files.iter().any(|f| f.matches_back_reference(&StepName::gen_embeddings(), &partition.name, part_n, sect_n));
            if already_done {
                continue;
            }

            let bytes = self.document_store.read_file_to_vec(&state.index, &state.document_id, &partition.name).await?;
            let text = String::from_utf8(bytes).map_err(|_| KmError::terminal("partition artifact is not valid UTF-8"))?;
            let vector = self.generator.embed(&text).await?;

            let artifact_name = embedding_name(&partition.name);
            let payload = serde_json::to_vec(&EmbeddingArtifact { vector })?;
            let size = payload.len() as u64;
            self.document_store.write_file(&state.index, &state.document_id, &artifact_name, payload).await?;

            let mut descriptor =
                FileDescriptor::generated(artifact_name, "application/json".to_string(), size, ArtifactType::Embedding, StepName::gen_embeddings(), partition.name.clone());
            if let (Some(p), Some(s)) = (part_n, sect_n) {
                descriptor = descriptor.with_partition(p, s);
            }
            state.files.push(descriptor);
        }

        Ok((HandlerOutcome::Success, state))
    }
}
