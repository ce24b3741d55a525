// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Memory Builder
//!
//! Composition root for a [`Memory`]: wires a document store, record
//! store, and the embedding/text generators into either an
//! [`InProcessOrchestrator`] or a [`DistributedOrchestrator`], registers
//! the standard handler chain, and returns the assembled use cases
//! (spec.md §2's "one configuration surface, two execution strategies").

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, QueueFactory, RecordStore};

use crate::application::handlers::{
    DeleteDocumentHandler, DeleteIndexHandler, EmbedHandler, EmbedParallelHandler, ExtractHandler, PartitionHandler, SaveRecordsHandler, SummarizeHandler,
};
use crate::application::orchestrator::{DistributedOrchestrator, InProcessOrchestrator, KmOrchestrator};
use crate::application::retrieval::{EmbeddingGenerator, RetrievalEngine, TextGenerator};
use crate::application::use_cases::{AdmitUseCase, AskUseCase, DeleteDocumentUseCase, DeleteIndexUseCase, IsReadyUseCase, ListIndexesUseCase, SearchUseCase, StatusUseCase};
use crate::infrastructure::config::{PipelineConfig, RetrievalConfig};
use crate::infrastructure::metrics::KmMetrics;

/// Execution strategy an assembled [`Memory`] drives its pipeline with.
enum Strategy {
    InProcess { worker_count: Option<usize> },
    Distributed { queue_factory: Arc<dyn QueueFactory> },
}

/// Assembles a [`Memory`] from its collaborators. Every external
/// collaborator (document store, record store, embedding/text
/// generators) must be supplied; there is no hidden default, matching
/// spec.md §1's "external collaborators are out of scope" stance —
/// callers bring their own and this crate only fixes the contracts.
pub struct MemoryBuilder {
    document_store: Option<Arc<dyn DocumentStore>>,
    record_store: Option<Arc<dyn RecordStore>>,
    embedding_generator: Option<Arc<dyn EmbeddingGenerator>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    pipeline_config: PipelineConfig,
    retrieval_config: RetrievalConfig,
    strategy: Strategy,
    with_summarize: bool,
}

impl Default for MemoryBuilder {
    fn default() -> Self {
        Self {
            document_store: None,
            record_store: None,
            embedding_generator: None,
            text_generator: None,
            pipeline_config: PipelineConfig::default(),
            retrieval_config: RetrievalConfig::default(),
            strategy: Strategy::InProcess { worker_count: None },
            with_summarize: false,
        }
    }
}

impl MemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.document_store = Some(store);
        self
    }

    pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn with_embedding_generator(mut self, generator: Arc<dyn EmbeddingGenerator>) -> Self {
        self.embedding_generator = Some(generator);
        self
    }

    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    pub fn with_retrieval_config(mut self, config: RetrievalConfig) -> Self {
        self.retrieval_config = config;
        self
    }

    /// Enables the optional `summarize` step (spec.md §4.2 table).
    pub fn with_summarize(mut self) -> Self {
        self.with_summarize = true;
        self
    }

    /// Runs the pipeline in-process, on a bounded worker pool.
    pub fn in_process(mut self, worker_count: Option<usize>) -> Self {
        self.strategy = Strategy::InProcess { worker_count };
        self
    }

    /// Runs the pipeline via named queues, one worker group per step.
    pub fn distributed(mut self, queue_factory: Arc<dyn QueueFactory>) -> Self {
        self.strategy = Strategy::Distributed { queue_factory };
        self
    }

    pub async fn build(self) -> Result<Memory, KmError> {
        let document_store = self.document_store.ok_or_else(|| KmError::internal("MemoryBuilder requires a document store"))?;
        let record_store = self.record_store.ok_or_else(|| KmError::internal("MemoryBuilder requires a record store"))?;
        let embedding_generator = self.embedding_generator.ok_or_else(|| KmError::internal("MemoryBuilder requires an embedding generator"))?;
        let text_generator = self.text_generator.ok_or_else(|| KmError::internal("MemoryBuilder requires a text generator"))?;

        let orchestrator: Arc<dyn KmOrchestrator> = match self.strategy {
            Strategy::InProcess { worker_count } => {
                let workers = worker_count.or(self.pipeline_config.worker_count).unwrap_or_else(crate::application::orchestrator::default_worker_count);
                Arc::new(InProcessOrchestrator::new(document_store.clone(), record_store.clone(), workers).with_max_retries(self.pipeline_config.max_retries))
            }
            Strategy::Distributed { queue_factory } => Arc::new(DistributedOrchestrator::new(document_store.clone(), record_store.clone(), queue_factory)),
        };

        let handlers: Vec<Arc<dyn Handler>> = vec![
            Arc::new(ExtractHandler::new(document_store.clone())),
            Arc::new(PartitionHandler::new(document_store.clone()).with_chunking(self.pipeline_config.target_tokens, self.pipeline_config.overlap_tokens)),
            Arc::new(EmbedHandler::new(document_store.clone(), embedding_generator.clone())),
            Arc::new(EmbedParallelHandler::new(document_store.clone(), embedding_generator.clone())),
            Arc::new(SaveRecordsHandler::new(document_store.clone(), record_store.clone())),
            Arc::new(DeleteDocumentHandler::new(document_store.clone(), record_store.clone())),
            Arc::new(DeleteIndexHandler::new(document_store.clone(), record_store.clone())),
        ];
        for handler in handlers {
            orchestrator.add_handler(handler).await?;
        }
        if self.with_summarize {
            let summarize: Arc<dyn Handler> = Arc::new(
                SummarizeHandler::new(document_store.clone(), record_store.clone(), embedding_generator.clone()).with_text_generator(text_generator.clone()),
            );
            orchestrator.add_handler(summarize).await?;
        }

        let retrieval = Arc::new(RetrievalEngine::new(record_store.clone(), embedding_generator, text_generator));
        let metrics = Arc::new(KmMetrics::new()?);

        Ok(Memory {
            admit: AdmitUseCase::new(orchestrator.clone()),
            status: StatusUseCase::new(orchestrator.clone()),
            is_ready: IsReadyUseCase::new(orchestrator.clone()),
            delete_document: DeleteDocumentUseCase::new(orchestrator.clone()),
            delete_index: DeleteIndexUseCase::new(orchestrator.clone()),
            list_indexes: ListIndexesUseCase::new(record_store),
            search: SearchUseCase::new(retrieval.clone(), self.retrieval_config, metrics.clone()),
            ask: AskUseCase::new(retrieval, self.retrieval_config, metrics.clone()),
            orchestrator,
            metrics,
        })
    }
}

/// The assembled memory service: every use case, plus the orchestrator
/// for subscribing to lifecycle events and the metrics handle for a
/// `/metrics` route.
pub struct Memory {
    pub admit: AdmitUseCase,
    pub status: StatusUseCase,
    pub is_ready: IsReadyUseCase,
    pub delete_document: DeleteDocumentUseCase,
    pub delete_index: DeleteIndexUseCase,
    pub list_indexes: ListIndexesUseCase,
    pub search: SearchUseCase,
    pub ask: AskUseCase,
    pub orchestrator: Arc<dyn KmOrchestrator>,
    pub metrics: Arc<KmMetrics>,
}
