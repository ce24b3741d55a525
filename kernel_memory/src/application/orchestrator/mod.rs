// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Orchestrator
//!
//! Owns the pipeline lifecycle: admit, persist, dispatch, advance, retry,
//! finalize (spec.md §4.1). [`KmOrchestrator`] is the capability-set
//! contract shared by [`InProcessOrchestrator`] and
//! [`DistributedOrchestrator`]; both drive the same [`PipelineRunner`]
//! logic so the state machine is implemented exactly once.

mod distributed;
mod in_process;
mod registry;
mod runner;

pub use distributed::DistributedOrchestrator;
pub use in_process::{default_worker_count, InProcessOrchestrator};
pub use registry::HandlerRegistry;
pub use runner::{execute_step, load_state, save_state, StepOutcome, DEFAULT_MAX_RETRIES, STATE_FILE_NAME};

use async_trait::async_trait;
use tokio::sync::broadcast;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::events::PipelineEvent;
use kernel_memory_domain::repositories::Handler;
use kernel_memory_domain::value_objects::{DocumentId, FileDescriptor, IndexName, StepName, TagCollection};
use kernel_memory_domain::PipelineState;

/// Capacity of the per-orchestrator lifecycle-event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Input to [`KmOrchestrator::admit`]: source files plus the caller's tags
/// and optional step override.
#[derive(Debug, Clone)]
pub struct AdmitRequest {
    pub index: IndexName,
    pub document_id: DocumentId,
    /// `(name, mime_type, content)` triples; written to the document
    /// store as `ArtifactType::Source` files.
    pub files: Vec<(String, String, Vec<u8>)>,
    pub tags: TagCollection,
    /// Overrides the standard handler chain; `None` uses
    /// [`StepName::standard_chain`].
    pub steps: Option<Vec<StepName>>,
}

/// Re-admission controls (spec.md §4.1: "merges files and replaces Steps
/// only if the existing pipeline is terminal or explicitly requested").
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmitOptions {
    pub force_restart: bool,
}

/// The orchestrator contract shared by both execution strategies.
#[async_trait]
pub trait KmOrchestrator: Send + Sync {
    /// Registers a handler implementation for a named step. Must be
    /// called before dispatch starts consuming that step's work.
    async fn add_handler(&self, handler: std::sync::Arc<dyn Handler>) -> Result<(), KmError>;

    async fn admit(&self, request: AdmitRequest, options: AdmitOptions) -> Result<DocumentId, KmError>;

    async fn status(&self, index: &IndexName, document_id: &DocumentId) -> Result<Option<PipelineState>, KmError>;

    async fn is_ready(&self, index: &IndexName, document_id: &DocumentId) -> Result<bool, KmError>;

    async fn delete_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError>;

    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError>;

    /// Subscribes to pipeline lifecycle events (SPEC_FULL.md §10
    /// supplement: lets callers observe completion without polling
    /// `Status`).
    fn subscribe(&self) -> broadcast::Receiver<PipelineEvent>;
}

/// Builds the admitted [`PipelineState`] and the source [`FileDescriptor`]s
/// for an [`AdmitRequest`], shared by both orchestrator variants.
pub(crate) fn files_from_request(files: &[(String, String, Vec<u8>)]) -> Vec<FileDescriptor> {
    files.iter().map(|(name, mime, content)| FileDescriptor::source(name.clone(), mime.clone(), content.len() as u64)).collect()
}

pub(crate) fn validate_admit_request(request: &AdmitRequest) -> Result<(), KmError> {
    if request.document_id.as_str().trim().is_empty() {
        return Err(KmError::validation("document_id must not be empty"));
    }
    if request.files.is_empty() {
        return Err(KmError::validation("at least one source file is required"));
    }
    for (name, _, content) in &request.files {
        if content.is_empty() {
            return Err(KmError::validation(format!("source file '{name}' is zero bytes")));
        }
    }
    Ok(())
}
