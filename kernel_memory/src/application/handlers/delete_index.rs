// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `delete_index` step (spec.md §4.2 table). Both orchestrator variants
//! currently perform the enumerate-then-delete-each-document sequence
//! directly rather than dispatching through the handler registry, since
//! dropping an index is a single administrative action rather than a
//! per-document pipeline. This handler exists so the operation is still
//! addressable through the same `Handler` seam (e.g. bound to a
//! `km-delete_index` queue by a future distributed worker) rather than
//! only living as orchestrator-private logic.

use std::sync::Arc;

use async_trait::async_trait;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome, RecordStore};

pub struct DeleteIndexHandler {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
}

impl DeleteIndexHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self { document_store, record_store }
    }
}

#[async_trait]
impl Handler for DeleteIndexHandler {
    fn name(&self) -> &str {
        "delete_index"
    }

    async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        self.record_store.delete_index(&state.index).await?;
        self.document_store.delete_index(&state.index).await?;
        Ok((HandlerOutcome::Success, state))
    }
}
