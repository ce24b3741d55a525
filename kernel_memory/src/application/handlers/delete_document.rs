// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `delete_document` step: the only handler that touches both stores
//! directly. It cascade-deletes every record tagged with this document
//! (spec.md §8 invariant 4) and then removes the document's artifacts from
//! the document store, so neither orchestrator variant needs a bespoke
//! cleanup path of its own.

use std::sync::Arc;

use async_trait::async_trait;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{DocumentStore, Handler, HandlerOutcome, RecordStore};
use kernel_memory_domain::value_objects::Filter;

pub struct DeleteDocumentHandler {
    document_store: Arc<dyn DocumentStore>,
    record_store: Arc<dyn RecordStore>,
}

impl DeleteDocumentHandler {
    pub fn new(document_store: Arc<dyn DocumentStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self { document_store, record_store }
    }
}

#[async_trait]
impl Handler for DeleteDocumentHandler {
    fn name(&self) -> &str {
        "delete_document"
    }

    async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
        let filter = Filter::by_document(state.document_id.as_str());
        let records = self.record_store.get_list(&state.index, &filter, usize::MAX).await?;
        for record in records {
            self.record_store.delete(&state.index, &record.id).await?;
        }

        self.document_store.delete_document(&state.index, &state.document_id).await?;

        Ok((HandlerOutcome::Success, state))
    }
}
