// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `DeleteDocument` use case (spec.md §4.1/§4.8): cascades into a
//! deletion pipeline run via [`KmOrchestrator::delete_document`].

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::{DocumentId, IndexName};

use crate::application::orchestrator::KmOrchestrator;

pub struct DeleteDocumentUseCase {
    orchestrator: Arc<dyn KmOrchestrator>,
}

impl DeleteDocumentUseCase {
    pub fn new(orchestrator: Arc<dyn KmOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError> {
        self.orchestrator.delete_document(index, document_id).await
    }
}
