// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `Status` use case (spec.md §4.1): reports a document's pipeline state.

use std::sync::Arc;

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::{DocumentId, IndexName};

use crate::application::orchestrator::KmOrchestrator;

pub struct StatusUseCase {
    orchestrator: Arc<dyn KmOrchestrator>,
}

impl StatusUseCase {
    pub fn new(orchestrator: Arc<dyn KmOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, index: &IndexName, document_id: &DocumentId) -> Result<PipelineState, KmError> {
        self.orchestrator
            .status(index, document_id)
            .await?
            .ok_or_else(|| KmError::not_found(format!("no pipeline state for {index}/{document_id}")))
    }
}
