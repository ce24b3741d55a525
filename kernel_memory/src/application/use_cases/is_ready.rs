// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `IsReady` use case (spec.md §4.1): a cheap boolean poll for callers
//! that don't need the full [`kernel_memory_domain::aggregates::PipelineState`].

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::{DocumentId, IndexName};

use crate::application::orchestrator::KmOrchestrator;

pub struct IsReadyUseCase {
    orchestrator: Arc<dyn KmOrchestrator>,
}

impl IsReadyUseCase {
    pub fn new(orchestrator: Arc<dyn KmOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, index: &IndexName, document_id: &DocumentId) -> Result<bool, KmError> {
        self.orchestrator.is_ready(index, document_id).await
    }
}
