// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `DeleteIndex` use case (spec.md §4.1): drops an entire index and every
//! document's artifacts and records under it.

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::IndexName;

use crate::application::orchestrator::KmOrchestrator;

pub struct DeleteIndexUseCase {
    orchestrator: Arc<dyn KmOrchestrator>,
}

impl DeleteIndexUseCase {
    pub fn new(orchestrator: Arc<dyn KmOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, index: &IndexName) -> Result<(), KmError> {
        self.orchestrator.delete_index(index).await
    }
}
