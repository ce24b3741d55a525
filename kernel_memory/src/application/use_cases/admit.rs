// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `Admit` use case (spec.md §4.1): the entry point for uploading a
//! document. Thin orchestration over [`KmOrchestrator::admit`] — the
//! state machine itself lives in the orchestrator.

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::DocumentId;

use crate::application::orchestrator::{AdmitOptions, AdmitRequest, KmOrchestrator};

pub struct AdmitUseCase {
    orchestrator: Arc<dyn KmOrchestrator>,
}

impl AdmitUseCase {
    pub fn new(orchestrator: Arc<dyn KmOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, request: AdmitRequest, options: AdmitOptions) -> Result<DocumentId, KmError> {
        self.orchestrator.admit(request, options).await
    }
}
