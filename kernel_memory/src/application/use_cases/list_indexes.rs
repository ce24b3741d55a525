// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `ListIndexes` use case (spec.md §6 `GET /indexes`).

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::RecordStore;
use kernel_memory_domain::value_objects::IndexName;

pub struct ListIndexesUseCase {
    record_store: Arc<dyn RecordStore>,
}

impl ListIndexesUseCase {
    pub fn new(record_store: Arc<dyn RecordStore>) -> Self {
        Self { record_store }
    }

    pub async fn execute(&self) -> Result<Vec<IndexName>, KmError> {
        self.record_store.list_indexes().await
    }
}
