// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `Search` use case (spec.md §4.5 `POST /search`).

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::ScoredRecord;
use kernel_memory_domain::value_objects::{Filter, IndexName};

use crate::application::retrieval::RetrievalEngine;
use crate::infrastructure::config::RetrievalConfig;
use crate::infrastructure::metrics::KmMetrics;

pub struct SearchUseCase {
    retrieval: Arc<RetrievalEngine>,
    config: RetrievalConfig,
    metrics: Arc<KmMetrics>,
}

impl SearchUseCase {
    pub fn new(retrieval: Arc<RetrievalEngine>, config: RetrievalConfig, metrics: Arc<KmMetrics>) -> Self {
        Self { retrieval, config, metrics }
    }

    pub async fn execute(&self, index: &IndexName, query: &str, filter: &Filter, min_relevance: Option<f32>, limit: Option<usize>) -> Result<Vec<ScoredRecord>, KmError> {
        self.metrics.search_requests_total.inc();
        let min_relevance = min_relevance.unwrap_or(self.config.min_relevance);
        let limit = limit.unwrap_or(self.config.default_limit);
        self.retrieval.search(index, query, filter, min_relevance, limit).await
    }
}
