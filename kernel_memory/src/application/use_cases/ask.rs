// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! `Ask` use case (spec.md §4.6 `POST /ask`).

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::{Filter, IndexName};

use crate::application::retrieval::{Answer, RetrievalEngine};
use crate::infrastructure::config::RetrievalConfig;
use crate::infrastructure::metrics::KmMetrics;

pub struct AskUseCase {
    retrieval: Arc<RetrievalEngine>,
    config: RetrievalConfig,
    metrics: Arc<KmMetrics>,
}

impl AskUseCase {
    pub fn new(retrieval: Arc<RetrievalEngine>, config: RetrievalConfig, metrics: Arc<KmMetrics>) -> Self {
        Self { retrieval, config, metrics }
    }

    pub async fn execute(&self, index: &IndexName, question: &str, filter: &Filter, min_relevance: Option<f32>, limit: Option<usize>) -> Result<Answer, KmError> {
        self.metrics.ask_requests_total.inc();
        let min_relevance = min_relevance.unwrap_or(self.config.min_relevance);
        let limit = limit.unwrap_or(self.config.default_limit);
        let answer = self.retrieval.ask(index, question, filter, min_relevance, limit).await?;
        if answer.no_answer {
            self.metrics.ask_no_answer_total.inc();
        }
        Ok(answer)
    }
}
