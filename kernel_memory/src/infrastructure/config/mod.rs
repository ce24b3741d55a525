// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Tunables for the ingestion/retrieval pipeline (spec.md §4.2/§4.6).
//! Layered env/file loading lives in `kernel-memory-bootstrap`; this is
//! the plain value type the core crate builds against.

use std::time::Duration;

use kernel_memory_domain::repositories::QueueOptions;

/// Chunking and retry knobs for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub max_retries: u32,
    pub visibility_timeout: Duration,
    pub worker_count: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_tokens: 200,
            overlap_tokens: 20,
            max_retries: 10,
            visibility_timeout: Duration::from_secs(300),
            worker_count: None,
        }
    }
}

impl PipelineConfig {
    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            visibility_timeout: self.visibility_timeout,
            max_retries: self.max_retries,
            ..QueueOptions::default()
        }
    }
}

/// Retrieval-side tunables: the relevance floor and prompt word budget.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    pub min_relevance: f32,
    pub max_prompt_words: usize,
    pub default_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_relevance: crate::application::retrieval::DEFAULT_MIN_RELEVANCE,
            max_prompt_words: 2000,
            default_limit: 10,
        }
    }
}
