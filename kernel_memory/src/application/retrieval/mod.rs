// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Retrieval: turning a query embedding into scored records (`search`) and
//! a grounded prompt into an answer (`ask`), per spec.md §4.5/§4.6.

mod contract;
mod prompt;

pub use contract::{EmbeddingGenerator, TextGenerator};
pub use prompt::{assemble_prompt, Citation, PromptBudget};

use std::sync::Arc;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::{RecordStore, ScoredRecord};
use kernel_memory_domain::value_objects::{Filter, IndexName, TAG_SYNTHETIC};

/// Answer produced by [`RetrievalEngine::ask`], the records used to ground
/// it, and whether the answer is the store's "nothing relevant" fallback.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub no_answer: bool,
}

/// Default relevance floor applied when a caller doesn't supply one
/// (spec.md §4.6).
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.0;

/// The canned response returned when no record clears the relevance floor,
/// per spec.md §4.6's "don't answer from nothing" requirement.
pub const NO_ANSWER_TEXT: &str = "I don't have enough information in memory to answer that question.";

/// Whether `filter` itself names the reserved `__synthetic` tag, meaning
/// the caller is deliberately asking for synthetic records and the
/// default exclusion should step aside.
fn requests_synthetic(filter: &Filter) -> bool {
    filter.conjunctions().iter().any(|c| c.requirements().any(|(key, _)| key == TAG_SYNTHETIC))
}

pub struct RetrievalEngine {
    record_store: Arc<dyn RecordStore>,
    embedding_generator: Arc<dyn EmbeddingGenerator>,
    text_generator: Arc<dyn TextGenerator>,
    budget: PromptBudget,
}

impl RetrievalEngine {
    pub fn new(record_store: Arc<dyn RecordStore>, embedding_generator: Arc<dyn EmbeddingGenerator>, text_generator: Arc<dyn TextGenerator>) -> Self {
        Self { record_store, embedding_generator, text_generator, budget: PromptBudget::default() }
    }

    pub fn with_budget(mut self, budget: PromptBudget) -> Self {
        self.budget = budget;
        self
    }

    /// `search`: embeds `query`, asks the record store for the closest
    /// matches within `filter`/`min_relevance`, and returns them ranked.
    /// Synthetic records (e.g. `summarize`-generated) are excluded by
    /// default unless `filter` explicitly asks for `__synthetic` itself.
    pub async fn search(&self, index: &IndexName, query: &str, filter: &Filter, min_relevance: f32, limit: usize) -> Result<Vec<ScoredRecord>, KmError> {
        let embedding = self.embedding_generator.embed(query).await?;
        let matches = self.record_store.get_similar(index, &embedding, filter, min_relevance, limit).await?;
        if requests_synthetic(filter) {
            Ok(matches)
        } else {
            Ok(matches.into_iter().filter(|scored| !scored.record.is_synthetic()).collect())
        }
    }

    /// `ask`: runs `search`, then assembles a token-budgeted prompt from
    /// the results and asks the text generator for an answer. Returns
    /// [`NO_ANSWER_TEXT`] without calling the text generator at all when
    /// nothing clears `min_relevance` — grounding failures shouldn't
    /// silently turn into hallucinated answers.
    pub async fn ask(&self, index: &IndexName, question: &str, filter: &Filter, min_relevance: f32, limit: usize) -> Result<Answer, KmError> {
        let matches = self.search(index, question, filter, min_relevance, limit).await?;
        if matches.is_empty() {
            return Ok(Answer { text: NO_ANSWER_TEXT.to_string(), citations: Vec::new(), no_answer: true });
        }

        let assembled = assemble_prompt(question, &matches, &self.budget);
        let text = self.text_generator.generate(&assembled.prompt).await?;
        Ok(Answer { text, citations: assembled.citations, no_answer: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::record_store::InMemoryRecordStore;
    use kernel_memory_domain::entities::Record;
    use kernel_memory_domain::value_objects::{RecordId, TagCollection};
    use std::collections::HashMap;

    struct FixedEmbedding;
    #[async_trait::async_trait]
    impl EmbeddingGenerator for FixedEmbedding {
        fn dimensions(&self) -> usize {
            1
        }
        async fn embed(&self, _: &str) -> Result<Vec<f32>, KmError> {
            Ok(vec![1.0])
        }
    }

    struct NoopText;
    #[async_trait::async_trait]
    impl TextGenerator for NoopText {
        async fn generate(&self, _: &str) -> Result<String, KmError> {
            Ok("answer".to_string())
        }
    }

    fn engine(store: Arc<InMemoryRecordStore>) -> RetrievalEngine {
        RetrievalEngine::new(store, Arc::new(FixedEmbedding), Arc::new(NoopText))
    }

    async fn seed(store: &InMemoryRecordStore, index: &IndexName) {
        store.create_index(index).await.unwrap();
        let plain = Record::new(RecordId::compute("idx", "doc", "plain.txt", 0, 0), vec![1.0], TagCollection::new(), HashMap::new());
        let synthetic = Record::new(
            RecordId::compute("idx", "doc", "summary.txt", 0, 0),
            vec![1.0],
            TagCollection::new().with(TAG_SYNTHETIC, "summary"),
            HashMap::new(),
        );
        store.upsert(index, plain).await.unwrap();
        store.upsert(index, synthetic).await.unwrap();
    }

    #[tokio::test]
    async fn search_excludes_synthetic_records_by_default() {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = IndexName::new("idx");
        seed(&store, &index).await;

        let results = engine(store).search(&index, "q", &Filter::unfiltered(), -1.0, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].record.is_synthetic());
    }

    #[tokio::test]
    async fn search_returns_synthetic_records_when_explicitly_requested() {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = IndexName::new("idx");
        seed(&store, &index).await;

        let filter = Filter::by_tag(TAG_SYNTHETIC, "summary");
        let results = engine(store).search(&index, "q", &filter, -1.0, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].record.is_synthetic());
    }
}
