// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Prompt assembly for `ask` (spec.md §4.6): records are appended to the
//! prompt highest-score-first until a token budget (again, a
//! whitespace-word approximation, see [`crate::application::handlers`])
//! is exhausted, so the text generator never sees an unbounded prompt.

use kernel_memory_domain::repositories::ScoredRecord;

/// Default maximum words of record text folded into a prompt.
const DEFAULT_MAX_PROMPT_WORDS: usize = 2000;

#[derive(Debug, Clone, Copy)]
pub struct PromptBudget {
    pub max_words: usize,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self { max_words: DEFAULT_MAX_PROMPT_WORDS }
    }
}

/// One grounding record folded into a prompt, kept for attribution in the
/// final answer.
#[derive(Debug, Clone)]
pub struct Citation {
    pub document_id: Option<String>,
    pub score: f32,
}

pub struct AssembledPrompt {
    pub prompt: String,
    pub citations: Vec<Citation>,
}

/// Builds a grounded prompt from `question` and the highest-scoring
/// `matches`, stopping once `budget.max_words` worth of record text has
/// been folded in. Matches are assumed already sorted by descending score.
pub fn assemble_prompt(question: &str, matches: &[ScoredRecord], budget: &PromptBudget) -> AssembledPrompt {
    let mut sections = Vec::new();
    let mut citations = Vec::new();
    let mut words_used = 0usize;

    for scored in matches {
        let Some(text) = scored.record.text() else { continue };
        let word_count = text.split_whitespace().count();
        if words_used + word_count > budget.max_words && !sections.is_empty() {
            break;
        }
        sections.push(text.to_string());
        citations.push(Citation { document_id: scored.record.document_id().map(str::to_string), score: scored.score });
        words_used += word_count;
    }

    let context = sections.join("\n---\n");
    let prompt = format!("Answer the question using only the context below. If the context doesn't contain the answer, say so.\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:");

    AssembledPrompt { prompt, citations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_domain::entities::Record;
    use kernel_memory_domain::value_objects::{RecordId, TagCollection};
    use std::collections::HashMap;

    fn record_with_text(text: &str, score: f32) -> ScoredRecord {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), serde_json::Value::String(text.to_string()));
        let record = Record::new(RecordId::compute("i", "d", "f", 0, 0), vec![0.0], TagCollection::new(), payload);
        ScoredRecord { record, score }
    }

    #[test]
    fn stops_once_budget_exhausted() {
        let long_text = "word ".repeat(50);
        let matches = vec![record_with_text(&long_text, 0.9), record_with_text(&long_text, 0.8)];
        let budget = PromptBudget { max_words: 60 };
        let assembled = assemble_prompt("q", &matches, &budget);
        assert_eq!(assembled.citations.len(), 1);
    }

    #[test]
    fn always_includes_at_least_one_match() {
        let long_text = "word ".repeat(5000);
        let matches = vec![record_with_text(&long_text, 0.9)];
        let budget = PromptBudget { max_words: 10 };
        let assembled = assemble_prompt("q", &matches, &budget);
        assert_eq!(assembled.citations.len(), 1);
    }
}
