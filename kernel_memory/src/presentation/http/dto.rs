// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Wire shapes for the HTTP surface (spec.md §6) and their translation
//! into domain value objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kernel_memory_domain::aggregates::PipelineState;
use kernel_memory_domain::repositories::ScoredRecord;
use kernel_memory_domain::value_objects::{Conjunction, Filter, IndexName};

use crate::application::retrieval::{Answer, Citation};

/// A single tag conjunction as it comes over the wire: `{"key": "value"}`.
/// Multiple keys in one object AND together; `filters` is a list of these,
/// OR'd together; `filter` is sugar for a one-element `filters`.
pub type WireConjunction = BTreeMap<String, String>;

fn conjunction_from_wire(wire: &WireConjunction) -> Conjunction {
    wire.iter().fold(Conjunction::new(), |c, (k, v)| c.by_tag(k.clone(), v.clone()))
}

/// Combines the optional singular `filter` and plural `filters` fields
/// shared by `/ask` and `/search` into one [`Filter`] (spec.md §6).
pub fn filter_from_wire(filter: Option<&WireConjunction>, filters: Option<&[WireConjunction]>) -> Filter {
    let mut conjunctions = Vec::new();
    if let Some(filter) = filter {
        conjunctions.push(conjunction_from_wire(filter));
    }
    if let Some(filters) = filters {
        conjunctions.extend(filters.iter().map(conjunction_from_wire));
    }
    Filter::from_conjunctions(conjunctions)
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub index: Option<String>,
    pub filter: Option<WireConjunction>,
    pub filters: Option<Vec<WireConjunction>>,
    #[serde(rename = "minRelevance")]
    pub min_relevance: Option<f32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RelevantSource {
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    pub score: f32,
}

impl From<Citation> for RelevantSource {
    fn from(c: Citation) -> Self {
        Self { document_id: c.document_id, score: c.score }
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub text: String,
    #[serde(rename = "relevantSources")]
    pub relevant_sources: Vec<RelevantSource>,
}

impl AskResponse {
    pub fn new(question: String, answer: Answer) -> Self {
        Self {
            question,
            text: answer.text,
            relevant_sources: answer.citations.into_iter().map(RelevantSource::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub index: Option<String>,
    pub filter: Option<WireConjunction>,
    pub filters: Option<Vec<WireConjunction>>,
    #[serde(rename = "minRelevance")]
    pub min_relevance: Option<f32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    pub text: Option<String>,
    pub score: f32,
}

impl From<ScoredRecord> for SearchResult {
    fn from(scored: ScoredRecord) -> Self {
        Self {
            document_id: scored.record.document_id().map(str::to_string),
            text: scored.record.text().map(str::to_string),
            score: scored.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct UploadStatusQuery {
    pub index: Option<String>,
    #[serde(rename = "documentId")]
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentQuery {
    pub index: Option<String>,
    #[serde(rename = "documentId")]
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteIndexQuery {
    pub index: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub index: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub name: String,
}

impl From<IndexName> for IndexEntry {
    fn from(name: IndexName) -> Self {
        Self { name: name.as_str().to_string() }
    }
}

/// Projection of [`PipelineState`] returned by `GET /upload-status`.
#[derive(Debug, Serialize)]
pub struct PipelineStateResponse {
    pub index: String,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub status: kernel_memory_domain::value_objects::PipelineStatus,
    pub steps: Vec<String>,
    #[serde(rename = "completedSteps")]
    pub completed_steps: Vec<String>,
    #[serde(rename = "failedAttempts")]
    pub failed_attempts: u32,
    #[serde(rename = "terminalError")]
    pub terminal_error: Option<String>,
}

impl From<PipelineState> for PipelineStateResponse {
    fn from(state: PipelineState) -> Self {
        Self {
            index: state.index.as_str().to_string(),
            document_id: state.document_id.as_str().to_string(),
            status: state.status,
            steps: state.steps().iter().map(ToString::to_string).collect(),
            completed_steps: state.completed_steps().iter().map(ToString::to_string).collect(),
            failed_attempts: state.failed_attempts,
            terminal_error: state.terminal_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: String,
}
