// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Route handlers: one function per endpoint in spec.md §6, thin enough
//! to just translate HTTP <-> use case calls.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::Multipart;

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::value_objects::{DocumentId, IndexName, StepName, TagCollection};

use super::dto::{
    filter_from_wire, AcceptedResponse, AskRequest, AskResponse, DeleteDocumentQuery, DeleteIndexQuery, IndexEntry, PipelineStateResponse, SearchRequest,
    SearchResponse, SearchResult, UploadResponse, UploadStatusQuery,
};
use super::error::HttpError;
use crate::application::orchestrator::{AdmitOptions, AdmitRequest};
use crate::application::builder::Memory;

pub type AppState = Arc<Memory>;

fn index_or_default(index: Option<String>) -> IndexName {
    index.map(IndexName::new).unwrap_or_else(IndexName::default_index)
}

/// `POST /upload`: multipart files plus `index`, `documentId`, repeated
/// `tags` (`key:value`), and optional `steps` (comma-separated).
pub async fn upload(State(memory): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse, HttpError> {
    let mut index: Option<String> = None;
    let mut document_id: Option<String> = None;
    let mut files: Vec<(String, String, Vec<u8>)> = Vec::new();
    let mut tags = TagCollection::new();
    let mut steps: Option<Vec<StepName>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| HttpError::from(KmError::validation(format!("invalid multipart body: {err}"))))? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "index" => index = Some(field.text().await.map_err(multipart_err)?),
            "documentId" => document_id = Some(field.text().await.map_err(multipart_err)?),
            "tags" => {
                let value = field.text().await.map_err(multipart_err)?;
                if let Some((key, val)) = value.split_once(':') {
                    tags.insert(key.trim(), val.trim());
                }
            }
            "steps" => {
                let value = field.text().await.map_err(multipart_err)?;
                steps = Some(value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(StepName::new).collect());
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
                let content = field.bytes().await.map_err(multipart_err)?;
                files.push((file_name, mime, content.to_vec()));
            }
            _ => {}
        }
    }

    let document_id = document_id.ok_or_else(|| HttpError::from(KmError::validation("documentId is required")))?;
    let index = index_or_default(index);
    let document_id = DocumentId::new(document_id);

    let request = AdmitRequest { index: index.clone(), document_id: document_id.clone(), files, tags, steps };
    memory.admit.execute(request, AdmitOptions::default()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            index: index.as_str().to_string(),
            document_id: document_id.as_str().to_string(),
            message: "document admitted".to_string(),
        }),
    ))
}

fn multipart_err(err: axum_extra::extract::multipart::MultipartError) -> HttpError {
    HttpError::from(KmError::validation(format!("invalid multipart field: {err}")))
}

/// `POST /ask`. On a missing index (spec.md §7) this returns 200 with the
/// store's no-answer fallback rather than 404 — callers shouldn't need to
/// special-case "never ingested" vs "nothing relevant".
pub async fn ask(State(memory): State<AppState>, Json(request): Json<AskRequest>) -> Result<impl IntoResponse, HttpError> {
    let index = index_or_default(request.index.clone());
    let filter = filter_from_wire(request.filter.as_ref(), request.filters.as_deref());
    let answer = memory.ask.execute(&index, &request.question, &filter, request.min_relevance, request.limit).await?;
    Ok(Json(AskResponse::new(request.question, answer)))
}

/// `POST /search`.
pub async fn search(State(memory): State<AppState>, Json(request): Json<SearchRequest>) -> Result<impl IntoResponse, HttpError> {
    let index = index_or_default(request.index.clone());
    let filter = filter_from_wire(request.filter.as_ref(), request.filters.as_deref());
    let results = memory.search.execute(&index, &request.query, &filter, request.min_relevance, request.limit).await?;
    Ok(Json(SearchResponse { query: request.query, results: results.into_iter().map(SearchResult::from).collect() }))
}

/// `GET /upload-status?index=&documentId=`.
pub async fn upload_status(State(memory): State<AppState>, Query(query): Query<UploadStatusQuery>) -> Result<impl IntoResponse, HttpError> {
    let index = index_or_default(query.index);
    let document_id = DocumentId::new(query.document_id);
    let state = memory.status.execute(&index, &document_id).await?;
    Ok(Json(PipelineStateResponse::from(state)))
}

/// `DELETE /documents?index=&documentId=` → 202, cascades async.
pub async fn delete_document(State(memory): State<AppState>, Query(query): Query<DeleteDocumentQuery>) -> Result<impl IntoResponse, HttpError> {
    let index = index_or_default(query.index);
    let document_id = DocumentId::new(query.document_id);
    memory.delete_document.execute(&index, &document_id).await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { message: "deletion scheduled".to_string() })))
}

/// `DELETE /indexes?index=` → 202.
pub async fn delete_index(State(memory): State<AppState>, Query(query): Query<DeleteIndexQuery>) -> Result<impl IntoResponse, HttpError> {
    let index = IndexName::new(query.index);
    memory.delete_index.execute(&index).await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { message: "deletion scheduled".to_string() })))
}

/// `GET /indexes`.
pub async fn list_indexes(State(memory): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let indexes = memory.list_indexes.execute().await?;
    Ok(Json(indexes.into_iter().map(IndexEntry::from).collect::<Vec<_>>()))
}

/// `GET /metrics`: a Prometheus scrape target, the ambient addition
/// spec.md's interface table doesn't list but every other endpoint's
/// counters need a place to surface.
pub async fn metrics(State(memory): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let body = memory.metrics.render()?;
    Ok((StatusCode::OK, [("content-type", "text/plain; version=0.0.4")], body))
}
