// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Document Store Port
//!
//! Durable object store for source files, extracted text, partitions,
//! embeddings, and the pipeline state file (spec.md §4.3). A concrete
//! implementation is an external collaborator (local disk, S3, Azure Blob,
//! ...); this crate fixes only the contract.
//!
//! ## Guarantees
//!
//! - Single-writer per `(index, document_id, name)`.
//! - Readers see a consistent snapshot of a named file — no torn writes.
//! - Binary fidelity: round-trips preserve bytes exactly.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::KmError;
use crate::value_objects::{DocumentId, IndexName};

/// A chunk of file content, or a terminal error. Readers drain this to
/// end-of-stream; writers are given an equivalent stream to consume.
pub type FileStream = BoxStream<'static, Result<Vec<u8>, KmError>>;

/// Durable object storage for index/document-scoped files.
///
/// Implementations must be `Send + Sync` for concurrent access from the
/// orchestrator's worker pool.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the storage container for `index`, if it doesn't already exist.
    async fn create_index(&self, index: &IndexName) -> Result<(), KmError>;

    /// Deletes the storage container for `index` and everything under it.
    async fn delete_index(&self, index: &IndexName) -> Result<(), KmError>;

    /// Creates the storage container for `(index, document_id)`.
    async fn create_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError>;

    /// Deletes the storage container for `(index, document_id)` and every
    /// file under it.
    async fn delete_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError>;

    /// Removes every file under `(index, document_id)` but keeps the
    /// container itself (used to clear artifacts before a forced re-run).
    async fn empty_document(&self, index: &IndexName, document_id: &DocumentId) -> Result<(), KmError>;

    /// Writes `name` under `(index, document_id)`, replacing any prior
    /// content atomically (no torn writes visible to concurrent readers).
    async fn write_file(&self, index: &IndexName, document_id: &DocumentId, name: &str, content: Vec<u8>) -> Result<(), KmError>;

    /// Reads `name` back as a stream of byte chunks.
    async fn read_file(&self, index: &IndexName, document_id: &DocumentId, name: &str) -> Result<FileStream, KmError>;

    /// Reads `name` back fully into memory; a convenience built on
    /// [`Self::read_file`] for callers (like the pipeline-state codec) that
    /// always need the whole file.
    async fn read_file_to_vec(&self, index: &IndexName, document_id: &DocumentId, name: &str) -> Result<Vec<u8>, KmError> {
        use futures::StreamExt;
        let mut stream = self.read_file(index, document_id, name).await?;
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend(chunk?);
        }
        Ok(buffer)
    }

    /// Lists every file name currently stored under `(index, document_id)`.
    async fn list_files(&self, index: &IndexName, document_id: &DocumentId) -> Result<Vec<String>, KmError>;

    /// Whether `(index, document_id)` has been created.
    async fn exists(&self, index: &IndexName, document_id: &DocumentId) -> Result<bool, KmError>;
}
