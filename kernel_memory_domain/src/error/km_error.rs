// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error type for the ingestion/retrieval domain,
//! categorized so the application layer can translate failures into
//! pipeline-state transitions and the presentation layer can translate
//! them into HTTP statuses without re-deriving the classification.
//!
//! ## Categories
//!
//! - **Validation** — bad input; never retried.
//! - **NotFound** — missing index/document on a read.
//! - **Conflict** — concurrent re-admit with incompatible steps.
//! - **Transient** — retried internally; surfaced only after retries are
//!   exhausted, at which point the pipeline records a `Terminal` error.
//! - **Terminal** — non-retriable ingestion failure, recorded on the
//!   pipeline state.
//! - **Unauthorized** / **Forbidden** — auth failures at the boundary.
//! - **Internal** — anything else; a bug or an unhandled collaborator
//!   failure.

use thiserror::Error;

/// Domain-specific errors for the ingestion and retrieval core.
#[derive(Error, Debug, Clone)]
pub enum KmError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl KmError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a caller should retry the operation that produced this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KmError::Transient(_))
    }

    /// Coarse category used for logging and metrics labels.
    pub fn category(&self) -> &'static str {
        match self {
            KmError::Validation(_) => "validation",
            KmError::NotFound(_) => "not_found",
            KmError::Conflict(_) => "conflict",
            KmError::Transient(_) => "transient",
            KmError::Terminal(_) => "terminal",
            KmError::Unauthorized => "unauthorized",
            KmError::Forbidden => "forbidden",
            KmError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for KmError {
    fn from(err: std::io::Error) -> Self {
        KmError::Internal(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for KmError {
    fn from(err: serde_json::Error) -> Self {
        KmError::Internal(format!("serialization error: {err}"))
    }
}
