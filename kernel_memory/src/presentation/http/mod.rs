// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! # HTTP Surface
//!
//! The externally facing API from spec.md §6, built on axum: upload,
//! ask, search, status, delete, and index listing, plus a `/metrics`
//! scrape target. Grounded on the one example repo in this pack with a
//! real axum surface rather than the teacher repo, which has none.

mod auth;
mod dto;
mod error;
mod handlers;

pub use auth::AuthConfig;
pub use handlers::AppState;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::builder::Memory;

/// Builds the axum [`Router`] serving every route in spec.md §6, with
/// the optional API-key middleware and request tracing layered on top.
pub fn router(memory: Arc<Memory>, auth: AuthConfig) -> Router {
    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/ask", post(handlers::ask))
        .route("/search", post(handlers::search))
        .route("/upload-status", get(handlers::upload_status))
        .route("/documents", delete(handlers::delete_document))
        .route("/indexes", get(handlers::list_indexes).delete(handlers::delete_index))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn_with_state(auth, auth::require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(memory)
}
