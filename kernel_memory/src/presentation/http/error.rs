// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Maps [`KmError`] onto HTTP status codes (spec.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use kernel_memory_domain::error::KmError;

pub struct HttpError(pub KmError);

impl From<KmError> for HttpError {
    fn from(err: KmError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            KmError::Validation(_) => StatusCode::BAD_REQUEST,
            KmError::NotFound(_) => StatusCode::NOT_FOUND,
            KmError::Conflict(_) => StatusCode::CONFLICT,
            KmError::Unauthorized => StatusCode::UNAUTHORIZED,
            KmError::Forbidden => StatusCode::FORBIDDEN,
            KmError::Transient(_) | KmError::Terminal(_) | KmError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string(), "category": self.0.category() }));
        (status, body).into_response()
    }
}
