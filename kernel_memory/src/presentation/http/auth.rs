// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Optional single-header API key auth (spec.md §6): up to two valid keys
//! accepted at once so a key can be rotated without downtime.

use axum::extract::{Request, State};
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;

use super::error::HttpError;
use kernel_memory_domain::error::KmError;

/// Auth configuration for the HTTP surface. `None` disables the check
/// entirely, matching spec.md's "auth is optional" stance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub header_name: Option<String>,
    pub keys: Vec<String>,
}

impl AuthConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(header_name: impl Into<String>, keys: Vec<String>) -> Self {
        Self { header_name: Some(header_name.into()), keys }
    }

    fn is_enabled(&self) -> bool {
        self.header_name.is_some() && !self.keys.is_empty()
    }
}

pub async fn require_api_key(State(config): State<AuthConfig>, request: Request, next: Next) -> Result<Response, HttpError> {
    if !config.is_enabled() {
        return Ok(next.run(request).await);
    }
    let header_name = config.header_name.as_deref().expect("checked by is_enabled");
    let name = HeaderName::try_from(header_name).map_err(|_| HttpError::from(KmError::internal("invalid auth header name configured")))?;
    let supplied = request.headers().get(&name).and_then(|v| v.to_str().ok());
    match supplied {
        Some(key) if config.keys.iter().any(|valid| valid == key) => Ok(next.run(request).await),
        _ => Err(HttpError::from(KmError::Unauthorized)),
    }
}
