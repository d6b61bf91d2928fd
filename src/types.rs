// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common types and errors used throughout the sambacar library

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{cache::QueryCache, samba::SambaToolExecutor};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// samba-tool command executor
    pub samba: Arc<SambaToolExecutor>,
    /// Query cache for read operations
    pub cache: Arc<QueryCache>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Query parameters shared by cached read endpoints
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Bypass the cache and re-run the underlying command
    #[serde(default)]
    pub refresh: bool,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    // Message is samba-tool's stderr, passed through verbatim
    #[error("{0}")]
    CommandFailed(String),

    #[error("Failed to parse samba-tool output: {0}")]
    ParseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::CommandFailed(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            ApiError::ParseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details: None,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    /// Classify a failed samba-tool invocation: stderr mentioning a missing
    /// entity becomes a 404, anything else is a 502 with the stderr verbatim.
    pub fn from_command_error(entity: &str, err: anyhow::Error) -> Self {
        let message = err.to_string();
        if message.contains("Unable to find")
            || message.contains("not found")
            || message.contains("does not exist")
            || message.contains("NO_SUCH")
        {
            ApiError::NotFound(entity.to_string())
        } else {
            ApiError::CommandFailed(message)
        }
    }
}
