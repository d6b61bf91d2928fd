// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authentication middleware
//!
//! Validates that incoming requests carry a Bearer token in the Authorization
//! header. When `API_TOKEN` is configured the token must match it exactly;
//! otherwise presence of a non-empty token is enough, which is only
//! acceptable behind a trusted reverse proxy on the DC host.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Error response for authentication failures
#[derive(Serialize)]
pub struct AuthError {
    pub error: String,
}

fn unauthorized(message: &str) -> (StatusCode, Json<AuthError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthError {
            error: message.to_string(),
        }),
    )
}

/// Authentication middleware
///
/// # Headers
/// - `Authorization: Bearer <token>` - Required
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - No Authorization header is present
/// - Authorization header is malformed
/// - `API_TOKEN` is set and the token does not match it
pub async fn authenticate(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<AuthError>)> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header");
            unauthorized("Missing Authorization header")
        })?;

    if !auth_header.starts_with("Bearer ") {
        warn!("Invalid Authorization header format");
        return Err(unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>",
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    if token.is_empty() {
        warn!("Empty token in Authorization header");
        return Err(unauthorized("Empty token"));
    }

    // Compare against the configured token when one is set
    if let Ok(expected) = std::env::var("API_TOKEN") {
        if !expected.is_empty() && token != expected {
            warn!("Token does not match configured API_TOKEN");
            return Err(unauthorized("Invalid token"));
        }
    }

    debug!("Request authenticated");

    Ok(next.run(request).await)
}
