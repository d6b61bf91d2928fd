// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for shared types

use super::types::*;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[test]
fn test_api_error_status_codes() {
    let cases = vec![
        (
            ApiError::InvalidRequest("bad".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (ApiError::NotFound("alice".to_string()), StatusCode::NOT_FOUND),
        (
            ApiError::CommandFailed("NT_STATUS_ACCESS_DENIED".to_string()),
            StatusCode::BAD_GATEWAY,
        ),
        (
            ApiError::ParseError("missing dn".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ApiError::InternalError("boom".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        let response = error.into_response();
        assert_eq!(response.status(), expected);
    }
}

#[test]
fn test_command_failed_message_is_verbatim() {
    // stderr text must survive the error chain untouched
    let error = ApiError::CommandFailed("NT_STATUS_ACCESS_DENIED".to_string());
    assert_eq!(error.to_string(), "NT_STATUS_ACCESS_DENIED");
}

#[test]
fn test_from_command_error_not_found_shapes() {
    for stderr in [
        "Unable to find user alice",
        "ERROR: zone not found",
        "organizational unit does not exist",
    ] {
        let error = ApiError::from_command_error("alice", anyhow::anyhow!("{}", stderr));
        assert!(matches!(error, ApiError::NotFound(_)), "{}", stderr);
    }
}

#[test]
fn test_from_command_error_passthrough() {
    let error =
        ApiError::from_command_error("alice", anyhow::anyhow!("NT_STATUS_ACCESS_DENIED"));
    match error {
        ApiError::CommandFailed(message) => assert_eq!(message, "NT_STATUS_ACCESS_DENIED"),
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: "Invalid request: bad subnet".to_string(),
        details: None,
    };
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("Invalid request: bad subnet"));
}
