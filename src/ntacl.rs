// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! NT ACL API handlers
//!
//! Reads and writes NT security descriptors on files exported by the DC.
//! The SDDL string is the authoritative value: `get` returns it verbatim and
//! attaches a structured parse when the descriptor is understood, and `set`
//! sends the caller's SDDL through unchanged. sysvolcheck/sysvolreset wrap
//! the matching samba-tool maintenance commands.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    metrics,
    sddl::{self, SecurityDescriptor},
    types::{ApiError, AppState},
};

const STALE_WINDOW: Duration = Duration::from_secs(120);
const CACHE_PREFIX: &str = "ntacl:";

/// Query parameters for reading an ACL
#[derive(Debug, Deserialize)]
pub struct NtAclQueryParams {
    /// Filesystem path on the DC
    pub path: String,

    #[serde(default)]
    pub refresh: bool,
}

/// Request to set an ACL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetNtAclRequest {
    /// Filesystem path on the DC
    pub path: String,

    /// Security descriptor in SDDL form
    pub sddl: String,
}

/// ACL of one path; the raw SDDL is authoritative and the structured
/// descriptor is absent when it could not be parsed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NtAclResponse {
    pub path: String,

    pub raw_sddl: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<SecurityDescriptor>,
}

/// Response from ACL mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NtAclActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ========== Command Builders ==========

pub(crate) fn ntacl_get_args(path: &str) -> Vec<String> {
    vec![
        "ntacl".to_string(),
        "get".to_string(),
        path.to_string(),
        "--as-sddl".to_string(),
    ]
}

pub(crate) fn ntacl_set_args(sddl: &str, path: &str) -> Vec<String> {
    vec![
        "ntacl".to_string(),
        "set".to_string(),
        sddl.to_string(),
        path.to_string(),
    ]
}

pub(crate) fn sysvolcheck_args() -> Vec<String> {
    vec!["ntacl".to_string(), "sysvolcheck".to_string()]
}

pub(crate) fn sysvolreset_args() -> Vec<String> {
    vec!["ntacl".to_string(), "sysvolreset".to_string()]
}

fn validate_path(path: &str) -> Result<(), ApiError> {
    if !path.starts_with('/') || path.contains('\0') {
        return Err(ApiError::InvalidRequest(format!(
            "Path must be absolute: {}",
            path
        )));
    }
    Ok(())
}

// ========== Handlers ==========

/// Get the NT ACL of a path
#[utoipa::path(
    get,
    path = "/api/v1/ntacl",
    params(
        ("path" = String, Query, description = "Filesystem path on the DC"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "ACL in SDDL form", body = NtAclResponse),
        (status = 400, description = "Invalid path"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ntacl"
)]
pub async fn get_ntacl(
    State(state): State<AppState>,
    Query(params): Query<NtAclQueryParams>,
) -> Result<Json<NtAclResponse>, ApiError> {
    info!("Reading NT ACL for {}", params.path);
    validate_path(&params.path)?;

    let key = format!("ntacl:get:{}", params.path);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let path = params.path.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&ntacl_get_args(&path)).await
        })
        .await
        .map_err(|e| {
            error!("ntacl get failed for {}: {}", params.path, e);
            ApiError::from_command_error(&params.path, e)
        })?;

    let raw_sddl = output.trim().to_string();

    // Structured view is best-effort; the raw SDDL is the authoritative value
    let descriptor = match sddl::parse_sddl(&raw_sddl) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            warn!("SDDL parse failed for {}: {}", params.path, e);
            None
        }
    };

    Ok(Json(NtAclResponse {
        path: params.path,
        raw_sddl,
        descriptor,
    }))
}

/// Set the NT ACL of a path
#[utoipa::path(
    post,
    path = "/api/v1/ntacl",
    request_body = SetNtAclRequest,
    responses(
        (status = 200, description = "ACL updated", body = NtAclActionResponse),
        (status = 400, description = "Invalid path or SDDL"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ntacl"
)]
pub async fn set_ntacl(
    State(state): State<AppState>,
    Json(request): Json<SetNtAclRequest>,
) -> Result<Json<NtAclActionResponse>, ApiError> {
    info!("Setting NT ACL for {}", request.path);
    validate_path(&request.path)?;

    // Reject descriptors this layer cannot even parse before shipping them
    sddl::parse_sddl(&request.sddl)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid SDDL: {}", e)))?;

    let output = state
        .samba
        .run(&ntacl_set_args(&request.sddl, &request.path))
        .await
        .map_err(|e| {
            error!("ntacl set failed for {}: {}", request.path, e);
            metrics::record_directory_operation("ntacl", "set", false);
            ApiError::from_command_error(&request.path, e)
        })?;

    metrics::record_directory_operation("ntacl", "set", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(NtAclActionResponse {
        success: true,
        message: format!("ACL updated for {}", request.path),
        details: Some(output),
    }))
}

/// Check sysvol ACLs against the expected defaults
#[utoipa::path(
    post,
    path = "/api/v1/ntacl/sysvolcheck",
    responses(
        (status = 200, description = "Check passed", body = NtAclActionResponse),
        (status = 502, description = "Check failed or command error")
    ),
    tag = "ntacl"
)]
pub async fn sysvolcheck(
    State(state): State<AppState>,
) -> Result<Json<NtAclActionResponse>, ApiError> {
    info!("Running sysvolcheck");

    let output = state.samba.run(&sysvolcheck_args()).await.map_err(|e| {
        error!("sysvolcheck failed: {}", e);
        metrics::record_directory_operation("ntacl", "sysvolcheck", false);
        ApiError::CommandFailed(e.to_string())
    })?;

    metrics::record_directory_operation("ntacl", "sysvolcheck", true);

    Ok(Json(NtAclActionResponse {
        success: true,
        message: "sysvol ACLs match the expected defaults".to_string(),
        details: Some(output),
    }))
}

/// Reset sysvol ACLs to the expected defaults
#[utoipa::path(
    post,
    path = "/api/v1/ntacl/sysvolreset",
    responses(
        (status = 200, description = "Reset completed", body = NtAclActionResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ntacl"
)]
pub async fn sysvolreset(
    State(state): State<AppState>,
) -> Result<Json<NtAclActionResponse>, ApiError> {
    warn!("Resetting sysvol ACLs");

    let output = state.samba.run(&sysvolreset_args()).await.map_err(|e| {
        error!("sysvolreset failed: {}", e);
        metrics::record_directory_operation("ntacl", "sysvolreset", false);
        ApiError::CommandFailed(e.to_string())
    })?;

    metrics::record_directory_operation("ntacl", "sysvolreset", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(NtAclActionResponse {
        success: true,
        message: "sysvol ACLs reset to defaults".to_string(),
        details: Some(output),
    }))
}
