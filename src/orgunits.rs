// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Organizational unit API handlers
//!
//! OUs are addressed by distinguished name. Because DNs contain commas and
//! equals signs, they travel in request bodies rather than path segments.
//! Moves and renames change the DN; the directory service enforces the
//! resulting tree, this layer only checks DN syntax.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    metrics, parsers,
    types::{ApiError, AppState, RefreshParams},
    validation,
};

const STALE_WINDOW: Duration = Duration::from_secs(180);
const CACHE_PREFIX: &str = "ou:";

/// Request to create an organizational unit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgUnitRequest {
    /// Distinguished name, e.g. "OU=Sales,DC=samdom,DC=example,DC=com"
    pub dn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request naming an existing organizational unit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitRequest {
    pub dn: String,
}

/// Request to move an organizational unit under a new parent
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveOrgUnitRequest {
    pub dn: String,

    /// DN of the new parent
    pub new_parent_dn: String,
}

/// Request to rename an organizational unit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameOrgUnitRequest {
    pub dn: String,

    /// New RDN value (without the OU= prefix)
    pub new_name: String,
}

/// Response from OU mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrgUnitResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// List of organizational unit DNs
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrgUnitListResponse {
    pub org_units: Vec<String>,
    pub count: usize,
}

/// Objects contained in one organizational unit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitObjectsResponse {
    pub dn: String,
    pub objects: Vec<String>,
    pub count: usize,
}

// ========== Command Builders ==========

pub(crate) fn ou_list_args() -> Vec<String> {
    vec!["ou".to_string(), "list".to_string(), "--full-dn".to_string()]
}

pub(crate) fn create_ou_args(request: &CreateOrgUnitRequest) -> Vec<String> {
    let mut args = vec!["ou".to_string(), "create".to_string(), request.dn.clone()];
    if let Some(ref description) = request.description {
        if !description.is_empty() {
            args.push(format!("--description={}", description));
        }
    }
    args
}

pub(crate) fn delete_ou_args(dn: &str) -> Vec<String> {
    vec!["ou".to_string(), "delete".to_string(), dn.to_string()]
}

pub(crate) fn move_ou_args(dn: &str, new_parent_dn: &str) -> Vec<String> {
    vec![
        "ou".to_string(),
        "move".to_string(),
        dn.to_string(),
        new_parent_dn.to_string(),
    ]
}

pub(crate) fn rename_ou_args(dn: &str, new_name: &str) -> Vec<String> {
    vec![
        "ou".to_string(),
        "rename".to_string(),
        dn.to_string(),
        format!("OU={}", new_name),
    ]
}

pub(crate) fn ou_objects_args(dn: &str) -> Vec<String> {
    vec![
        "ou".to_string(),
        "listobjects".to_string(),
        dn.to_string(),
        "--full-dn".to_string(),
    ]
}

// ========== Handlers ==========

/// List all organizational units
#[utoipa::path(
    get,
    path = "/api/v1/ous",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "List of organizational units", body = OrgUnitListResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn list_org_units(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<OrgUnitListResponse>, ApiError> {
    info!("Listing organizational units");

    let key = "ou:list";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&ou_list_args()).await
        })
        .await
        .map_err(|e| {
            error!("ou list failed: {}", e);
            metrics::record_directory_operation("ou", "list", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    let org_units = parsers::parse_name_list(&output);
    let count = org_units.len();
    metrics::record_directory_operation("ou", "list", true);

    Ok(Json(OrgUnitListResponse { org_units, count }))
}

/// List objects contained in an organizational unit
#[utoipa::path(
    post,
    path = "/api/v1/ous/objects",
    request_body = OrgUnitRequest,
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Contained objects", body = OrgUnitObjectsResponse),
        (status = 400, description = "Invalid DN"),
        (status = 404, description = "Organizational unit not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn list_org_unit_objects(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(request): Json<OrgUnitRequest>,
) -> Result<Json<OrgUnitObjectsResponse>, ApiError> {
    info!("Listing objects in OU: {}", request.dn);
    validation::validate_ou_dn(&request.dn)?;

    let key = format!("ou:objects:{}", request.dn);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let dn = request.dn.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&ou_objects_args(&dn)).await
        })
        .await
        .map_err(|e| {
            error!("ou listobjects failed for {}: {}", request.dn, e);
            ApiError::from_command_error(&request.dn, e)
        })?;

    let objects = parsers::parse_name_list(&output);
    let count = objects.len();

    Ok(Json(OrgUnitObjectsResponse {
        dn: request.dn,
        objects,
        count,
    }))
}

/// Create an organizational unit
#[utoipa::path(
    post,
    path = "/api/v1/ous",
    request_body = CreateOrgUnitRequest,
    responses(
        (status = 201, description = "Organizational unit created", body = OrgUnitResponse),
        (status = 400, description = "Invalid DN"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn create_org_unit(
    State(state): State<AppState>,
    Json(request): Json<CreateOrgUnitRequest>,
) -> Result<(StatusCode, Json<OrgUnitResponse>), ApiError> {
    info!("Creating OU: {}", request.dn);
    validation::validate_ou_dn(&request.dn)?;

    let output = state
        .samba
        .run(&create_ou_args(&request))
        .await
        .map_err(|e| {
            error!("ou create failed for {}: {}", request.dn, e);
            metrics::record_directory_operation("ou", "create", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    info!("OU {} created successfully", request.dn);
    metrics::record_directory_operation("ou", "create", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(OrgUnitResponse {
            success: true,
            message: format!("Organizational unit {} created successfully", request.dn),
            details: Some(output),
        }),
    ))
}

/// Delete an organizational unit
#[utoipa::path(
    delete,
    path = "/api/v1/ous",
    request_body = OrgUnitRequest,
    responses(
        (status = 200, description = "Organizational unit deleted", body = OrgUnitResponse),
        (status = 400, description = "Invalid DN"),
        (status = 404, description = "Organizational unit not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn delete_org_unit(
    State(state): State<AppState>,
    Json(request): Json<OrgUnitRequest>,
) -> Result<Json<OrgUnitResponse>, ApiError> {
    info!("Deleting OU: {}", request.dn);
    validation::validate_ou_dn(&request.dn)?;

    let output = state
        .samba
        .run(&delete_ou_args(&request.dn))
        .await
        .map_err(|e| {
            error!("ou delete failed for {}: {}", request.dn, e);
            metrics::record_directory_operation("ou", "delete", false);
            ApiError::from_command_error(&request.dn, e)
        })?;

    metrics::record_directory_operation("ou", "delete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(OrgUnitResponse {
        success: true,
        message: format!("Organizational unit {} deleted successfully", request.dn),
        details: Some(output),
    }))
}

/// Move an organizational unit under a new parent
#[utoipa::path(
    post,
    path = "/api/v1/ous/move",
    request_body = MoveOrgUnitRequest,
    responses(
        (status = 200, description = "Organizational unit moved", body = OrgUnitResponse),
        (status = 400, description = "Invalid DN"),
        (status = 404, description = "Organizational unit not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn move_org_unit(
    State(state): State<AppState>,
    Json(request): Json<MoveOrgUnitRequest>,
) -> Result<Json<OrgUnitResponse>, ApiError> {
    info!("Moving OU {} under {}", request.dn, request.new_parent_dn);
    validation::validate_ou_dn(&request.dn)?;
    validation::validate_ou_dn(&request.new_parent_dn)?;

    let output = state
        .samba
        .run(&move_ou_args(&request.dn, &request.new_parent_dn))
        .await
        .map_err(|e| {
            error!("ou move failed for {}: {}", request.dn, e);
            metrics::record_directory_operation("ou", "move", false);
            ApiError::from_command_error(&request.dn, e)
        })?;

    metrics::record_directory_operation("ou", "move", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(OrgUnitResponse {
        success: true,
        message: format!(
            "Organizational unit {} moved under {}",
            request.dn, request.new_parent_dn
        ),
        details: Some(output),
    }))
}

/// Rename an organizational unit
#[utoipa::path(
    post,
    path = "/api/v1/ous/rename",
    request_body = RenameOrgUnitRequest,
    responses(
        (status = 200, description = "Organizational unit renamed", body = OrgUnitResponse),
        (status = 400, description = "Invalid DN or name"),
        (status = 404, description = "Organizational unit not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "ous"
)]
pub async fn rename_org_unit(
    State(state): State<AppState>,
    Json(request): Json<RenameOrgUnitRequest>,
) -> Result<Json<OrgUnitResponse>, ApiError> {
    info!("Renaming OU {} to {}", request.dn, request.new_name);
    validation::validate_ou_dn(&request.dn)?;
    if request.new_name.is_empty() || request.new_name.contains(',') || request.new_name.contains('=')
    {
        return Err(ApiError::InvalidRequest(format!(
            "Invalid new OU name: {}",
            request.new_name
        )));
    }

    let output = state
        .samba
        .run(&rename_ou_args(&request.dn, &request.new_name))
        .await
        .map_err(|e| {
            error!("ou rename failed for {}: {}", request.dn, e);
            metrics::record_directory_operation("ou", "rename", false);
            ApiError::from_command_error(&request.dn, e)
        })?;

    metrics::record_directory_operation("ou", "rename", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(OrgUnitResponse {
        success: true,
        message: format!(
            "Organizational unit {} renamed to {}",
            request.dn, request.new_name
        ),
        details: Some(output),
    }))
}
