// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Group management API handlers
//!
//! Listing, creating, and deleting security groups, plus membership changes.
//! Membership is passed to samba-tool as a comma-separated list, matching
//! `group addmembers`/`group removemembers`.

use axum::{
    extract::{Path, Query, State},
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

const STALE_WINDOW: Duration = Duration::from_secs(120);
const CACHE_PREFIX: &str = "group:";

/// Request to create a new group
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    /// Group name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Group scope: domain, global, universal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_scope: Option<String>,

    /// Group type: security, distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
}

/// Request to add or remove group members
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembersRequest {
    /// Account names to add or remove
    pub members: Vec<String>,
}

/// Response from group mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// List of group names
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupListResponse {
    pub groups: Vec<String>,
    pub count: usize,
}

/// Members of one group
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupMembersResponse {
    pub group: String,
    pub members: Vec<String>,
    pub count: usize,
}

// ========== Command Builders ==========

pub(crate) fn group_list_args() -> Vec<String> {
    vec!["group".to_string(), "list".to_string()]
}

pub(crate) fn group_members_args(name: &str) -> Vec<String> {
    vec![
        "group".to_string(),
        "listmembers".to_string(),
        name.to_string(),
    ]
}

pub(crate) fn create_group_args(request: &CreateGroupRequest) -> Vec<String> {
    let mut args = vec!["group".to_string(), "add".to_string(), request.name.clone()];

    if let Some(ref description) = request.description {
        if !description.is_empty() {
            args.push(format!("--description={}", description));
        }
    }
    if let Some(ref scope) = request.group_scope {
        if !scope.is_empty() {
            args.push(format!("--group-scope={}", scope));
        }
    }
    if let Some(ref group_type) = request.group_type {
        if !group_type.is_empty() {
            args.push(format!("--group-type={}", group_type));
        }
    }

    args
}

pub(crate) fn delete_group_args(name: &str) -> Vec<String> {
    vec!["group".to_string(), "delete".to_string(), name.to_string()]
}

pub(crate) fn add_members_args(name: &str, members: &[String]) -> Vec<String> {
    vec![
        "group".to_string(),
        "addmembers".to_string(),
        name.to_string(),
        members.join(","),
    ]
}

pub(crate) fn remove_members_args(name: &str, members: &[String]) -> Vec<String> {
    vec![
        "group".to_string(),
        "removemembers".to_string(),
        name.to_string(),
        members.join(","),
    ]
}

fn validate_members(members: &[String]) -> Result<(), ApiError> {
    if members.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Member list cannot be empty".to_string(),
        ));
    }
    for member in members {
        validation::validate_username(member)?;
    }
    Ok(())
}

// ========== Handlers ==========

/// List all groups
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "List of groups", body = GroupListResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<GroupListResponse>, ApiError> {
    info!("Listing groups");

    let key = "group:list";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&group_list_args()).await
        })
        .await
        .map_err(|e| {
            error!("group list failed: {}", e);
            metrics::record_directory_operation("group", "list", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    let groups = parsers::parse_name_list(&output);
    let count = groups.len();
    metrics::record_directory_operation("group", "list", true);

    Ok(Json(GroupListResponse { groups, count }))
}

/// List members of a group
#[utoipa::path(
    get,
    path = "/api/v1/groups/{name}/members",
    params(
        ("name" = String, Path, description = "Group name"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Group members", body = GroupMembersResponse),
        (status = 404, description = "Group not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn list_group_members(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<GroupMembersResponse>, ApiError> {
    info!("Listing members of group: {}", name);
    validation::validate_group_name(&name)?;

    let key = format!("group:members:{}", name);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let group = name.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&group_members_args(&group)).await
        })
        .await
        .map_err(|e| {
            error!("group listmembers failed for {}: {}", name, e);
            ApiError::from_command_error(&name, e)
        })?;

    let members = parsers::parse_name_list(&output);
    let count = members.len();

    Ok(Json(GroupMembersResponse {
        group: name,
        members,
        count,
    }))
}

/// Create a new group
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = GroupResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    info!("Creating group: {}", request.name);
    validation::validate_group_name(&request.name)?;

    if let Some(ref scope) = request.group_scope {
        if !["domain", "global", "universal"].contains(&scope.as_str()) {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid group scope: {}. Must be 'domain', 'global' or 'universal'",
                scope
            )));
        }
    }
    if let Some(ref group_type) = request.group_type {
        if !["security", "distribution"].contains(&group_type.as_str()) {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid group type: {}. Must be 'security' or 'distribution'",
                group_type
            )));
        }
    }

    let output = state
        .samba
        .run(&create_group_args(&request))
        .await
        .map_err(|e| {
            error!("group add failed for {}: {}", request.name, e);
            metrics::record_directory_operation("group", "create", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    info!("Group {} created successfully", request.name);
    metrics::record_directory_operation("group", "create", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            success: true,
            message: format!("Group {} created successfully", request.name),
            details: Some(output),
        }),
    ))
}

/// Delete a group
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{name}",
    params(
        ("name" = String, Path, description = "Group name to delete")
    ),
    responses(
        (status = 200, description = "Group deleted successfully", body = GroupResponse),
        (status = 404, description = "Group not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GroupResponse>, ApiError> {
    info!("Deleting group: {}", name);
    validation::validate_group_name(&name)?;

    let output = state
        .samba
        .run(&delete_group_args(&name))
        .await
        .map_err(|e| {
            error!("group delete failed for {}: {}", name, e);
            metrics::record_directory_operation("group", "delete", false);
            ApiError::from_command_error(&name, e)
        })?;

    info!("Group {} deleted successfully", name);
    metrics::record_directory_operation("group", "delete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(GroupResponse {
        success: true,
        message: format!("Group {} deleted successfully", name),
        details: Some(output),
    }))
}

/// Add members to a group
#[utoipa::path(
    post,
    path = "/api/v1/groups/{name}/members",
    request_body = MembersRequest,
    params(
        ("name" = String, Path, description = "Group name")
    ),
    responses(
        (status = 200, description = "Members added", body = GroupResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Group not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn add_group_members(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    info!("Adding members to group {}: {:?}", name, request.members);
    validation::validate_group_name(&name)?;
    validate_members(&request.members)?;

    let output = state
        .samba
        .run(&add_members_args(&name, &request.members))
        .await
        .map_err(|e| {
            error!("group addmembers failed for {}: {}", name, e);
            metrics::record_directory_operation("group", "addmembers", false);
            ApiError::from_command_error(&name, e)
        })?;

    metrics::record_directory_operation("group", "addmembers", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(GroupResponse {
        success: true,
        message: format!("Added {} member(s) to group {}", request.members.len(), name),
        details: Some(output),
    }))
}

/// Remove members from a group
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{name}/members",
    request_body = MembersRequest,
    params(
        ("name" = String, Path, description = "Group name")
    ),
    responses(
        (status = 200, description = "Members removed", body = GroupResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Group not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "groups"
)]
pub async fn remove_group_members(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<MembersRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    info!("Removing members from group {}: {:?}", name, request.members);
    validation::validate_group_name(&name)?;
    validate_members(&request.members)?;

    let output = state
        .samba
        .run(&remove_members_args(&name, &request.members))
        .await
        .map_err(|e| {
            error!("group removemembers failed for {}: {}", name, e);
            metrics::record_directory_operation("group", "removemembers", false);
            ApiError::from_command_error(&name, e)
        })?;

    metrics::record_directory_operation("group", "removemembers", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(GroupResponse {
        success: true,
        message: format!(
            "Removed {} member(s) from group {}",
            request.members.len(),
            name
        ),
        details: Some(output),
    }))
}
