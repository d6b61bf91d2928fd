// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Site and subnet API handlers
//!
//! Sites are addressed by name; subnets by CIDR. A subnet belongs to exactly
//! one site, so subnet creation names its site and reassignment goes through
//! set-site. Subnets travel in request bodies because CIDR notation contains
//! a slash.

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

const STALE_WINDOW: Duration = Duration::from_secs(300);
const CACHE_PREFIX: &str = "sites:";

/// Request to create a site
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    /// Site name
    pub name: String,
}

/// Request to create a subnet bound to a site
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetRequest {
    /// Subnet in CIDR notation (e.g., "192.168.1.0/24")
    pub subnet: String,
}

/// Request naming an existing subnet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRequest {
    pub subnet: String,
}

/// Request to reassign a subnet to another site
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetSubnetSiteRequest {
    pub subnet: String,

    /// Site the subnet moves to
    pub site: String,
}

/// Response from site and subnet mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// List of site names
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteListResponse {
    pub sites: Vec<String>,
    pub count: usize,
}

// ========== Command Builders ==========

pub(crate) fn site_list_args() -> Vec<String> {
    vec!["sites".to_string(), "list".to_string()]
}

pub(crate) fn create_site_args(name: &str) -> Vec<String> {
    vec!["sites".to_string(), "create".to_string(), name.to_string()]
}

pub(crate) fn remove_site_args(name: &str) -> Vec<String> {
    vec!["sites".to_string(), "remove".to_string(), name.to_string()]
}

pub(crate) fn create_subnet_args(subnet: &str, site: &str) -> Vec<String> {
    vec![
        "sites".to_string(),
        "subnet".to_string(),
        "create".to_string(),
        subnet.to_string(),
        site.to_string(),
    ]
}

pub(crate) fn remove_subnet_args(subnet: &str) -> Vec<String> {
    vec![
        "sites".to_string(),
        "subnet".to_string(),
        "remove".to_string(),
        subnet.to_string(),
    ]
}

pub(crate) fn set_subnet_site_args(subnet: &str, site: &str) -> Vec<String> {
    vec![
        "sites".to_string(),
        "subnet".to_string(),
        "set-site".to_string(),
        subnet.to_string(),
        site.to_string(),
    ]
}

// ========== Handlers ==========

/// List all sites
#[utoipa::path(
    get,
    path = "/api/v1/sites",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "List of sites", body = SiteListResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn list_sites(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<SiteListResponse>, ApiError> {
    info!("Listing sites");

    let key = "sites:list";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&site_list_args()).await
        })
        .await
        .map_err(|e| {
            error!("sites list failed: {}", e);
            metrics::record_directory_operation("sites", "list", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    let sites = parsers::parse_name_list(&output);
    let count = sites.len();
    metrics::record_directory_operation("sites", "list", true);

    Ok(Json(SiteListResponse { sites, count }))
}

/// Create a site
#[utoipa::path(
    post,
    path = "/api/v1/sites",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created successfully", body = SiteResponse),
        (status = 400, description = "Invalid site name"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn create_site(
    State(state): State<AppState>,
    Json(request): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<SiteResponse>), ApiError> {
    info!("Creating site: {}", request.name);
    validation::validate_site_name(&request.name)?;

    let output = state
        .samba
        .run(&create_site_args(&request.name))
        .await
        .map_err(|e| {
            error!("sites create failed for {}: {}", request.name, e);
            metrics::record_directory_operation("sites", "create", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    info!("Site {} created successfully", request.name);
    metrics::record_directory_operation("sites", "create", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(SiteResponse {
            success: true,
            message: format!("Site {} created successfully", request.name),
            details: Some(output),
        }),
    ))
}

/// Remove a site
#[utoipa::path(
    delete,
    path = "/api/v1/sites/{name}",
    params(
        ("name" = String, Path, description = "Site name to remove")
    ),
    responses(
        (status = 200, description = "Site removed successfully", body = SiteResponse),
        (status = 404, description = "Site not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn remove_site(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SiteResponse>, ApiError> {
    info!("Removing site: {}", name);
    validation::validate_site_name(&name)?;

    let output = state
        .samba
        .run(&remove_site_args(&name))
        .await
        .map_err(|e| {
            error!("sites remove failed for {}: {}", name, e);
            metrics::record_directory_operation("sites", "remove", false);
            ApiError::from_command_error(&name, e)
        })?;

    metrics::record_directory_operation("sites", "remove", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(SiteResponse {
        success: true,
        message: format!("Site {} removed successfully", name),
        details: Some(output),
    }))
}

/// Create a subnet bound to a site
#[utoipa::path(
    post,
    path = "/api/v1/sites/{name}/subnets",
    request_body = CreateSubnetRequest,
    params(
        ("name" = String, Path, description = "Site the subnet belongs to")
    ),
    responses(
        (status = 201, description = "Subnet created successfully", body = SiteResponse),
        (status = 400, description = "Invalid subnet"),
        (status = 404, description = "Site not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn create_subnet(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Json(request): Json<CreateSubnetRequest>,
) -> Result<(StatusCode, Json<SiteResponse>), ApiError> {
    info!("Creating subnet {} in site {}", request.subnet, site);
    validation::validate_site_name(&site)?;
    validation::validate_subnet(&request.subnet)?;

    let output = state
        .samba
        .run(&create_subnet_args(&request.subnet, &site))
        .await
        .map_err(|e| {
            error!("subnet create failed for {}: {}", request.subnet, e);
            metrics::record_directory_operation("sites", "subnet-create", false);
            ApiError::from_command_error(&site, e)
        })?;

    metrics::record_directory_operation("sites", "subnet-create", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(SiteResponse {
            success: true,
            message: format!("Subnet {} created in site {}", request.subnet, site),
            details: Some(output),
        }),
    ))
}

/// Remove a subnet
#[utoipa::path(
    delete,
    path = "/api/v1/subnets",
    request_body = SubnetRequest,
    responses(
        (status = 200, description = "Subnet removed successfully", body = SiteResponse),
        (status = 400, description = "Invalid subnet"),
        (status = 404, description = "Subnet not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn remove_subnet(
    State(state): State<AppState>,
    Json(request): Json<SubnetRequest>,
) -> Result<Json<SiteResponse>, ApiError> {
    info!("Removing subnet: {}", request.subnet);
    validation::validate_subnet(&request.subnet)?;

    let output = state
        .samba
        .run(&remove_subnet_args(&request.subnet))
        .await
        .map_err(|e| {
            error!("subnet remove failed for {}: {}", request.subnet, e);
            metrics::record_directory_operation("sites", "subnet-remove", false);
            ApiError::from_command_error(&request.subnet, e)
        })?;

    metrics::record_directory_operation("sites", "subnet-remove", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(SiteResponse {
        success: true,
        message: format!("Subnet {} removed successfully", request.subnet),
        details: Some(output),
    }))
}

/// Reassign a subnet to another site
#[utoipa::path(
    post,
    path = "/api/v1/subnets/set-site",
    request_body = SetSubnetSiteRequest,
    responses(
        (status = 200, description = "Subnet reassigned", body = SiteResponse),
        (status = 400, description = "Invalid subnet or site"),
        (status = 404, description = "Subnet or site not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "sites"
)]
pub async fn set_subnet_site(
    State(state): State<AppState>,
    Json(request): Json<SetSubnetSiteRequest>,
) -> Result<Json<SiteResponse>, ApiError> {
    info!("Moving subnet {} to site {}", request.subnet, request.site);
    validation::validate_subnet(&request.subnet)?;
    validation::validate_site_name(&request.site)?;

    let output = state
        .samba
        .run(&set_subnet_site_args(&request.subnet, &request.site))
        .await
        .map_err(|e| {
            error!("subnet set-site failed for {}: {}", request.subnet, e);
            metrics::record_directory_operation("sites", "subnet-set-site", false);
            ApiError::from_command_error(&request.subnet, e)
        })?;

    metrics::record_directory_operation("sites", "subnet-set-site", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(SiteResponse {
        success: true,
        message: format!("Subnet {} moved to site {}", request.subnet, request.site),
        details: Some(output),
    }))
}
