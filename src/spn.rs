// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service principal name API handlers
//!
//! Lists, adds and deletes Kerberos SPNs on user accounts. The canonical SPN
//! value is the unparsed `service/host[:port]` string; the parsed fields are
//! for display only and the port stays empty when the SPN does not carry one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    metrics,
    types::{ApiError, AppState, RefreshParams},
    validation,
};

const STALE_WINDOW: Duration = Duration::from_secs(120);
const CACHE_PREFIX: &str = "spn:";

lazy_static! {
    /// service/host with optional :port
    static ref SPN_PARTS_RE: Regex =
        Regex::new(r"^([^/]+)/([^:/]+)(?::(\d+))?$").expect("spn parts regex");
}

/// One service principal name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Spn {
    /// Canonical unparsed value
    pub value: String,

    /// Service class (e.g., "HTTP", "HOST")
    pub service: String,

    pub hostname: String,

    /// Empty when the SPN has no port
    pub port: String,
}

/// Request to add or delete an SPN
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpnRequest {
    /// SPN in service/host[:port] form
    pub name: String,

    /// Owning account
    pub user: String,
}

/// SPNs registered on one account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpnListResponse {
    pub user: String,
    pub spns: Vec<Spn>,
    pub count: usize,
    pub raw_output: String,
}

/// Response from SPN mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpnResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ========== Command Builders ==========

pub(crate) fn spn_list_args(user: &str) -> Vec<String> {
    vec!["spn".to_string(), "list".to_string(), user.to_string()]
}

pub(crate) fn spn_add_args(name: &str, user: &str) -> Vec<String> {
    vec![
        "spn".to_string(),
        "add".to_string(),
        name.to_string(),
        user.to_string(),
    ]
}

pub(crate) fn spn_delete_args(name: &str, user: &str) -> Vec<String> {
    vec![
        "spn".to_string(),
        "delete".to_string(),
        name.to_string(),
        user.to_string(),
    ]
}

// ========== Output Parsing ==========

/// Split an SPN string into service, hostname and optional port
///
/// `HTTP/web01.domain.com:8080` -> service HTTP, host web01.domain.com,
/// port "8080"; `HOST/fileserver` -> port "".
pub(crate) fn parse_spn(value: &str) -> Option<Spn> {
    let captures = SPN_PARTS_RE.captures(value)?;
    Some(Spn {
        value: value.to_string(),
        service: captures[1].to_string(),
        hostname: captures[2].to_string(),
        port: captures
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    })
}

/// Parse `spn list` output
///
/// The listing echoes the account, then a marker line, then one indented SPN
/// per line:
///
/// ```text
/// alice
/// User CN=alice,... has the following servicePrincipalName:
///          HTTP/web01.samdom.example.com:8080
///          HOST/fileserver
/// ```
///
/// Accounts without SPNs print a "has no servicePrincipalName" marker and
/// yield an empty list. An SPN line that does not split into service/host is
/// kept with the raw value in all three display fields left empty.
pub(crate) fn parse_spn_list(output: &str) -> Vec<Spn> {
    let mut spns: Vec<Spn> = Vec::new();
    let mut in_listing = false;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains("has no servicePrincipalName") {
            break;
        }
        if trimmed.ends_with("servicePrincipalName:") {
            in_listing = true;
            continue;
        }
        if !in_listing {
            continue;
        }

        match parse_spn(trimmed) {
            Some(spn) => spns.push(spn),
            None => spns.push(Spn {
                value: trimmed.to_string(),
                service: String::new(),
                hostname: String::new(),
                port: String::new(),
            }),
        }
    }

    spns.sort_by(|a, b| a.value.cmp(&b.value));
    spns
}

// ========== Handlers ==========

/// List SPNs registered on an account
#[utoipa::path(
    get,
    path = "/api/v1/spns/{user}",
    params(
        ("user" = String, Path, description = "Account name"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "SPNs on the account", body = SpnListResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "spn"
)]
pub async fn list_spns(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<SpnListResponse>, ApiError> {
    info!("Listing SPNs for user: {}", user);
    validation::validate_username(&user)?;

    let key = format!("spn:list:{}", user);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let account = user.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&spn_list_args(&account)).await
        })
        .await
        .map_err(|e| {
            error!("spn list failed for {}: {}", user, e);
            ApiError::from_command_error(&user, e)
        })?;

    let spns = parse_spn_list(&output);
    let count = spns.len();

    Ok(Json(SpnListResponse {
        user,
        spns,
        count,
        raw_output: output,
    }))
}

/// Register an SPN on an account
#[utoipa::path(
    post,
    path = "/api/v1/spns",
    request_body = SpnRequest,
    responses(
        (status = 201, description = "SPN added", body = SpnResponse),
        (status = 400, description = "Invalid SPN or user"),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "spn"
)]
pub async fn add_spn(
    State(state): State<AppState>,
    Json(request): Json<SpnRequest>,
) -> Result<(StatusCode, Json<SpnResponse>), ApiError> {
    info!("Adding SPN {} to user {}", request.name, request.user);
    validation::validate_spn(&request.name)?;
    validation::validate_username(&request.user)?;

    let output = state
        .samba
        .run(&spn_add_args(&request.name, &request.user))
        .await
        .map_err(|e| {
            error!("spn add failed for {}: {}", request.name, e);
            metrics::record_directory_operation("spn", "add", false);
            ApiError::from_command_error(&request.user, e)
        })?;

    metrics::record_directory_operation("spn", "add", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(SpnResponse {
            success: true,
            message: format!("SPN {} added to {}", request.name, request.user),
            details: Some(output),
        }),
    ))
}

/// Remove an SPN from an account
#[utoipa::path(
    delete,
    path = "/api/v1/spns",
    request_body = SpnRequest,
    responses(
        (status = 200, description = "SPN deleted", body = SpnResponse),
        (status = 400, description = "Invalid SPN or user"),
        (status = 404, description = "User or SPN not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "spn"
)]
pub async fn delete_spn(
    State(state): State<AppState>,
    Json(request): Json<SpnRequest>,
) -> Result<Json<SpnResponse>, ApiError> {
    info!("Deleting SPN {} from user {}", request.name, request.user);
    validation::validate_spn(&request.name)?;
    validation::validate_username(&request.user)?;

    let output = state
        .samba
        .run(&spn_delete_args(&request.name, &request.user))
        .await
        .map_err(|e| {
            error!("spn delete failed for {}: {}", request.name, e);
            metrics::record_directory_operation("spn", "delete", false);
            ApiError::from_command_error(&request.user, e)
        })?;

    metrics::record_directory_operation("spn", "delete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(SpnResponse {
        success: true,
        message: format!("SPN {} deleted from {}", request.name, request.user),
        details: Some(output),
    }))
}
