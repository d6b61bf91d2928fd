// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Forest settings API handlers
//!
//! Exposes the dSHeuristics attribute of the forest directory service, which
//! controls forest-wide behaviors such as anonymous access. The value is an
//! opaque digit string interpreted positionally by AD.

use axum::{
    extract::{Query, State},
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
};

const STALE_WINDOW: Duration = Duration::from_secs(600);
const CACHE_PREFIX: &str = "forest:";

lazy_static! {
    /// dSHeuristics is a positional digit string
    static ref DSHEURISTICS_RE: Regex = Regex::new(r"^[0-9]{1,32}$").expect("dsheuristics regex");
}

/// Request to set dSHeuristics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetDsHeuristicsRequest {
    /// New positional digit string (e.g., "0000002")
    pub value: String,
}

/// Current dSHeuristics value
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DsHeuristicsResponse {
    /// Absent when the attribute is not set on the forest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    pub raw_output: String,
}

/// Response from forest mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForestResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ========== Command Builders ==========

pub(crate) fn dsheuristics_show_args() -> Vec<String> {
    vec![
        "forest".to_string(),
        "directory_service".to_string(),
        "dsheuristics".to_string(),
        "show".to_string(),
    ]
}

pub(crate) fn dsheuristics_set_args(value: &str) -> Vec<String> {
    vec![
        "forest".to_string(),
        "directory_service".to_string(),
        "dsheuristics".to_string(),
        value.to_string(),
    ]
}

// ========== Output Parsing ==========

/// Extract the dSHeuristics value from show output
///
/// Set forests print `dsheuristics: <digits>`; unset forests print a
/// "not set" notice, which maps to None.
pub(crate) fn parse_dsheuristics(output: &str) -> Option<String> {
    for line in output.lines() {
        let line = line.trim();
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("dsheuristics") {
                let value = value.trim().trim_matches('"');
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

// ========== Handlers ==========

/// Show the forest dSHeuristics value
#[utoipa::path(
    get,
    path = "/api/v1/forest/dsheuristics",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Current dSHeuristics", body = DsHeuristicsResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "forest"
)]
pub async fn show_dsheuristics(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<DsHeuristicsResponse>, ApiError> {
    info!("Showing forest dSHeuristics");

    let key = "forest:dsheuristics";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&dsheuristics_show_args()).await
        })
        .await
        .map_err(|e| {
            error!("dsheuristics show failed: {}", e);
            ApiError::CommandFailed(e.to_string())
        })?;

    Ok(Json(DsHeuristicsResponse {
        value: parse_dsheuristics(&output),
        raw_output: output,
    }))
}

/// Set the forest dSHeuristics value
#[utoipa::path(
    post,
    path = "/api/v1/forest/dsheuristics",
    request_body = SetDsHeuristicsRequest,
    responses(
        (status = 200, description = "dSHeuristics updated", body = ForestResponse),
        (status = 400, description = "Invalid value"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "forest"
)]
pub async fn set_dsheuristics(
    State(state): State<AppState>,
    Json(request): Json<SetDsHeuristicsRequest>,
) -> Result<Json<ForestResponse>, ApiError> {
    info!("Setting forest dSHeuristics to {}", request.value);

    if !DSHEURISTICS_RE.is_match(&request.value) {
        return Err(ApiError::InvalidRequest(format!(
            "Invalid dSHeuristics value: {}",
            request.value
        )));
    }

    let output = state
        .samba
        .run(&dsheuristics_set_args(&request.value))
        .await
        .map_err(|e| {
            error!("dsheuristics set failed: {}", e);
            metrics::record_directory_operation("forest", "dsheuristics-set", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    metrics::record_directory_operation("forest", "dsheuristics-set", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(ForestResponse {
        success: true,
        message: format!("dSHeuristics set to {}", request.value),
        details: Some(output),
    }))
}
