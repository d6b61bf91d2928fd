// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain-level API handlers
//!
//! Function levels, domain information, password policy and server time.
//! Password settings show/set mirrors `samba-tool domain passwordsettings`;
//! the show parser is lenient because the output is informational. Only the
//! raw text is guaranteed; structured fields appear when recognized.

use axum::{
    extract::{Path, Query, State},
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
};

const STALE_WINDOW: Duration = Duration::from_secs(600);
const CACHE_PREFIX: &str = "domain:";

/// Function levels accepted by `domain level raise`
const VALID_LEVELS: &[&str] = &["2003", "2008", "2008_R2", "2012", "2012_R2", "2016"];

/// Request to raise domain and/or forest function levels
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaiseLevelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_level: Option<String>,
}

/// Request to change password policy; absent fields are left untouched
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordSettingsRequest {
    /// "on", "off" or "default"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pwd_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pwd_age: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pwd_age: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_lockout_duration: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_lockout_threshold: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_account_lockout_after: Option<u32>,
}

/// Current function levels
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainLevelResponse {
    pub forest_level: String,
    pub domain_level: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_dc_level: Option<String>,

    pub raw_output: String,
}

/// Structured view of `domain info` output
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfoResponse {
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub netbios_domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dc_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dc_netbios_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_site: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_site: Option<String>,

    pub raw_output: String,
}

/// Password policy; structured fields appear when recognized in the output
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSettingsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_plaintext: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pwd_length: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pwd_age_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pwd_age_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockout_duration_mins: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockout_threshold: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_lockout_after_mins: Option<u32>,

    pub raw_output: String,
}

/// Server time
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeResponse {
    pub server: String,
    pub time: String,
}

/// Response from domain mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DomainResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ========== Command Builders ==========

pub(crate) fn level_show_args() -> Vec<String> {
    vec!["domain".to_string(), "level".to_string(), "show".to_string()]
}

pub(crate) fn level_raise_args(request: &RaiseLevelRequest) -> Vec<String> {
    let mut args = vec![
        "domain".to_string(),
        "level".to_string(),
        "raise".to_string(),
    ];
    if let Some(ref level) = request.forest_level {
        args.push(format!("--forest-level={}", level));
    }
    if let Some(ref level) = request.domain_level {
        args.push(format!("--domain-level={}", level));
    }
    args
}

pub(crate) fn domain_info_args(address: &str) -> Vec<String> {
    vec!["domain".to_string(), "info".to_string(), address.to_string()]
}

pub(crate) fn passwordsettings_show_args() -> Vec<String> {
    vec![
        "domain".to_string(),
        "passwordsettings".to_string(),
        "show".to_string(),
    ]
}

pub(crate) fn passwordsettings_set_args(request: &SetPasswordSettingsRequest) -> Vec<String> {
    let mut args = vec![
        "domain".to_string(),
        "passwordsettings".to_string(),
        "set".to_string(),
    ];

    if let Some(ref complexity) = request.complexity {
        args.push(format!("--complexity={}", complexity));
    }
    if let Some(value) = request.history_length {
        args.push(format!("--history-length={}", value));
    }
    if let Some(value) = request.min_pwd_length {
        args.push(format!("--min-pwd-length={}", value));
    }
    if let Some(value) = request.min_pwd_age {
        args.push(format!("--min-pwd-age={}", value));
    }
    if let Some(value) = request.max_pwd_age {
        args.push(format!("--max-pwd-age={}", value));
    }
    if let Some(value) = request.account_lockout_duration {
        args.push(format!("--account-lockout-duration={}", value));
    }
    if let Some(value) = request.account_lockout_threshold {
        args.push(format!("--account-lockout-threshold={}", value));
    }
    if let Some(value) = request.reset_account_lockout_after {
        args.push(format!("--reset-account-lockout-after={}", value));
    }

    args
}

pub(crate) fn time_args(server: &str) -> Vec<String> {
    vec!["time".to_string(), server.to_string()]
}

// ========== Output Parsing ==========

/// Parse `domain level show`; forest and domain levels are required
pub(crate) fn parse_level_show(output: &str) -> Result<DomainLevelResponse, String> {
    let pairs = parsers::kv_pairs(output);

    let forest_level = parsers::kv_first(&pairs, "Forest function level")
        .ok_or_else(|| "missing forest function level".to_string())?
        .to_string();
    let domain_level = parsers::kv_first(&pairs, "Domain function level")
        .ok_or_else(|| "missing domain function level".to_string())?
        .to_string();

    Ok(DomainLevelResponse {
        forest_level,
        domain_level,
        lowest_dc_level: parsers::kv_first(&pairs, "Lowest function level of a DC")
            .map(str::to_string),
        raw_output: output.to_string(),
    })
}

/// Parse `domain info`; the domain name is required
pub(crate) fn parse_domain_info(output: &str) -> Result<DomainInfoResponse, String> {
    let pairs = parsers::kv_pairs(output);

    let domain = parsers::kv_first(&pairs, "Domain")
        .ok_or_else(|| "missing Domain field".to_string())?
        .to_string();

    Ok(DomainInfoResponse {
        domain,
        forest: parsers::kv_first(&pairs, "Forest").map(str::to_string),
        netbios_domain: parsers::kv_first(&pairs, "Netbios domain").map(str::to_string),
        dc_name: parsers::kv_first(&pairs, "DC name").map(str::to_string),
        dc_netbios_name: parsers::kv_first(&pairs, "DC netbios name").map(str::to_string),
        server_site: parsers::kv_first(&pairs, "Server site").map(str::to_string),
        client_site: parsers::kv_first(&pairs, "Client site").map(str::to_string),
        raw_output: output.to_string(),
    })
}

/// Parse `domain passwordsettings show`; every field is best-effort
pub(crate) fn parse_password_settings(output: &str) -> PasswordSettingsResponse {
    let pairs = parsers::kv_pairs(output);

    let flag = |key: &str| parsers::kv_first(&pairs, key).map(|v| v == "on");
    let number = |key: &str| {
        parsers::kv_first(&pairs, key).and_then(|v| v.trim().parse::<u32>().ok())
    };

    PasswordSettingsResponse {
        complexity: flag("Password complexity"),
        store_plaintext: flag("Store plaintext passwords"),
        history_length: number("Password history length"),
        min_pwd_length: number("Minimum password length"),
        min_pwd_age_days: number("Minimum password age (days)"),
        max_pwd_age_days: number("Maximum password age (days)"),
        lockout_duration_mins: number("Account lockout duration (mins)"),
        lockout_threshold: number("Account lockout threshold (attempts)"),
        reset_lockout_after_mins: number("Reset account lockout after (mins)"),
        raw_output: output.to_string(),
    }
}

fn validate_level(level: &str) -> Result<(), ApiError> {
    if VALID_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid function level: {}. Supported levels: {:?}",
            level, VALID_LEVELS
        )))
    }
}

// ========== Handlers ==========

/// Show domain and forest function levels
#[utoipa::path(
    get,
    path = "/api/v1/domain/level",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Current function levels", body = DomainLevelResponse),
        (status = 500, description = "Output could not be parsed"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn show_level(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<DomainLevelResponse>, ApiError> {
    info!("Showing domain function levels");

    let key = "domain:level";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&level_show_args()).await
        })
        .await
        .map_err(|e| {
            error!("domain level show failed: {}", e);
            ApiError::CommandFailed(e.to_string())
        })?;

    let levels = parse_level_show(&output).map_err(ApiError::ParseError)?;
    Ok(Json(levels))
}

/// Raise domain and/or forest function levels
#[utoipa::path(
    post,
    path = "/api/v1/domain/level/raise",
    request_body = RaiseLevelRequest,
    responses(
        (status = 200, description = "Levels raised", body = DomainResponse),
        (status = 400, description = "Invalid level"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn raise_level(
    State(state): State<AppState>,
    Json(request): Json<RaiseLevelRequest>,
) -> Result<Json<DomainResponse>, ApiError> {
    info!(
        "Raising function levels: forest={:?} domain={:?}",
        request.forest_level, request.domain_level
    );

    if request.forest_level.is_none() && request.domain_level.is_none() {
        return Err(ApiError::InvalidRequest(
            "Either forestLevel or domainLevel must be provided".to_string(),
        ));
    }
    if let Some(ref level) = request.forest_level {
        validate_level(level)?;
    }
    if let Some(ref level) = request.domain_level {
        validate_level(level)?;
    }

    let output = state
        .samba
        .run(&level_raise_args(&request))
        .await
        .map_err(|e| {
            error!("domain level raise failed: {}", e);
            metrics::record_directory_operation("domain", "level-raise", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    metrics::record_directory_operation("domain", "level-raise", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(DomainResponse {
        success: true,
        message: "Function level raised".to_string(),
        details: Some(output),
    }))
}

/// Get basic information about a domain controller
#[utoipa::path(
    get,
    path = "/api/v1/domain/info/{address}",
    params(
        ("address" = String, Path, description = "DC hostname or IP"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Domain information", body = DomainInfoResponse),
        (status = 500, description = "Output could not be parsed"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn domain_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<DomainInfoResponse>, ApiError> {
    info!("Getting domain info for {}", address);

    let key = format!("domain:info:{}", address);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let target = address.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&domain_info_args(&target)).await
        })
        .await
        .map_err(|e| {
            error!("domain info failed for {}: {}", address, e);
            ApiError::CommandFailed(e.to_string())
        })?;

    let domain_info = parse_domain_info(&output).map_err(ApiError::ParseError)?;
    Ok(Json(domain_info))
}

/// Show the domain password policy
#[utoipa::path(
    get,
    path = "/api/v1/domain/passwordsettings",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Current password policy", body = PasswordSettingsResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn show_password_settings(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<PasswordSettingsResponse>, ApiError> {
    info!("Showing password settings");

    let key = "domain:passwordsettings";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&passwordsettings_show_args()).await
        })
        .await
        .map_err(|e| {
            error!("passwordsettings show failed: {}", e);
            ApiError::CommandFailed(e.to_string())
        })?;

    Ok(Json(parse_password_settings(&output)))
}

/// Change the domain password policy
#[utoipa::path(
    post,
    path = "/api/v1/domain/passwordsettings",
    request_body = SetPasswordSettingsRequest,
    responses(
        (status = 200, description = "Password policy updated", body = DomainResponse),
        (status = 400, description = "Invalid settings"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn set_password_settings(
    State(state): State<AppState>,
    Json(request): Json<SetPasswordSettingsRequest>,
) -> Result<Json<DomainResponse>, ApiError> {
    info!("Updating password settings");

    if let Some(ref complexity) = request.complexity {
        if !["on", "off", "default"].contains(&complexity.as_str()) {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid complexity value: {}. Must be 'on', 'off' or 'default'",
                complexity
            )));
        }
    }

    let args = passwordsettings_set_args(&request);
    if args.len() == 3 {
        return Err(ApiError::InvalidRequest(
            "At least one setting must be provided".to_string(),
        ));
    }

    let output = state.samba.run(&args).await.map_err(|e| {
        error!("passwordsettings set failed: {}", e);
        metrics::record_directory_operation("domain", "passwordsettings-set", false);
        ApiError::CommandFailed(e.to_string())
    })?;

    metrics::record_directory_operation("domain", "passwordsettings-set", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(DomainResponse {
        success: true,
        message: "Password policy updated".to_string(),
        details: Some(output),
    }))
}

/// Get a server's current time
#[utoipa::path(
    get,
    path = "/api/v1/domain/time/{server}",
    params(
        ("server" = String, Path, description = "Server hostname or IP")
    ),
    responses(
        (status = 200, description = "Server time", body = TimeResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "domain"
)]
pub async fn server_time(
    State(state): State<AppState>,
    Path(server): Path<String>,
) -> Result<Json<TimeResponse>, ApiError> {
    info!("Getting time from {}", server);

    // Time is never cached; a stale clock reading is useless
    let output = state.samba.run(&time_args(&server)).await.map_err(|e| {
        error!("time query failed for {}: {}", server, e);
        ApiError::CommandFailed(e.to_string())
    })?;

    Ok(Json(TimeResponse {
        server,
        time: output.trim().to_string(),
    }))
}
