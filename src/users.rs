// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! User management API handlers
//!
//! This module implements HTTP handlers for all user-related operations:
//! - Listing and showing users
//! - Creating and deleting accounts
//! - Enabling/disabling accounts
//! - Moving accounts between organizational units
//! - Password and account-expiry changes
//!
//! Every operation issues exactly one `samba-tool user ...` command.

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

/// Stale window for cached user reads
const STALE_WINDOW: Duration = Duration::from_secs(120);

/// Cache key prefix invalidated by user mutations
const CACHE_PREFIX: &str = "user:";

/// userAccountControl bit marking a disabled account
const UF_ACCOUNTDISABLE: u32 = 0x0002;

/// Request to create a new user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Account name (sAMAccountName)
    pub username: String,

    /// Initial password
    pub password: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Organizational unit DN the account is created in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ou: Option<String>,

    /// Force a password change at first logon
    #[serde(default)]
    pub must_change_at_next_login: bool,
}

/// Request to move a user to another organizational unit
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveUserRequest {
    /// Target organizational unit DN
    pub target_ou: String,
}

/// Request to set a user's password
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    pub new_password: String,

    #[serde(default)]
    pub must_change_at_next_login: bool,
}

/// Request to set a user's account expiry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetExpiryRequest {
    /// Days from now until the account expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    /// Clear any expiry instead
    #[serde(default)]
    pub no_expiry: bool,
}

/// Response from user mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// List of user names
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<String>,
    pub count: usize,
}

/// Structured view of `samba-tool user show` output
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    /// Distinguished name
    pub dn: String,

    /// Account name (sAMAccountName)
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,

    /// Derived from the userAccountControl disable bit
    pub enabled: bool,

    /// Group DNs from memberOf
    pub groups: Vec<String>,

    /// Parent container of the account's DN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,

    /// RFC 3339; absent means the account never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_expires: Option<String>,

    /// RFC 3339; absent means the account never logged on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_logon: Option<String>,

    /// Full command output for fields the structured view does not carry
    pub raw_output: String,
}

// ========== Command Builders ==========

pub(crate) fn user_list_args() -> Vec<String> {
    vec!["user".to_string(), "list".to_string()]
}

pub(crate) fn user_show_args(username: &str) -> Vec<String> {
    vec!["user".to_string(), "show".to_string(), username.to_string()]
}

/// Build `samba-tool user create` arguments; optional flags appear only for
/// fields that are present and non-empty
pub(crate) fn create_user_args(request: &CreateUserRequest) -> Vec<String> {
    let mut args = vec![
        "user".to_string(),
        "create".to_string(),
        request.username.clone(),
        request.password.clone(),
    ];

    let mut push_opt = |flag: &str, value: &Option<String>| {
        if let Some(value) = value {
            if !value.is_empty() {
                args.push(format!("--{}={}", flag, value));
            }
        }
    };

    push_opt("given-name", &request.given_name);
    push_opt("surname", &request.surname);
    push_opt("initials", &request.initials);
    push_opt("mail-address", &request.mail_address);
    push_opt("telephone-number", &request.telephone_number);
    push_opt("job-title", &request.job_title);
    push_opt("department", &request.department);
    push_opt("company", &request.company);
    push_opt("description", &request.description);
    push_opt("userou", &request.user_ou);

    if request.must_change_at_next_login {
        args.push("--must-change-at-next-login".to_string());
    }

    args
}

pub(crate) fn delete_user_args(username: &str) -> Vec<String> {
    vec!["user".to_string(), "delete".to_string(), username.to_string()]
}

pub(crate) fn enable_user_args(username: &str) -> Vec<String> {
    vec!["user".to_string(), "enable".to_string(), username.to_string()]
}

pub(crate) fn disable_user_args(username: &str) -> Vec<String> {
    vec!["user".to_string(), "disable".to_string(), username.to_string()]
}

pub(crate) fn move_user_args(username: &str, target_ou: &str) -> Vec<String> {
    vec![
        "user".to_string(),
        "move".to_string(),
        username.to_string(),
        target_ou.to_string(),
    ]
}

pub(crate) fn set_password_args(username: &str, request: &SetPasswordRequest) -> Vec<String> {
    let mut args = vec![
        "user".to_string(),
        "setpassword".to_string(),
        username.to_string(),
        format!("--newpassword={}", request.new_password),
    ];
    if request.must_change_at_next_login {
        args.push("--must-change-at-next-login".to_string());
    }
    args
}

pub(crate) fn set_expiry_args(username: &str, request: &SetExpiryRequest) -> Vec<String> {
    let mut args = vec![
        "user".to_string(),
        "setexpiry".to_string(),
        username.to_string(),
    ];
    if request.no_expiry {
        args.push("--noexpiry".to_string());
    } else if let Some(days) = request.days {
        args.push(format!("--days={}", days));
    }
    args
}

// ========== Output Parsing ==========

/// Parse `samba-tool user show` output into a structured record
///
/// The dn and sAMAccountName attributes are required; everything else is
/// optional and missing values stay absent rather than being fabricated. The
/// full output is preserved in `raw_output`.
pub(crate) fn parse_user_show(output: &str) -> Result<UserDetail, String> {
    let pairs = parsers::kv_pairs(output);

    let dn = parsers::kv_first(&pairs, "dn")
        .ok_or_else(|| "missing dn attribute".to_string())?
        .to_string();
    let username = parsers::kv_first(&pairs, "sAMAccountName")
        .ok_or_else(|| "missing sAMAccountName attribute".to_string())?
        .to_string();

    let uac: u32 = parsers::kv_first(&pairs, "userAccountControl")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    // The parent container is everything after the leading CN RDN
    let organizational_unit = dn.split_once(',').map(|(_, rest)| rest.to_string());

    Ok(UserDetail {
        organizational_unit,
        username,
        display_name: parsers::kv_first(&pairs, "displayName").map(str::to_string),
        mail: parsers::kv_first(&pairs, "mail").map(str::to_string),
        enabled: uac & UF_ACCOUNTDISABLE == 0,
        groups: parsers::kv_all(&pairs, "memberOf")
            .into_iter()
            .map(str::to_string)
            .collect(),
        account_expires: parsers::kv_first(&pairs, "accountExpires")
            .and_then(parsers::filetime_to_utc)
            .map(|dt| dt.to_rfc3339()),
        last_logon: parsers::kv_first(&pairs, "lastLogon")
            .and_then(parsers::filetime_to_utc)
            .map(|dt| dt.to_rfc3339()),
        dn,
        raw_output: output.to_string(),
    })
}

// ========== Handlers ==========

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<UserListResponse>, ApiError> {
    info!("Listing users");

    let key = "user:list";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&user_list_args()).await
        })
        .await
        .map_err(|e| {
            error!("user list failed: {}", e);
            metrics::record_directory_operation("user", "list", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    let users = parsers::parse_name_list(&output);
    let count = users.len();
    metrics::record_directory_operation("user", "list", true);

    Ok(Json(UserListResponse { users, count }))
}

/// Show a single user
#[utoipa::path(
    get,
    path = "/api/v1/users/{name}",
    params(
        ("name" = String, Path, description = "Account name"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetail),
        (status = 404, description = "User not found"),
        (status = 500, description = "Output could not be parsed"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn show_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<UserDetail>, ApiError> {
    info!("Showing user: {}", username);
    validation::validate_username(&username)?;

    let key = format!("user:show:{}", username);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let name = username.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&user_show_args(&name)).await
        })
        .await
        .map_err(|e| {
            error!("user show failed for {}: {}", username, e);
            ApiError::from_command_error(&username, e)
        })?;

    let detail = parse_user_show(&output).map_err(ApiError::ParseError)?;
    Ok(Json(detail))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    info!("Creating user: {}", request.username);

    validation::validate_username(&request.username)?;
    if request.password.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Password cannot be empty".to_string(),
        ));
    }
    if let Some(ref ou) = request.user_ou {
        validation::validate_ou_dn(ou)?;
    }

    let output = state
        .samba
        .run(&create_user_args(&request))
        .await
        .map_err(|e| {
            error!("user create failed for {}: {}", request.username, e);
            metrics::record_directory_operation("user", "create", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    info!("User {} created successfully", request.username);
    metrics::record_directory_operation("user", "create", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: format!("User {} created successfully", request.username),
            details: Some(output),
        }),
    ))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{name}",
    params(
        ("name" = String, Path, description = "Account name to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Deleting user: {}", username);
    validation::validate_username(&username)?;

    let output = state
        .samba
        .run(&delete_user_args(&username))
        .await
        .map_err(|e| {
            error!("user delete failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "delete", false);
            ApiError::from_command_error(&username, e)
        })?;

    info!("User {} deleted successfully", username);
    metrics::record_directory_operation("user", "delete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(UserResponse {
        success: true,
        message: format!("User {} deleted successfully", username),
        details: Some(output),
    }))
}

/// Enable a user account
#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/enable",
    params(
        ("name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "User enabled", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn enable_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Enabling user: {}", username);
    validation::validate_username(&username)?;

    let output = state
        .samba
        .run(&enable_user_args(&username))
        .await
        .map_err(|e| {
            error!("user enable failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "enable", false);
            ApiError::from_command_error(&username, e)
        })?;

    metrics::record_directory_operation("user", "enable", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(UserResponse {
        success: true,
        message: format!("User {} enabled", username),
        details: Some(output),
    }))
}

/// Disable a user account
#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/disable",
    params(
        ("name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "User disabled", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn disable_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Disabling user: {}", username);
    validation::validate_username(&username)?;

    let output = state
        .samba
        .run(&disable_user_args(&username))
        .await
        .map_err(|e| {
            error!("user disable failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "disable", false);
            ApiError::from_command_error(&username, e)
        })?;

    metrics::record_directory_operation("user", "disable", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(UserResponse {
        success: true,
        message: format!("User {} disabled", username),
        details: Some(output),
    }))
}

/// Move a user to another organizational unit
#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/move",
    request_body = MoveUserRequest,
    params(
        ("name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "User moved", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn move_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<MoveUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Moving user {} to {}", username, request.target_ou);
    validation::validate_username(&username)?;
    validation::validate_ou_dn(&request.target_ou)?;

    let output = state
        .samba
        .run(&move_user_args(&username, &request.target_ou))
        .await
        .map_err(|e| {
            error!("user move failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "move", false);
            ApiError::from_command_error(&username, e)
        })?;

    metrics::record_directory_operation("user", "move", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(UserResponse {
        success: true,
        message: format!("User {} moved to {}", username, request.target_ou),
        details: Some(output),
    }))
}

/// Set a user's password
#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/password",
    request_body = SetPasswordRequest,
    params(
        ("name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "Password updated", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn set_user_password(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<SetPasswordRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Setting password for user: {}", username);
    validation::validate_username(&username)?;
    if request.new_password.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Password cannot be empty".to_string(),
        ));
    }

    state
        .samba
        .run(&set_password_args(&username, &request))
        .await
        .map_err(|e| {
            error!("user setpassword failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "setpassword", false);
            ApiError::from_command_error(&username, e)
        })?;

    metrics::record_directory_operation("user", "setpassword", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    // Command output can echo sensitive context, so it is not returned
    Ok(Json(UserResponse {
        success: true,
        message: format!("Password updated for user {}", username),
        details: None,
    }))
}

/// Set or clear a user's account expiry
#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/expiry",
    request_body = SetExpiryRequest,
    params(
        ("name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "Expiry updated", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "users"
)]
pub async fn set_user_expiry(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<SetExpiryRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Setting expiry for user: {}", username);
    validation::validate_username(&username)?;
    if !request.no_expiry && request.days.is_none() {
        return Err(ApiError::InvalidRequest(
            "Either days or noExpiry must be provided".to_string(),
        ));
    }

    let output = state
        .samba
        .run(&set_expiry_args(&username, &request))
        .await
        .map_err(|e| {
            error!("user setexpiry failed for {}: {}", username, e);
            metrics::record_directory_operation("user", "setexpiry", false);
            ApiError::from_command_error(&username, e)
        })?;

    metrics::record_directory_operation("user", "setexpiry", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(UserResponse {
        success: true,
        message: format!("Expiry updated for user {}", username),
        details: Some(output),
    }))
}
