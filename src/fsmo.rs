// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! FSMO role API handlers
//!
//! Shows the current role holders and performs transfer/seize. Transfer asks
//! the current holder to hand the role over; seize takes it without
//! cooperation and is for holders that are permanently gone. Both are
//! independent one-shot mutations with no client-side state machine.

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
    types::{ApiError, AppState, RefreshParams},
};

const STALE_WINDOW: Duration = Duration::from_secs(600);
const CACHE_PREFIX: &str = "fsmo:";

/// Roles accepted by transfer and seize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FsmoRole {
    Rid,
    Pdc,
    Infrastructure,
    Schema,
    Naming,
    DomainDns,
    ForestDns,
}

impl FsmoRole {
    /// Value for samba-tool's `--role=` flag
    pub fn as_flag(&self) -> &'static str {
        match self {
            FsmoRole::Rid => "rid",
            FsmoRole::Pdc => "pdc",
            FsmoRole::Infrastructure => "infrastructure",
            FsmoRole::Schema => "schema",
            FsmoRole::Naming => "naming",
            FsmoRole::DomainDns => "domaindns",
            FsmoRole::ForestDns => "forestdns",
        }
    }
}

/// Request to transfer or seize a role
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub role: FsmoRole,

    /// Seize even if the role cannot be cleanly removed from the old holder
    #[serde(default)]
    pub force: bool,
}

/// One role holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleOwner {
    /// Full NTDS settings DN of the holder
    pub owner_dn: String,

    /// Server name extracted from the DN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// Current FSMO role holders
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FsmoRolesResponse {
    pub schema_master: RoleOwner,
    pub domain_naming_master: RoleOwner,
    pub pdc_emulator: RoleOwner,
    pub rid_master: RoleOwner,
    pub infrastructure_master: RoleOwner,

    /// DNS partition roles; absent on domains without the DNS partitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_dns_zones_master: Option<RoleOwner>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest_dns_zones_master: Option<RoleOwner>,

    pub raw_output: String,
}

/// Response from role mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FsmoResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ========== Command Builders ==========

pub(crate) fn fsmo_show_args() -> Vec<String> {
    vec!["fsmo".to_string(), "show".to_string()]
}

pub(crate) fn transfer_role_args(role: FsmoRole) -> Vec<String> {
    vec![
        "fsmo".to_string(),
        "transfer".to_string(),
        format!("--role={}", role.as_flag()),
    ]
}

pub(crate) fn seize_role_args(role: FsmoRole, force: bool) -> Vec<String> {
    let mut args = vec![
        "fsmo".to_string(),
        "seize".to_string(),
        format!("--role={}", role.as_flag()),
    ];
    if force {
        args.push("--force".to_string());
    }
    args
}

// ========== Output Parsing ==========

/// Extract the server name from an NTDS settings DN:
/// CN=NTDS Settings,CN=DC1,CN=Servers,... -> DC1
fn server_from_owner_dn(dn: &str) -> Option<String> {
    dn.split(',')
        .nth(1)
        .and_then(|rdn| rdn.trim().strip_prefix("CN="))
        .map(str::to_string)
}

/// Parse `fsmo show` output
///
/// Each line has the form `<Role> owner: <dn>`. The five directory roles are
/// required; the two DNS partition roles are optional because domains without
/// the DNS application partitions do not print them.
pub(crate) fn parse_fsmo_show(output: &str) -> Result<FsmoRolesResponse, String> {
    let mut owners: Vec<(String, RoleOwner)> = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((role, dn)) = line.split_once(" owner:") {
            let dn = dn.trim().to_string();
            owners.push((
                role.trim().to_string(),
                RoleOwner {
                    server: server_from_owner_dn(&dn),
                    owner_dn: dn,
                },
            ));
        }
    }

    let take = |name: &str| -> Option<RoleOwner> {
        owners
            .iter()
            .find(|(role, _)| role == name)
            .map(|(_, owner)| owner.clone())
    };

    let required = |name: &str| -> Result<RoleOwner, String> {
        take(name).ok_or_else(|| format!("missing {} in fsmo output", name))
    };

    Ok(FsmoRolesResponse {
        schema_master: required("SchemaMasterRole")?,
        domain_naming_master: required("DomainNamingMasterRole")?,
        pdc_emulator: required("PdcEmulationMasterRole")?,
        rid_master: required("RidAllocationMasterRole")?,
        infrastructure_master: required("InfrastructureMasterRole")?,
        domain_dns_zones_master: take("DomainDnsZonesMasterRole"),
        forest_dns_zones_master: take("ForestDnsZonesMasterRole"),
        raw_output: output.to_string(),
    })
}

// ========== Handlers ==========

/// Show current FSMO role holders
#[utoipa::path(
    get,
    path = "/api/v1/fsmo",
    params(
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Current role holders", body = FsmoRolesResponse),
        (status = 500, description = "Output could not be parsed"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "fsmo"
)]
pub async fn show_roles(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<FsmoRolesResponse>, ApiError> {
    info!("Showing FSMO roles");

    let key = "fsmo:show";
    if params.refresh {
        state.cache.remove(key);
    }

    let samba = Arc::clone(&state.samba);
    let output = state
        .cache
        .get_or_fetch(key, STALE_WINDOW, move || async move {
            samba.run(&fsmo_show_args()).await
        })
        .await
        .map_err(|e| {
            error!("fsmo show failed: {}", e);
            ApiError::CommandFailed(e.to_string())
        })?;

    let roles = parse_fsmo_show(&output).map_err(ApiError::ParseError)?;
    Ok(Json(roles))
}

/// Transfer a role to this DC
#[utoipa::path(
    post,
    path = "/api/v1/fsmo/transfer",
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role transferred", body = FsmoResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "fsmo"
)]
pub async fn transfer_role(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<FsmoResponse>, ApiError> {
    info!("Transferring FSMO role: {}", request.role.as_flag());

    let output = state
        .samba
        .run(&transfer_role_args(request.role))
        .await
        .map_err(|e| {
            error!("fsmo transfer failed for {}: {}", request.role.as_flag(), e);
            metrics::record_directory_operation("fsmo", "transfer", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    metrics::record_directory_operation("fsmo", "transfer", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(FsmoResponse {
        success: true,
        message: format!("Role {} transferred", request.role.as_flag()),
        details: Some(output),
    }))
}

/// Seize a role without the current holder's cooperation
#[utoipa::path(
    post,
    path = "/api/v1/fsmo/seize",
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role seized", body = FsmoResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "fsmo"
)]
pub async fn seize_role(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<FsmoResponse>, ApiError> {
    warn!("Seizing FSMO role: {}", request.role.as_flag());

    let output = state
        .samba
        .run(&seize_role_args(request.role, request.force))
        .await
        .map_err(|e| {
            error!("fsmo seize failed for {}: {}", request.role.as_flag(), e);
            metrics::record_directory_operation("fsmo", "seize", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    metrics::record_directory_operation("fsmo", "seize", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(FsmoResponse {
        success: true,
        message: format!("Role {} seized", request.role.as_flag()),
        details: Some(output),
    }))
}
