// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS management API handlers
//!
//! This module implements HTTP handlers for DNS operations against the AD
//! DNS server:
//! - Server information
//! - Zone listing, creation and deletion
//! - Record add/delete/query
//!
//! Record deletion requires the exact name, type and data of the record,
//! mirroring `samba-tool dns delete` matching semantics. Zone deletion is
//! destructive and therefore gated behind a literal "DELETE" confirmation.

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
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    metrics, parsers,
    types::{ApiError, AppState, RefreshParams},
    validation::{self, DnsRecordType},
};

const STALE_WINDOW: Duration = Duration::from_secs(300);
const CACHE_PREFIX: &str = "dns:";

/// Literal confirmation required to delete a zone
const DELETE_CONFIRMATION: &str = "DELETE";

lazy_static! {
    /// Owner-name lines in `dns query` output: Name=www, Records=1, Children=0
    static ref NAME_LINE_RE: Regex =
        Regex::new(r"^Name=(.*?), Records=\d+, Children=\d+$").expect("dns name line regex");

    /// Record lines in `dns query` output:
    /// A: 192.168.1.5 (flags=f0, serial=110, ttl=900)
    static ref RECORD_LINE_RE: Regex =
        Regex::new(r"^([A-Z]+): (.*) \(flags=([0-9A-Fa-fx]+), serial=(\d+), ttl=(\d+)\)$")
            .expect("dns record line regex");
}

/// Request to create a zone
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    /// Zone name (e.g., "samdom.example.com" or "1.168.192.in-addr.arpa")
    pub zone: String,
}

/// Confirmation body for zone deletion
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteZoneRequest {
    /// Must be exactly "DELETE"
    pub confirm: String,
}

/// Request to add a DNS record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRecordRequest {
    /// Record name ("@" for the zone apex)
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,

    /// Record data; shape depends on the type
    pub data: String,
}

/// Request to delete a DNS record; all fields must match the stored record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordRequest {
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: DnsRecordType,

    pub data: String,
}

/// Query parameters for record lookup
#[derive(Debug, Default, Deserialize)]
pub struct RecordQueryParams {
    /// Record name to query; defaults to the zone apex
    pub name: Option<String>,

    /// Record type to query; defaults to ALL
    #[serde(rename = "type")]
    pub record_type: Option<String>,

    #[serde(default)]
    pub refresh: bool,
}

/// Response from DNS mutations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DnsResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One zone from `dns zonelist` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DnsZone {
    pub name: String,

    /// Flag tokens (e.g., DNS_RPC_ZONE_DSINTEGRATED)
    pub flags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Directory partition the zone is stored in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// Zone listing with the raw command output preserved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneListResponse {
    pub zones: Vec<DnsZone>,
    pub count: usize,
    pub raw_output: String,
}

/// Structured view of `dns serverinfo` output
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DnsServerInfo {
    pub server_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_method: Option<String>,

    pub admin_configured: bool,
    pub allow_update: bool,
    pub ds_available: bool,

    pub raw_output: String,
}

/// One record from `dns query` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordEntry {
    /// Owner name; "@" for the zone apex
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: String,

    pub data: String,

    pub flags: String,
    pub serial: u32,
    pub ttl: u32,
}

/// Record query result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordQueryResponse {
    pub zone: String,
    pub records: Vec<DnsRecordEntry>,
    pub count: usize,
    pub raw_output: String,
}

// ========== Command Builders ==========

pub(crate) fn serverinfo_args(server: &str) -> Vec<String> {
    vec!["dns".to_string(), "serverinfo".to_string(), server.to_string()]
}

pub(crate) fn zonelist_args(server: &str) -> Vec<String> {
    vec!["dns".to_string(), "zonelist".to_string(), server.to_string()]
}

pub(crate) fn zonecreate_args(server: &str, zone: &str) -> Vec<String> {
    vec![
        "dns".to_string(),
        "zonecreate".to_string(),
        server.to_string(),
        zone.to_string(),
    ]
}

pub(crate) fn zonedelete_args(server: &str, zone: &str) -> Vec<String> {
    vec![
        "dns".to_string(),
        "zonedelete".to_string(),
        server.to_string(),
        zone.to_string(),
    ]
}

pub(crate) fn add_record_args(
    server: &str,
    zone: &str,
    name: &str,
    record_type: DnsRecordType,
    data: &str,
) -> Vec<String> {
    vec![
        "dns".to_string(),
        "add".to_string(),
        server.to_string(),
        zone.to_string(),
        name.to_string(),
        record_type.as_str().to_string(),
        data.to_string(),
    ]
}

pub(crate) fn delete_record_args(
    server: &str,
    zone: &str,
    name: &str,
    record_type: DnsRecordType,
    data: &str,
) -> Vec<String> {
    vec![
        "dns".to_string(),
        "delete".to_string(),
        server.to_string(),
        zone.to_string(),
        name.to_string(),
        record_type.as_str().to_string(),
        data.to_string(),
    ]
}

pub(crate) fn query_args(server: &str, zone: &str, name: &str, record_type: &str) -> Vec<String> {
    vec![
        "dns".to_string(),
        "query".to_string(),
        server.to_string(),
        zone.to_string(),
        name.to_string(),
        record_type.to_string(),
    ]
}

// ========== Output Parsing ==========

/// Parse `dns zonelist` output into zones
///
/// The output is a sequence of indented `Key : Value` blocks, one per zone,
/// each starting with pszZoneName. Header lines ("2 zone(s) found") carry no
/// colon and are skipped by the pair extraction.
pub(crate) fn parse_zone_list(output: &str) -> Vec<DnsZone> {
    let mut zones: Vec<DnsZone> = Vec::new();

    for (key, value) in parsers::kv_pairs(output) {
        match key.as_str() {
            "pszZoneName" => zones.push(DnsZone {
                name: value,
                flags: Vec::new(),
                zone_type: None,
                version: None,
                partition: None,
            }),
            "Flags" => {
                if let Some(zone) = zones.last_mut() {
                    zone.flags = value.split_whitespace().map(str::to_string).collect();
                }
            }
            "ZoneType" => {
                if let Some(zone) = zones.last_mut() {
                    zone.zone_type = Some(value);
                }
            }
            "Version" => {
                if let Some(zone) = zones.last_mut() {
                    zone.version = Some(value);
                }
            }
            "pszDpFqdn" => {
                if let Some(zone) = zones.last_mut() {
                    zone.partition = Some(value);
                }
            }
            _ => {}
        }
    }

    zones
}

/// Parse `dns serverinfo` output; pszServerName is required
pub(crate) fn parse_server_info(output: &str) -> Result<DnsServerInfo, String> {
    let pairs = parsers::kv_pairs(output);

    let server_name = parsers::kv_first(&pairs, "pszServerName")
        .ok_or_else(|| "missing pszServerName field".to_string())?
        .to_string();

    let truthy = |key: &str| parsers::kv_first(&pairs, key) == Some("TRUE");

    Ok(DnsServerInfo {
        server_name,
        version: parsers::kv_first(&pairs, "dwVersion").map(str::to_string),
        boot_method: parsers::kv_first(&pairs, "fBootMethod").map(str::to_string),
        admin_configured: truthy("fAdminConfigured"),
        allow_update: truthy("fAllowUpdate"),
        ds_available: truthy("fDsAvailable"),
        raw_output: output.to_string(),
    })
}

/// Parse `dns query` output into record entries
///
/// Owner names arrive on `Name=...` lines and apply to the record lines that
/// follow. Lines matching neither pattern are left for the raw output.
pub(crate) fn parse_query_output(output: &str) -> Vec<DnsRecordEntry> {
    let mut records = Vec::new();
    let mut current_name = "@".to_string();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = NAME_LINE_RE.captures(line) {
            let name = captures.get(1).map_or("", |m| m.as_str());
            current_name = if name.is_empty() {
                "@".to_string()
            } else {
                name.to_string()
            };
            continue;
        }

        if let Some(captures) = RECORD_LINE_RE.captures(line) {
            // serial/ttl came from \d+ so the parses cannot fail
            records.push(DnsRecordEntry {
                name: current_name.clone(),
                record_type: captures[1].to_string(),
                data: captures[2].to_string(),
                flags: captures[3].to_string(),
                serial: captures[4].parse().unwrap_or(0),
                ttl: captures[5].parse().unwrap_or(0),
            });
        }
    }

    records
}

// ========== Handlers ==========

/// Get DNS server information
#[utoipa::path(
    get,
    path = "/api/v1/dns/{server}/info",
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Server information", body = DnsServerInfo),
        (status = 500, description = "Output could not be parsed"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn server_info(
    State(state): State<AppState>,
    Path(server): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<DnsServerInfo>, ApiError> {
    info!("Getting DNS server info for {}", server);

    let key = format!("dns:serverinfo:{}", server);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let target = server.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&serverinfo_args(&target)).await
        })
        .await
        .map_err(|e| {
            error!("dns serverinfo failed for {}: {}", server, e);
            ApiError::CommandFailed(e.to_string())
        })?;

    let server_info = parse_server_info(&output).map_err(ApiError::ParseError)?;
    Ok(Json(server_info))
}

/// List zones hosted by a DNS server
#[utoipa::path(
    get,
    path = "/api/v1/dns/{server}/zones",
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "List of zones", body = ZoneListResponse),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn list_zones(
    State(state): State<AppState>,
    Path(server): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<ZoneListResponse>, ApiError> {
    info!("Listing DNS zones on {}", server);

    let key = format!("dns:zonelist:{}", server);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let target = server.clone();
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba.run(&zonelist_args(&target)).await
        })
        .await
        .map_err(|e| {
            error!("dns zonelist failed for {}: {}", server, e);
            metrics::record_directory_operation("dns", "zonelist", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    let zones = parse_zone_list(&output);
    let count = zones.len();
    metrics::record_directory_operation("dns", "zonelist", true);

    Ok(Json(ZoneListResponse {
        zones,
        count,
        raw_output: output,
    }))
}

/// Create a zone
#[utoipa::path(
    post,
    path = "/api/v1/dns/{server}/zones",
    request_body = CreateZoneRequest,
    params(
        ("server" = String, Path, description = "DNS server hostname or IP")
    ),
    responses(
        (status = 201, description = "Zone created successfully", body = DnsResponse),
        (status = 400, description = "Invalid zone name"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn create_zone(
    State(state): State<AppState>,
    Path(server): Path<String>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<(StatusCode, Json<DnsResponse>), ApiError> {
    info!("Creating DNS zone {} on {}", request.zone, server);
    validation::validate_zone_name(&request.zone)?;

    let output = state
        .samba
        .run(&zonecreate_args(&server, &request.zone))
        .await
        .map_err(|e| {
            error!("dns zonecreate failed for {}: {}", request.zone, e);
            metrics::record_directory_operation("dns", "zonecreate", false);
            ApiError::CommandFailed(e.to_string())
        })?;

    info!("Zone {} created successfully", request.zone);
    metrics::record_directory_operation("dns", "zonecreate", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(DnsResponse {
            success: true,
            message: format!("Zone {} created successfully", request.zone),
            details: Some(output),
        }),
    ))
}

/// Delete a zone (requires confirmation)
///
/// Zone deletion removes every record in the zone, so the request body must
/// carry the literal confirmation string "DELETE".
#[utoipa::path(
    delete,
    path = "/api/v1/dns/{server}/zones/{zone}",
    request_body = DeleteZoneRequest,
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("zone" = String, Path, description = "Zone name to delete")
    ),
    responses(
        (status = 200, description = "Zone deleted successfully", body = DnsResponse),
        (status = 400, description = "Missing or wrong confirmation"),
        (status = 404, description = "Zone not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn delete_zone(
    State(state): State<AppState>,
    Path((server, zone)): Path<(String, String)>,
    Json(request): Json<DeleteZoneRequest>,
) -> Result<Json<DnsResponse>, ApiError> {
    info!("Deleting DNS zone {} on {}", zone, server);
    validation::validate_zone_name(&zone)?;

    // The confirmation check runs before any command is built
    if request.confirm != DELETE_CONFIRMATION {
        warn!("zone delete for {} rejected: missing confirmation", zone);
        return Err(ApiError::InvalidRequest(format!(
            "Zone deletion requires confirm=\"{}\"",
            DELETE_CONFIRMATION
        )));
    }

    let output = state
        .samba
        .run(&zonedelete_args(&server, &zone))
        .await
        .map_err(|e| {
            error!("dns zonedelete failed for {}: {}", zone, e);
            metrics::record_directory_operation("dns", "zonedelete", false);
            ApiError::from_command_error(&zone, e)
        })?;

    info!("Zone {} deleted successfully", zone);
    metrics::record_directory_operation("dns", "zonedelete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(DnsResponse {
        success: true,
        message: format!("Zone {} deleted successfully", zone),
        details: Some(output),
    }))
}

/// Query records in a zone
#[utoipa::path(
    get,
    path = "/api/v1/dns/{server}/zones/{zone}/records",
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("zone" = String, Path, description = "Zone name"),
        ("name" = Option<String>, Query, description = "Record name; defaults to the zone apex"),
        ("type" = Option<String>, Query, description = "Record type; defaults to ALL"),
        ("refresh" = Option<bool>, Query, description = "Bypass the cache and re-run the command")
    ),
    responses(
        (status = 200, description = "Matching records", body = RecordQueryResponse),
        (status = 400, description = "Invalid query"),
        (status = 404, description = "Zone not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn query_records(
    State(state): State<AppState>,
    Path((server, zone)): Path<(String, String)>,
    Query(params): Query<RecordQueryParams>,
) -> Result<Json<RecordQueryResponse>, ApiError> {
    info!("Querying records in zone {} on {}", zone, server);
    validation::validate_zone_name(&zone)?;

    let name = params.name.unwrap_or_else(|| "@".to_string());
    validation::validate_record_name(&name)?;

    let record_type = match params.record_type {
        Some(ref value) => {
            // ALL is a query-only pseudo-type
            if !value.eq_ignore_ascii_case("ALL") {
                value.parse::<DnsRecordType>().map_err(ApiError::InvalidRequest)?;
            }
            value.to_uppercase()
        }
        None => "ALL".to_string(),
    };

    let key = format!("dns:query:{}:{}:{}:{}", server, zone, name, record_type);
    if params.refresh {
        state.cache.remove(&key);
    }

    let samba = Arc::clone(&state.samba);
    let (target, zone_arg, name_arg, type_arg) =
        (server.clone(), zone.clone(), name.clone(), record_type.clone());
    let output = state
        .cache
        .get_or_fetch(&key, STALE_WINDOW, move || async move {
            samba
                .run(&query_args(&target, &zone_arg, &name_arg, &type_arg))
                .await
        })
        .await
        .map_err(|e| {
            error!("dns query failed for {}: {}", zone, e);
            ApiError::from_command_error(&zone, e)
        })?;

    let records = parse_query_output(&output);
    let count = records.len();

    Ok(Json(RecordQueryResponse {
        zone,
        records,
        count,
        raw_output: output,
    }))
}

/// Add a record to a zone
#[utoipa::path(
    post,
    path = "/api/v1/dns/{server}/zones/{zone}/records",
    request_body = AddRecordRequest,
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("zone" = String, Path, description = "Zone name")
    ),
    responses(
        (status = 201, description = "Record added successfully", body = DnsResponse),
        (status = 400, description = "Invalid record"),
        (status = 404, description = "Zone not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn add_record(
    State(state): State<AppState>,
    Path((server, zone)): Path<(String, String)>,
    Json(request): Json<AddRecordRequest>,
) -> Result<(StatusCode, Json<DnsResponse>), ApiError> {
    info!(
        "Adding {} record {} = {} to zone {} on {}",
        request.record_type, request.name, request.data, zone, server
    );

    validation::validate_zone_name(&zone)?;
    validation::validate_record_name(&request.name)?;
    validation::validate_record_data(request.record_type, &request.data)?;

    let output = state
        .samba
        .run(&add_record_args(
            &server,
            &zone,
            &request.name,
            request.record_type,
            &request.data,
        ))
        .await
        .map_err(|e| {
            error!("dns add failed for zone {}: {}", zone, e);
            metrics::record_directory_operation("dns", "add", false);
            ApiError::from_command_error(&zone, e)
        })?;

    info!("Record added to zone {}", zone);
    metrics::record_directory_operation("dns", "add", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok((
        StatusCode::CREATED,
        Json(DnsResponse {
            success: true,
            message: format!("Record added to zone {}", zone),
            details: Some(output),
        }),
    ))
}

/// Delete a record from a zone (exact match of name, type and data)
#[utoipa::path(
    delete,
    path = "/api/v1/dns/{server}/zones/{zone}/records",
    request_body = DeleteRecordRequest,
    params(
        ("server" = String, Path, description = "DNS server hostname or IP"),
        ("zone" = String, Path, description = "Zone name")
    ),
    responses(
        (status = 200, description = "Record deleted successfully", body = DnsResponse),
        (status = 400, description = "Invalid record"),
        (status = 404, description = "Zone or record not found"),
        (status = 502, description = "samba-tool command failed")
    ),
    tag = "dns"
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((server, zone)): Path<(String, String)>,
    Json(request): Json<DeleteRecordRequest>,
) -> Result<Json<DnsResponse>, ApiError> {
    info!(
        "Deleting {} record {} = {} from zone {} on {}",
        request.record_type, request.name, request.data, zone, server
    );

    validation::validate_zone_name(&zone)?;
    validation::validate_record_name(&request.name)?;
    validation::validate_record_data(request.record_type, &request.data)?;

    let output = state
        .samba
        .run(&delete_record_args(
            &server,
            &zone,
            &request.name,
            request.record_type,
            &request.data,
        ))
        .await
        .map_err(|e| {
            error!("dns delete failed for zone {}: {}", zone, e);
            metrics::record_directory_operation("dns", "delete", false);
            ApiError::from_command_error(&zone, e)
        })?;

    info!("Record deleted from zone {}", zone);
    metrics::record_directory_operation("dns", "delete", true);
    state.cache.invalidate_prefix(CACHE_PREFIX);

    Ok(Json(DnsResponse {
        success: true,
        message: format!("Record deleted from zone {}", zone),
        details: Some(output),
    }))
}
