// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Samba AD DC API Server
//!
//! A lightweight HTTP REST API server that administers a Samba Active
//! Directory Domain Controller by:
//! - Executing local samba-tool commands with argument vectors
//! - Parsing command output into typed records
//! - Caching read results with staleness and eviction windows
//!
//! This server runs on (or next to) the DC host, with optional sudo
//! elevation when it is not running as root.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Import from the library
use sambacar::{
    auth::authenticate,
    cache::{QueryCache, DEFAULT_EVICT_SECS},
    dns, domain, forest, fsmo, groups, metrics, middleware, ntacl, orgunits,
    rate_limit::{GovernorConfigBuilder, GovernorLayer, RateLimitConfig, SmartIpKeyExtractor},
    samba::SambaToolExecutor,
    sddl, sites, spn,
    types::{AppState, ErrorResponse},
    users, validation,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        users::list_users,
        users::show_user,
        users::create_user,
        users::delete_user,
        users::enable_user,
        users::disable_user,
        users::move_user,
        users::set_user_password,
        users::set_user_expiry,
        groups::list_groups,
        groups::list_group_members,
        groups::create_group,
        groups::delete_group,
        groups::add_group_members,
        groups::remove_group_members,
        orgunits::list_org_units,
        orgunits::list_org_unit_objects,
        orgunits::create_org_unit,
        orgunits::delete_org_unit,
        orgunits::move_org_unit,
        orgunits::rename_org_unit,
        dns::server_info,
        dns::list_zones,
        dns::create_zone,
        dns::delete_zone,
        dns::query_records,
        dns::add_record,
        dns::delete_record,
        sites::list_sites,
        sites::create_site,
        sites::remove_site,
        sites::create_subnet,
        sites::remove_subnet,
        sites::set_subnet_site,
        fsmo::show_roles,
        fsmo::transfer_role,
        fsmo::seize_role,
        ntacl::get_ntacl,
        ntacl::set_ntacl,
        ntacl::sysvolcheck,
        ntacl::sysvolreset,
        spn::list_spns,
        spn::add_spn,
        spn::delete_spn,
        domain::show_level,
        domain::raise_level,
        domain::domain_info,
        domain::show_password_settings,
        domain::set_password_settings,
        domain::server_time,
        forest::show_dsheuristics,
        forest::set_dsheuristics,
    ),
    components(
        schemas(
            users::CreateUserRequest,
            users::MoveUserRequest,
            users::SetPasswordRequest,
            users::SetExpiryRequest,
            users::UserResponse,
            users::UserListResponse,
            users::UserDetail,
            groups::CreateGroupRequest,
            groups::MembersRequest,
            groups::GroupResponse,
            groups::GroupListResponse,
            groups::GroupMembersResponse,
            orgunits::CreateOrgUnitRequest,
            orgunits::OrgUnitRequest,
            orgunits::MoveOrgUnitRequest,
            orgunits::RenameOrgUnitRequest,
            orgunits::OrgUnitResponse,
            orgunits::OrgUnitListResponse,
            orgunits::OrgUnitObjectsResponse,
            dns::CreateZoneRequest,
            dns::DeleteZoneRequest,
            dns::AddRecordRequest,
            dns::DeleteRecordRequest,
            dns::DnsResponse,
            dns::DnsZone,
            dns::ZoneListResponse,
            dns::DnsServerInfo,
            dns::DnsRecordEntry,
            dns::RecordQueryResponse,
            sites::CreateSiteRequest,
            sites::CreateSubnetRequest,
            sites::SubnetRequest,
            sites::SetSubnetSiteRequest,
            sites::SiteResponse,
            sites::SiteListResponse,
            fsmo::FsmoRole,
            fsmo::RoleRequest,
            fsmo::RoleOwner,
            fsmo::FsmoRolesResponse,
            fsmo::FsmoResponse,
            ntacl::SetNtAclRequest,
            ntacl::NtAclResponse,
            ntacl::NtAclActionResponse,
            spn::Spn,
            spn::SpnRequest,
            spn::SpnListResponse,
            spn::SpnResponse,
            domain::RaiseLevelRequest,
            domain::SetPasswordSettingsRequest,
            domain::DomainLevelResponse,
            domain::DomainInfoResponse,
            domain::PasswordSettingsResponse,
            domain::TimeResponse,
            domain::DomainResponse,
            forest::SetDsHeuristicsRequest,
            forest::DsHeuristicsResponse,
            forest::ForestResponse,
            validation::DnsRecordType,
            sddl::SecurityDescriptor,
            sddl::Ace,
            sddl::AceAccessType,
        )
    ),
    tags(
        (name = "users", description = "User management endpoints"),
        (name = "groups", description = "Group management endpoints"),
        (name = "ous", description = "Organizational unit endpoints"),
        (name = "dns", description = "DNS zone and record endpoints"),
        (name = "sites", description = "Site and subnet endpoints"),
        (name = "fsmo", description = "FSMO role endpoints"),
        (name = "ntacl", description = "NT ACL endpoints"),
        (name = "spn", description = "Service principal name endpoints"),
        (name = "domain", description = "Domain-level endpoints"),
        (name = "forest", description = "Forest settings endpoints")
    ),
    info(
        title = "Sambacar API",
        version = "0.3.2",
        description = "HTTP REST API for managing a Samba AD DC via samba-tool",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Server configuration
const DEFAULT_API_PORT: u16 = 8080;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Readiness check response
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    checks: Vec<String>,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics endpoint for Prometheus scraping
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics_text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to gather metrics: {}", e),
                details: None,
            }),
        )
            .into_response(),
    }
}

/// Readiness check endpoint
async fn ready_check(State(state): State<AppState>) -> Json<ReadyResponse> {
    let mut checks = Vec::new();
    let mut ready = true;

    // Check that samba-tool answers on the local DC
    let probe = vec!["time".to_string(), "localhost".to_string()];
    match state.samba.run(&probe).await {
        Ok(_) => {
            checks.push("samba_tool_available: true".to_string());
        }
        Err(e) => {
            warn!("samba-tool not ready: {}", e);
            ready = false;
            checks.push(format!("samba_tool_error: {}", e));
        }
    }

    Json(ReadyResponse { ready, checks })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!(
        "starting samba ad dc api server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // initialize metrics
    metrics::init_metrics();

    // get configuration from environment
    let samba_tool_path = std::env::var("SAMBA_TOOL_PATH").ok();
    let samba_username = std::env::var("SAMBA_USERNAME").ok();
    let samba_password = std::env::var("SAMBA_PASSWORD").ok();
    let elevate = std::env::var("SAMBACAR_ELEVATE")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let api_port = std::env::var("API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_API_PORT);
    let disable_auth = std::env::var("DISABLE_AUTH")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    let evict_secs = std::env::var("CACHE_EVICT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EVICT_SECS);

    info!(
        "samba-tool path: {}",
        samba_tool_path.as_deref().unwrap_or("/usr/bin/samba-tool")
    );
    info!("api port: {}", api_port);
    info!("cache eviction window: {}s", evict_secs);
    if elevate {
        info!("samba-tool commands run through sudo -n");
    }
    if disable_auth {
        warn!("authentication is disabled - api endpoints are unprotected!");
        warn!("this should only be used behind a trusted reverse proxy");
    } else {
        info!("authentication is enabled");
    }

    // create executor and query cache
    let samba = Arc::new(SambaToolExecutor::new(
        samba_tool_path,
        samba_username,
        samba_password,
        elevate,
    ));
    let cache = Arc::new(QueryCache::new(Duration::from_secs(evict_secs)));

    // create application state
    let state = AppState {
        samba,
        cache,
    };

    // build api routes
    let api_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{name}",
            get(users::show_user).delete(users::delete_user),
        )
        .route("/users/{name}/enable", post(users::enable_user))
        .route("/users/{name}/disable", post(users::disable_user))
        .route("/users/{name}/move", post(users::move_user))
        .route("/users/{name}/password", post(users::set_user_password))
        .route("/users/{name}/expiry", post(users::set_user_expiry))
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/{name}", axum::routing::delete(groups::delete_group))
        .route(
            "/groups/{name}/members",
            get(groups::list_group_members)
                .post(groups::add_group_members)
                .delete(groups::remove_group_members),
        )
        .route(
            "/ous",
            get(orgunits::list_org_units)
                .post(orgunits::create_org_unit)
                .delete(orgunits::delete_org_unit),
        )
        .route("/ous/objects", post(orgunits::list_org_unit_objects))
        .route("/ous/move", post(orgunits::move_org_unit))
        .route("/ous/rename", post(orgunits::rename_org_unit))
        .route("/dns/{server}/info", get(dns::server_info))
        .route(
            "/dns/{server}/zones",
            get(dns::list_zones).post(dns::create_zone),
        )
        .route(
            "/dns/{server}/zones/{zone}",
            axum::routing::delete(dns::delete_zone),
        )
        .route(
            "/dns/{server}/zones/{zone}/records",
            get(dns::query_records)
                .post(dns::add_record)
                .delete(dns::delete_record),
        )
        .route("/sites", get(sites::list_sites).post(sites::create_site))
        .route("/sites/{name}", axum::routing::delete(sites::remove_site))
        .route("/sites/{name}/subnets", post(sites::create_subnet))
        .route("/subnets", axum::routing::delete(sites::remove_subnet))
        .route("/subnets/set-site", post(sites::set_subnet_site))
        .route("/fsmo", get(fsmo::show_roles))
        .route("/fsmo/transfer", post(fsmo::transfer_role))
        .route("/fsmo/seize", post(fsmo::seize_role))
        .route("/ntacl", get(ntacl::get_ntacl).post(ntacl::set_ntacl))
        .route("/ntacl/sysvolcheck", post(ntacl::sysvolcheck))
        .route("/ntacl/sysvolreset", post(ntacl::sysvolreset))
        .route("/spns", post(spn::add_spn).delete(spn::delete_spn))
        .route("/spns/{user}", get(spn::list_spns))
        .route("/domain/level", get(domain::show_level))
        .route("/domain/level/raise", post(domain::raise_level))
        .route("/domain/info/{address}", get(domain::domain_info))
        .route(
            "/domain/passwordsettings",
            get(domain::show_password_settings).post(domain::set_password_settings),
        )
        .route("/domain/time/{server}", get(domain::server_time))
        .route(
            "/forest/dsheuristics",
            get(forest::show_dsheuristics).post(forest::set_dsheuristics),
        )
        .with_state(state.clone());

    // conditionally apply authentication middleware
    let api_routes = if disable_auth {
        api_routes
    } else {
        api_routes.layer(axum_middleware::from_fn(authenticate))
    };

    // conditionally apply rate limiting
    let rate_limit = RateLimitConfig::from_env();
    rate_limit
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid rate limit configuration: {}", e))?;

    let api_routes = if rate_limit.enabled {
        let replenish_ms =
            rate_limit.period_secs * 1000 / u64::from(rate_limit.requests_per_period);
        let governor_config = Arc::new(
            GovernorConfigBuilder::default()
                .period(Duration::from_millis(replenish_ms.max(1)))
                .burst_size(rate_limit.burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .context("failed to build rate limiter configuration")?,
        );
        info!(
            "rate limiting enabled: {} requests per {}s (burst {})",
            rate_limit.requests_per_period, rate_limit.period_secs, rate_limit.burst_size
        );
        api_routes.layer(GovernorLayer::new(governor_config))
    } else {
        warn!("rate limiting is disabled");
        api_routes
    };

    // build main router
    let app = Router::new()
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/ready", get(ready_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http());

    // start server
    let addr = format!("0.0.0.0:{}", api_port);

    info!("samba ad dc api server listening on {}", addr);
    info!("swagger ui available at http://{}/api/v1/docs", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // ConnectInfo is required for per-IP rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
