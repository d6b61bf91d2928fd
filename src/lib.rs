// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! sambacar - HTTP REST API for managing a Samba AD DC via samba-tool
//!
//! A lightweight library that provides programmatic control over a Samba
//! Active Directory Domain Controller by executing samba-tool commands and
//! parsing their text output into typed records.
//!
//! # Features
//!
//! - Users, groups and organizational units
//! - DNS zones and records
//! - Sites and subnets
//! - FSMO role display, transfer and seizure
//! - NT ACLs with SDDL parsing
//! - Service principal names
//! - Domain function levels, password policy and forest settings
//! - Cached read operations with staleness and eviction windows
//! - Authentication support (Bearer tokens)
//! - Prometheus metrics integration
//!
//! # Usage
//!
//! This crate can be used as both a library and a standalone binary:
//!
//! ## As a Library
//!
//! ### Using the samba-tool Executor
//!
//! ```rust,no_run
//! use sambacar::SambaToolExecutor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let samba = SambaToolExecutor::new(None, None, None, false);
//!
//!     // Execute samba-tool commands
//!     let users = samba
//!         .run(&["user".to_string(), "list".to_string()])
//!         .await?;
//!     println!("Users:\n{}", users);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Using Shared Types (for API clients)
//!
//! ```rust
//! use sambacar::users::CreateUserRequest;
//!
//! let request = CreateUserRequest {
//!     username: "alice".to_string(),
//!     password: "Secret123!".to_string(),
//!     given_name: Some("Alice".to_string()),
//!     surname: Some("Liddell".to_string()),
//!     initials: None,
//!     mail_address: None,
//!     telephone_number: None,
//!     job_title: None,
//!     department: None,
//!     company: None,
//!     description: None,
//!     user_ou: None,
//!     must_change_at_next_login: false,
//! };
//!
//! // Serialize to JSON for API requests
//! let json = serde_json::to_string(&request).unwrap();
//! ```
//!
//! ## As a Binary
//!
//! ```bash
//! cargo install sambacar
//! sambacar
//! ```
//!
//! # Integration with Other Projects
//!
//! By importing this crate you get type-safe request/response structures,
//! automatic JSON serialization/deserialization, and OpenAPI schema
//! compatibility without maintaining duplicate type definitions.

// Re-export public modules
pub mod auth;
pub mod cache;
pub mod dns;
pub mod domain;
pub mod forest;
pub mod fsmo;
pub mod groups;
pub mod metrics;
pub mod middleware;
pub mod ntacl;
pub mod orgunits;
pub mod parsers;
pub mod rate_limit;
pub mod samba;
pub mod sddl;
pub mod sites;
pub mod spn;
pub mod types;
pub mod users;
pub mod validation;

// samba-tool executor
pub use samba::SambaToolExecutor;

// Query cache
pub use cache::QueryCache;

// Error types
pub use types::{ApiError, AppState, ErrorResponse};

// SDDL parsing
pub use sddl::{parse_sddl, SecurityDescriptor};

#[cfg(test)]
mod dns_test;
#[cfg(test)]
mod domain_test;
#[cfg(test)]
mod forest_test;
#[cfg(test)]
mod middleware_test;
#[cfg(test)]
mod ntacl_test;
#[cfg(test)]
mod orgunits_test;
#[cfg(test)]
mod sddl_test;
#[cfg(test)]
mod sites_test;
#[cfg(test)]
mod types_test;
#[cfg(test)]
mod users_test;
