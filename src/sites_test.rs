// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the sites module

use super::sites::*;

#[test]
fn test_site_arg_builders() {
    assert_eq!(site_list_args(), vec!["sites", "list"]);
    assert_eq!(
        create_site_args("Branch-Office"),
        vec!["sites", "create", "Branch-Office"]
    );
    assert_eq!(
        remove_site_args("Branch-Office"),
        vec!["sites", "remove", "Branch-Office"]
    );
}

#[test]
fn test_subnet_arg_builders() {
    assert_eq!(
        create_subnet_args("192.168.1.0/24", "Branch-Office"),
        vec!["sites", "subnet", "create", "192.168.1.0/24", "Branch-Office"]
    );
    assert_eq!(
        remove_subnet_args("192.168.1.0/24"),
        vec!["sites", "subnet", "remove", "192.168.1.0/24"]
    );
    assert_eq!(
        set_subnet_site_args("192.168.1.0/24", "Head-Office"),
        vec!["sites", "subnet", "set-site", "192.168.1.0/24", "Head-Office"]
    );
}

#[test]
fn test_set_subnet_site_request_deserialization() {
    let json = r#"{"subnet": "10.1.0.0/16", "site": "Head-Office"}"#;
    let request: SetSubnetSiteRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.subnet, "10.1.0.0/16");
    assert_eq!(request.site, "Head-Office");
}

#[test]
fn test_site_list_response_serialization() {
    let response = SiteListResponse {
        sites: vec!["Default-First-Site-Name".to_string()],
        count: 1,
    };
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("Default-First-Site-Name"));
    assert!(json.contains("\"count\":1"));
}
