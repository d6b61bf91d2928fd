// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the organizational units module

use super::orgunits::*;

const SALES_DN: &str = "OU=Sales,DC=samdom,DC=example,DC=com";

#[test]
fn test_ou_list_args_requests_full_dn() {
    assert_eq!(ou_list_args(), vec!["ou", "list", "--full-dn"]);
}

#[test]
fn test_create_ou_args_minimal() {
    let request = CreateOrgUnitRequest {
        dn: SALES_DN.to_string(),
        description: None,
    };
    assert_eq!(create_ou_args(&request), vec!["ou", "create", SALES_DN]);
}

#[test]
fn test_create_ou_args_with_description() {
    let request = CreateOrgUnitRequest {
        dn: SALES_DN.to_string(),
        description: Some("Sales department".to_string()),
    };
    let args = create_ou_args(&request);
    assert_eq!(args.last().unwrap(), "--description=Sales department");
}

#[test]
fn test_delete_and_objects_args() {
    assert_eq!(delete_ou_args(SALES_DN), vec!["ou", "delete", SALES_DN]);
    assert_eq!(
        ou_objects_args(SALES_DN),
        vec!["ou", "listobjects", SALES_DN, "--full-dn"]
    );
}

#[test]
fn test_move_ou_args() {
    assert_eq!(
        move_ou_args(SALES_DN, "OU=Departments,DC=samdom,DC=example,DC=com"),
        vec![
            "ou",
            "move",
            SALES_DN,
            "OU=Departments,DC=samdom,DC=example,DC=com"
        ]
    );
}

#[test]
fn test_rename_ou_args_prepends_rdn_prefix() {
    assert_eq!(
        rename_ou_args(SALES_DN, "Marketing"),
        vec!["ou", "rename", SALES_DN, "OU=Marketing"]
    );
}

#[test]
fn test_org_unit_request_deserialization() {
    let json = r#"{"dn": "OU=Sales,DC=samdom,DC=example,DC=com"}"#;
    let request: OrgUnitRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.dn, SALES_DN);
}

#[test]
fn test_move_request_deserialization() {
    let json = r#"{
        "dn": "OU=Sales,DC=samdom,DC=example,DC=com",
        "newParentDn": "OU=Departments,DC=samdom,DC=example,DC=com"
    }"#;
    let request: MoveOrgUnitRequest = serde_json::from_str(json).unwrap();
    assert_eq!(
        request.new_parent_dn,
        "OU=Departments,DC=samdom,DC=example,DC=com"
    );
}
