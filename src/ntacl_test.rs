// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the NT ACL module

use super::ntacl::*;

#[test]
fn test_ntacl_get_args_requests_sddl() {
    assert_eq!(
        ntacl_get_args("/var/lib/samba/sysvol"),
        vec!["ntacl", "get", "/var/lib/samba/sysvol", "--as-sddl"]
    );
}

#[test]
fn test_ntacl_set_args_order() {
    // samba-tool takes the descriptor before the path
    assert_eq!(
        ntacl_set_args("O:LAG:DUD:(A;;FA;;;SY)", "/srv/share"),
        vec!["ntacl", "set", "O:LAG:DUD:(A;;FA;;;SY)", "/srv/share"]
    );
}

#[test]
fn test_sysvol_args() {
    assert_eq!(sysvolcheck_args(), vec!["ntacl", "sysvolcheck"]);
    assert_eq!(sysvolreset_args(), vec!["ntacl", "sysvolreset"]);
}

#[test]
fn test_set_request_deserialization() {
    let json = r#"{"path": "/srv/share", "sddl": "O:LAG:DUD:(A;;FA;;;SY)"}"#;
    let request: SetNtAclRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.path, "/srv/share");
    assert_eq!(request.sddl, "O:LAG:DUD:(A;;FA;;;SY)");
}

#[test]
fn test_ntacl_response_omits_descriptor_when_absent() {
    let response = NtAclResponse {
        path: "/srv/share".to_string(),
        raw_sddl: "garbled".to_string(),
        descriptor: None,
    };
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("rawSddl"));
    assert!(!json.contains("descriptor"));
}
