// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the users module

use super::users::*;

fn minimal_create_request() -> CreateUserRequest {
    CreateUserRequest {
        username: "alice".to_string(),
        password: "Secret123!".to_string(),
        given_name: None,
        surname: None,
        initials: None,
        mail_address: None,
        telephone_number: None,
        job_title: None,
        department: None,
        company: None,
        description: None,
        user_ou: None,
        must_change_at_next_login: false,
    }
}

const SHOW_OUTPUT: &str = "\
dn: CN=alice,CN=Users,DC=samdom,DC=example,DC=com
objectClass: top
objectClass: person
objectClass: user
cn: alice
displayName: Alice Liddell
name: alice
userAccountControl: 512
sAMAccountName: alice
memberOf: CN=Domain Admins,CN=Users,DC=samdom,DC=example,DC=com
memberOf: CN=IT Staff,OU=Groups,DC=samdom,DC=example,DC=com
accountExpires: 9223372036854775807
lastLogon: 133485408000000000
mail: alice@samdom.example.com
";

#[test]
fn test_create_user_args_minimal() {
    // No optional fields: the argument list is exactly the base command
    let args = create_user_args(&minimal_create_request());
    assert_eq!(args, vec!["user", "create", "alice", "Secret123!"]);
}

#[test]
fn test_create_user_args_optional_fields_present_iff_set() {
    let mut request = minimal_create_request();
    request.given_name = Some("Alice".to_string());
    request.mail_address = Some("alice@samdom.example.com".to_string());
    request.department = Some(String::new()); // empty: must be omitted

    let args = create_user_args(&request);
    assert!(args.contains(&"--given-name=Alice".to_string()));
    assert!(args.contains(&"--mail-address=alice@samdom.example.com".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--department")));
    assert!(!args.iter().any(|a| a.starts_with("--surname")));
}

#[test]
fn test_create_user_args_userou_and_must_change() {
    let mut request = minimal_create_request();
    request.user_ou = Some("OU=Sales,DC=samdom,DC=example,DC=com".to_string());
    request.must_change_at_next_login = true;

    let args = create_user_args(&request);
    assert!(args.contains(&"--userou=OU=Sales,DC=samdom,DC=example,DC=com".to_string()));
    assert_eq!(args.last().unwrap(), "--must-change-at-next-login");
}

#[test]
fn test_single_user_arg_builders() {
    assert_eq!(user_list_args(), vec!["user", "list"]);
    assert_eq!(user_show_args("bob"), vec!["user", "show", "bob"]);
    assert_eq!(delete_user_args("bob"), vec!["user", "delete", "bob"]);
    assert_eq!(enable_user_args("bob"), vec!["user", "enable", "bob"]);
    assert_eq!(disable_user_args("bob"), vec!["user", "disable", "bob"]);
    assert_eq!(
        move_user_args("bob", "OU=Sales,DC=samdom,DC=com"),
        vec!["user", "move", "bob", "OU=Sales,DC=samdom,DC=com"]
    );
}

#[test]
fn test_set_password_args() {
    let request = SetPasswordRequest {
        new_password: "N3wSecret!".to_string(),
        must_change_at_next_login: false,
    };
    assert_eq!(
        set_password_args("alice", &request),
        vec!["user", "setpassword", "alice", "--newpassword=N3wSecret!"]
    );

    let request = SetPasswordRequest {
        new_password: "N3wSecret!".to_string(),
        must_change_at_next_login: true,
    };
    let args = set_password_args("alice", &request);
    assert_eq!(args.last().unwrap(), "--must-change-at-next-login");
}

#[test]
fn test_set_expiry_args() {
    let request = SetExpiryRequest {
        days: Some(30),
        no_expiry: false,
    };
    assert_eq!(
        set_expiry_args("alice", &request),
        vec!["user", "setexpiry", "alice", "--days=30"]
    );

    // noexpiry wins over days
    let request = SetExpiryRequest {
        days: Some(30),
        no_expiry: true,
    };
    assert_eq!(
        set_expiry_args("alice", &request),
        vec!["user", "setexpiry", "alice", "--noexpiry"]
    );
}

#[test]
fn test_parse_user_show_full() {
    let detail = parse_user_show(SHOW_OUTPUT).unwrap();

    assert_eq!(detail.dn, "CN=alice,CN=Users,DC=samdom,DC=example,DC=com");
    assert_eq!(detail.username, "alice");
    assert_eq!(detail.display_name.as_deref(), Some("Alice Liddell"));
    assert_eq!(detail.mail.as_deref(), Some("alice@samdom.example.com"));
    assert!(detail.enabled);
    assert_eq!(detail.groups.len(), 2);
    assert_eq!(
        detail.organizational_unit.as_deref(),
        Some("CN=Users,DC=samdom,DC=example,DC=com")
    );
    // accountExpires of i64::MAX means never
    assert!(detail.account_expires.is_none());
    assert_eq!(
        detail.last_logon.as_deref(),
        Some("2024-01-01T00:00:00+00:00")
    );
    assert_eq!(detail.raw_output, SHOW_OUTPUT);
}

#[test]
fn test_parse_user_show_disabled_account() {
    let output = "\
dn: CN=bob,CN=Users,DC=samdom,DC=example,DC=com
sAMAccountName: bob
userAccountControl: 514
";
    let detail = parse_user_show(output).unwrap();
    assert!(!detail.enabled);
    assert!(detail.groups.is_empty());
    assert!(detail.display_name.is_none());
}

#[test]
fn test_parse_user_show_missing_required_fields() {
    // No dn at all
    assert!(parse_user_show("sAMAccountName: bob\n").is_err());
    // No sAMAccountName
    assert!(parse_user_show("dn: CN=bob,CN=Users,DC=x\n").is_err());
}

#[test]
fn test_parse_user_show_is_deterministic() {
    let first = parse_user_show(SHOW_OUTPUT).unwrap();
    let second = parse_user_show(SHOW_OUTPUT).unwrap();
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}

#[test]
fn test_create_user_request_deserialization() {
    let json = r#"{
        "username": "alice",
        "password": "Secret123!",
        "givenName": "Alice",
        "userOu": "OU=Sales,DC=samdom,DC=example,DC=com"
    }"#;

    let request: CreateUserRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.username, "alice");
    assert_eq!(request.given_name.as_deref(), Some("Alice"));
    assert_eq!(
        request.user_ou.as_deref(),
        Some("OU=Sales,DC=samdom,DC=example,DC=com")
    );
    assert!(!request.must_change_at_next_login);
}

#[test]
fn test_user_response_serialization() {
    let response = UserResponse {
        success: true,
        message: "User alice created successfully".to_string(),
        details: None,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"success\":true"));
    assert!(!json.contains("details"));
}
