// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the domain module

use super::domain::*;

const LEVEL_OUTPUT: &str = "\
Domain and forest function level for domain 'DC=samdom,DC=example,DC=com'

Forest function level: (Windows) 2008 R2
Domain function level: (Windows) 2008 R2
Lowest function level of a DC: (Windows) 2008 R2
";

const INFO_OUTPUT: &str = "\
Forest           : samdom.example.com
Domain           : samdom.example.com
Netbios domain   : SAMDOM
DC name          : dc1.samdom.example.com
DC netbios name  : DC1
Server site      : Default-First-Site-Name
Client site      : Default-First-Site-Name
";

const PASSWORD_SETTINGS_OUTPUT: &str = "\
Password information for domain 'DC=samdom,DC=example,DC=com'

Password complexity: on
Store plaintext passwords: off
Password history length: 24
Minimum password length: 7
Minimum password age (days): 1
Maximum password age (days): 42
Account lockout duration (mins): 30
Account lockout threshold (attempts): 0
Reset account lockout after (mins): 30
";

#[test]
fn test_parse_level_show() {
    let levels = parse_level_show(LEVEL_OUTPUT).unwrap();
    assert_eq!(levels.forest_level, "(Windows) 2008 R2");
    assert_eq!(levels.domain_level, "(Windows) 2008 R2");
    assert_eq!(levels.lowest_dc_level.as_deref(), Some("(Windows) 2008 R2"));
    assert_eq!(levels.raw_output, LEVEL_OUTPUT);
}

#[test]
fn test_parse_level_show_missing_levels_is_error() {
    assert!(parse_level_show("Domain and forest function level for domain 'DC=x'\n").is_err());
}

#[test]
fn test_parse_domain_info() {
    let info = parse_domain_info(INFO_OUTPUT).unwrap();
    assert_eq!(info.domain, "samdom.example.com");
    assert_eq!(info.forest.as_deref(), Some("samdom.example.com"));
    assert_eq!(info.netbios_domain.as_deref(), Some("SAMDOM"));
    assert_eq!(info.dc_name.as_deref(), Some("dc1.samdom.example.com"));
    assert_eq!(info.dc_netbios_name.as_deref(), Some("DC1"));
    assert_eq!(info.server_site.as_deref(), Some("Default-First-Site-Name"));
}

#[test]
fn test_parse_domain_info_requires_domain() {
    assert!(parse_domain_info("Forest : samdom.example.com\n").is_err());
}

#[test]
fn test_parse_password_settings() {
    let settings = parse_password_settings(PASSWORD_SETTINGS_OUTPUT);
    assert_eq!(settings.complexity, Some(true));
    assert_eq!(settings.store_plaintext, Some(false));
    assert_eq!(settings.history_length, Some(24));
    assert_eq!(settings.min_pwd_length, Some(7));
    assert_eq!(settings.min_pwd_age_days, Some(1));
    assert_eq!(settings.max_pwd_age_days, Some(42));
    assert_eq!(settings.lockout_duration_mins, Some(30));
    assert_eq!(settings.lockout_threshold, Some(0));
    assert_eq!(settings.reset_lockout_after_mins, Some(30));
}

#[test]
fn test_parse_password_settings_degrades_to_raw() {
    // Unrecognized output produces no structured fields but keeps the text
    let settings = parse_password_settings("unexpected output\n");
    assert!(settings.complexity.is_none());
    assert!(settings.min_pwd_length.is_none());
    assert_eq!(settings.raw_output, "unexpected output\n");
}

#[test]
fn test_level_raise_args_optional_iff_present() {
    let request = RaiseLevelRequest {
        forest_level: Some("2012_R2".to_string()),
        domain_level: None,
    };
    assert_eq!(
        level_raise_args(&request),
        vec!["domain", "level", "raise", "--forest-level=2012_R2"]
    );

    let request = RaiseLevelRequest {
        forest_level: Some("2012_R2".to_string()),
        domain_level: Some("2012_R2".to_string()),
    };
    let args = level_raise_args(&request);
    assert!(args.contains(&"--forest-level=2012_R2".to_string()));
    assert!(args.contains(&"--domain-level=2012_R2".to_string()));
}

#[test]
fn test_passwordsettings_set_args_optional_iff_present() {
    let request = SetPasswordSettingsRequest {
        complexity: Some("off".to_string()),
        history_length: None,
        min_pwd_length: Some(12),
        min_pwd_age: None,
        max_pwd_age: None,
        account_lockout_duration: None,
        account_lockout_threshold: None,
        reset_account_lockout_after: None,
    };
    let args = passwordsettings_set_args(&request);
    assert_eq!(
        args,
        vec![
            "domain",
            "passwordsettings",
            "set",
            "--complexity=off",
            "--min-pwd-length=12"
        ]
    );
}

#[test]
fn test_passwordsettings_set_args_empty_request() {
    let request = SetPasswordSettingsRequest {
        complexity: None,
        history_length: None,
        min_pwd_length: None,
        min_pwd_age: None,
        max_pwd_age: None,
        account_lockout_duration: None,
        account_lockout_threshold: None,
        reset_account_lockout_after: None,
    };
    // Only the base command; the handler rejects this before executing
    assert_eq!(
        passwordsettings_set_args(&request),
        vec!["domain", "passwordsettings", "set"]
    );
}

#[test]
fn test_misc_arg_builders() {
    assert_eq!(level_show_args(), vec!["domain", "level", "show"]);
    assert_eq!(
        domain_info_args("dc1.samdom.example.com"),
        vec!["domain", "info", "dc1.samdom.example.com"]
    );
    assert_eq!(
        passwordsettings_show_args(),
        vec!["domain", "passwordsettings", "show"]
    );
    assert_eq!(time_args("dc1"), vec!["time", "dc1"]);
}
