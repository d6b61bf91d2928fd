// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the SDDL parser

use super::sddl::*;

#[test]
fn test_parse_minimal_descriptor() {
    let descriptor = parse_sddl("O:LAG:DUD:P(A;OICI;FA;;;LA)").unwrap();

    assert_eq!(descriptor.owner.as_deref(), Some("LA"));
    assert_eq!(descriptor.group.as_deref(), Some("DU"));
    assert_eq!(descriptor.dacl_flags, vec!["P"]);
    assert_eq!(descriptor.dacl.len(), 1);
    assert!(descriptor.sacl.is_empty());

    let ace = &descriptor.dacl[0];
    assert_eq!(ace.access, AceAccessType::Allow);
    assert_eq!(ace.flags, vec!["OI", "CI"]);
    assert_eq!(ace.rights, vec!["FA"]);
    assert_eq!(ace.trustee, "LA");
}

#[test]
fn test_parse_sid_trustees() {
    let input = "O:S-1-5-32-544G:S-1-5-21-3623811015-3361044348-30300820-513D:(A;;FA;;;S-1-5-21-3623811015-3361044348-30300820-512)";
    let descriptor = parse_sddl(input).unwrap();

    assert_eq!(descriptor.owner.as_deref(), Some("S-1-5-32-544"));
    assert_eq!(
        descriptor.group.as_deref(),
        Some("S-1-5-21-3623811015-3361044348-30300820-513")
    );
    assert_eq!(
        descriptor.dacl[0].trustee,
        "S-1-5-21-3623811015-3361044348-30300820-512"
    );
}

#[test]
fn test_parse_multiple_aces() {
    let input = "D:P(A;OICI;FA;;;BA)(A;OICI;FA;;;SY)(D;;FR;;;WD)";
    let descriptor = parse_sddl(input).unwrap();

    assert_eq!(descriptor.dacl.len(), 3);
    assert_eq!(descriptor.dacl[0].access, AceAccessType::Allow);
    assert_eq!(descriptor.dacl[1].trustee, "SY");
    assert_eq!(descriptor.dacl[2].access, AceAccessType::Deny);
    assert_eq!(descriptor.dacl[2].rights, vec!["FR"]);
}

#[test]
fn test_parse_hex_rights_known_mask() {
    let descriptor = parse_sddl("D:(A;OICI;0x001f01ff;;;SY)").unwrap();
    assert_eq!(descriptor.dacl[0].rights, vec!["FA"]);
}

#[test]
fn test_parse_hex_rights_unknown_mask_kept_raw() {
    let descriptor = parse_sddl("D:(A;;0x00000004;;;SY)").unwrap();
    assert_eq!(descriptor.dacl[0].rights, vec!["0x00000004"]);
}

#[test]
fn test_parse_inherit_only_ace() {
    let descriptor = parse_sddl("D:(A;OICIIO;GA;;;CO)").unwrap();
    let ace = &descriptor.dacl[0];
    assert_eq!(ace.flags, vec!["OI", "CI", "IO"]);
    assert_eq!(ace.rights, vec!["GA"]);
    assert_eq!(ace.trustee, "CO");
}

#[test]
fn test_parse_sacl_section() {
    let descriptor = parse_sddl("D:(A;;FA;;;SY)S:(AU;SA;FA;;;WD)").unwrap();
    assert_eq!(descriptor.dacl.len(), 1);
    assert_eq!(descriptor.sacl.len(), 1);
    assert_eq!(descriptor.sacl[0].access, AceAccessType::Audit);
    assert_eq!(descriptor.sacl[0].flags, vec!["SA"]);
}

#[test]
fn test_parse_object_ace_guids() {
    let input = "D:(OA;;CR;ab721a53-1e2f-11d0-9819-00aa0040529b;;WD)";
    let descriptor = parse_sddl(input).unwrap();
    let ace = &descriptor.dacl[0];
    assert_eq!(ace.access, AceAccessType::ObjectAllow);
    assert_eq!(
        ace.object_guid.as_deref(),
        Some("ab721a53-1e2f-11d0-9819-00aa0040529b")
    );
    assert!(ace.inherit_object_guid.is_none());
}

#[test]
fn test_parse_empty_optional_segments() {
    // ACEs without flags or GUIDs are routine
    let descriptor = parse_sddl("D:(A;;FA;;;SY)").unwrap();
    let ace = &descriptor.dacl[0];
    assert!(ace.flags.is_empty());
    assert!(ace.object_guid.is_none());
    assert!(ace.inherit_object_guid.is_none());
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_sddl("not an sddl string").is_err());
    assert!(parse_sddl("").is_err());
}

#[test]
fn test_parse_rejects_malformed_ace() {
    // Too few fields inside the ACE
    assert!(parse_sddl("D:(A;FA;SY)").is_err());
}

#[test]
fn test_parse_is_deterministic() {
    let input = "O:LAG:DUD:P(A;OICI;FA;;;LA)(D;;FR;;;WD)";
    assert_eq!(parse_sddl(input).unwrap(), parse_sddl(input).unwrap());
}
