// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the forest module

use super::forest::*;

#[test]
fn test_parse_dsheuristics_set_value() {
    let output = "dsheuristics: 0000002\n";
    assert_eq!(parse_dsheuristics(output).as_deref(), Some("0000002"));
}

#[test]
fn test_parse_dsheuristics_quoted_value() {
    let output = "dsheuristics: \"0000002\"\n";
    assert_eq!(parse_dsheuristics(output).as_deref(), Some("0000002"));
}

#[test]
fn test_parse_dsheuristics_not_set() {
    let output = "dSHeuristics is not set on this forest\n";
    assert!(parse_dsheuristics(output).is_none());
    assert!(parse_dsheuristics("").is_none());
}

#[test]
fn test_dsheuristics_arg_builders() {
    assert_eq!(
        dsheuristics_show_args(),
        vec!["forest", "directory_service", "dsheuristics", "show"]
    );
    assert_eq!(
        dsheuristics_set_args("0000002"),
        vec!["forest", "directory_service", "dsheuristics", "0000002"]
    );
}

#[test]
fn test_set_request_deserialization() {
    let request: SetDsHeuristicsRequest =
        serde_json::from_str(r#"{"value": "0000002"}"#).unwrap();
    assert_eq!(request.value, "0000002");
}
