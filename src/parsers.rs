// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared parsing helpers for samba-tool output
//!
//! samba-tool output is line-oriented: name-per-line listings, LDIF-style
//! `attribute: value` blocks and RPC-style `Key : Value` dumps. The helpers
//! here implement the common rules (trim each line, drop blanks, keep the
//! full raw text available for display) so the per-command parsers only
//! pick out their fields.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds between the Windows FILETIME epoch (1601-01-01) and the Unix epoch
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// FILETIME value meaning "never" for accountExpires
const FILETIME_NEVER: u64 = 0x7FFF_FFFF_FFFF_FFFF;

/// Parse name-per-line list output into a sorted list of names
///
/// Lines are trimmed and blank lines dropped. The result is sorted
/// lexicographically ascending, one policy for every listing.
pub fn parse_name_list(output: &str) -> Vec<String> {
    let mut names: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

/// Extract `key: value` pairs from block output
///
/// Each line is split on the first colon with both halves trimmed; lines
/// without a colon are skipped (they stay visible through the raw output the
/// caller keeps). Handles both LDIF attributes (`sAMAccountName: alice`) and
/// the RPC dump style (`pszServerName               : dc1.example.com`).
pub fn kv_pairs(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// First value for `key` among extracted pairs
pub fn kv_first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// All values for `key` among extracted pairs (multi-valued LDIF attributes)
pub fn kv_all<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Convert a Windows FILETIME attribute value to a UTC timestamp
///
/// `0` and `0x7FFFFFFFFFFFFFFF` both mean "never" and yield `None`, as does
/// anything that does not parse as an unsigned integer.
pub fn filetime_to_utc(raw: &str) -> Option<DateTime<Utc>> {
    let value: u64 = raw.trim().parse().ok()?;
    if value == 0 || value >= FILETIME_NEVER {
        return None;
    }
    let unix_secs = (value / 10_000_000) as i64 - FILETIME_UNIX_OFFSET_SECS;
    DateTime::from_timestamp(unix_secs, 0)
}

/// Convert an AD generalized-time attribute (e.g. `20240101120000.0Z`) to UTC
pub fn generalized_time_to_utc(raw: &str) -> Option<DateTime<Utc>> {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 14 {
        return None;
    }
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let hour: u32 = digits[8..10].parse().ok()?;
    let minute: u32 = digits[10..12].parse().ok()?;
    let second: u32 = digits[12..14].parse().ok()?;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_list_sorts_and_drops_blanks() {
        let output = "charlie\n\nalice\n  bob  \n\n";
        assert_eq!(parse_name_list(output), vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn test_parse_name_list_empty_output() {
        assert!(parse_name_list("").is_empty());
        assert!(parse_name_list("\n\n  \n").is_empty());
    }

    #[test]
    fn test_parse_name_list_line_count() {
        // N non-empty lines produce exactly N entries
        let output = "u1\nu2\nu3\nu4\n";
        assert_eq!(parse_name_list(output).len(), 4);
    }

    #[test]
    fn test_kv_pairs_ldif_style() {
        let output = "dn: CN=alice,CN=Users,DC=samdom,DC=example,DC=com\nsAMAccountName: alice\n";
        let pairs = kv_pairs(output);
        assert_eq!(
            kv_first(&pairs, "dn"),
            Some("CN=alice,CN=Users,DC=samdom,DC=example,DC=com")
        );
        assert_eq!(kv_first(&pairs, "sAMAccountName"), Some("alice"));
    }

    #[test]
    fn test_kv_pairs_rpc_dump_style() {
        let output = "  pszServerName               : DC1.samdom.example.com\n  fAllowUpdate                : TRUE\n";
        let pairs = kv_pairs(output);
        assert_eq!(kv_first(&pairs, "pszServerName"), Some("DC1.samdom.example.com"));
        assert_eq!(kv_first(&pairs, "fAllowUpdate"), Some("TRUE"));
    }

    #[test]
    fn test_kv_pairs_skips_lines_without_colon() {
        let output = "2 zone(s) found\npszZoneName : example.com\n";
        let pairs = kv_pairs(output);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_kv_all_multivalued() {
        let output = "memberOf: CN=Domain Admins,CN=Users,DC=x\nmemberOf: CN=IT,OU=Groups,DC=x\n";
        let pairs = kv_pairs(output);
        assert_eq!(kv_all(&pairs, "memberOf").len(), 2);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let output = "beta\nalpha\n";
        assert_eq!(parse_name_list(output), parse_name_list(output));
        assert_eq!(kv_pairs(output), kv_pairs(output));
    }

    #[test]
    fn test_filetime_never_values() {
        assert!(filetime_to_utc("0").is_none());
        assert!(filetime_to_utc("9223372036854775807").is_none());
        assert!(filetime_to_utc("garbage").is_none());
    }

    #[test]
    fn test_filetime_known_value() {
        // 2024-01-01T00:00:00Z in FILETIME units
        let dt = filetime_to_utc("133485408000000000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_generalized_time() {
        let dt = generalized_time_to_utc("20240101120000.0Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T12:00:00+00:00");
        assert!(generalized_time_to_utc("2024").is_none());
    }
}
