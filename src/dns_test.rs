// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the DNS module

use super::dns::*;
use super::validation::DnsRecordType;

const ZONELIST_OUTPUT: &str = "\
  2 zone(s) found

  pszZoneName                 : samdom.example.com
  Flags                       : DNS_RPC_ZONE_DSINTEGRATED DNS_RPC_ZONE_UPDATE_SECURE
  ZoneType                    : DNS_ZONE_TYPE_PRIMARY
  Version                     : 50
  dwDpFlags                   : DNS_DP_AUTOCREATED DNS_DP_DOMAIN_DEFAULT DNS_DP_ENLISTED
  pszDpFqdn                   : DomainDnsZones.samdom.example.com

  pszZoneName                 : _msdcs.samdom.example.com
  Flags                       : DNS_RPC_ZONE_DSINTEGRATED
  ZoneType                    : DNS_ZONE_TYPE_PRIMARY
  Version                     : 50
  pszDpFqdn                   : ForestDnsZones.samdom.example.com
";

const SERVERINFO_OUTPUT: &str = "\
  dwVersion                   : 0xece0205
  fBootMethod                 : DNS_BOOT_METHOD_DIRECTORY
  fAdminConfigured            : FALSE
  fAllowUpdate                : TRUE
  fDsAvailable                : TRUE
  pszServerName               : DC1.samdom.example.com
  pszDsContainer              : CN=MicrosoftDNS,DC=DomainDnsZones,DC=samdom,DC=example,DC=com
";

const QUERY_OUTPUT: &str = "\
  Name=, Records=3, Children=0
    SOA: serial=110, refresh=900, retry=600, expire=86400, minttl=3600, ns=dc1.samdom.example.com., email=hostmaster.samdom.example.com. (flags=600000f0, serial=110, ttl=3600)
    NS: dc1.samdom.example.com. (flags=600000f0, serial=110, ttl=900)
    A: 192.168.1.5 (flags=600000f0, serial=110, ttl=900)
  Name=web01, Records=1, Children=0
    A: 192.168.1.10 (flags=f0, serial=110, ttl=900)
";

#[test]
fn test_parse_zone_list() {
    let zones = parse_zone_list(ZONELIST_OUTPUT);

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].name, "samdom.example.com");
    assert_eq!(
        zones[0].flags,
        vec!["DNS_RPC_ZONE_DSINTEGRATED", "DNS_RPC_ZONE_UPDATE_SECURE"]
    );
    assert_eq!(zones[0].zone_type.as_deref(), Some("DNS_ZONE_TYPE_PRIMARY"));
    assert_eq!(zones[0].version.as_deref(), Some("50"));
    assert_eq!(
        zones[0].partition.as_deref(),
        Some("DomainDnsZones.samdom.example.com")
    );
    assert_eq!(zones[1].name, "_msdcs.samdom.example.com");
}

#[test]
fn test_parse_zone_list_empty() {
    assert!(parse_zone_list("  0 zone(s) found\n").is_empty());
    assert!(parse_zone_list("").is_empty());
}

#[test]
fn test_parse_server_info() {
    let info = parse_server_info(SERVERINFO_OUTPUT).unwrap();

    assert_eq!(info.server_name, "DC1.samdom.example.com");
    assert_eq!(info.version.as_deref(), Some("0xece0205"));
    assert_eq!(info.boot_method.as_deref(), Some("DNS_BOOT_METHOD_DIRECTORY"));
    assert!(!info.admin_configured);
    assert!(info.allow_update);
    assert!(info.ds_available);
    assert_eq!(info.raw_output, SERVERINFO_OUTPUT);
}

#[test]
fn test_parse_server_info_missing_name_is_error() {
    assert!(parse_server_info("  fAllowUpdate : TRUE\n").is_err());
}

#[test]
fn test_parse_query_output() {
    let records = parse_query_output(QUERY_OUTPUT);

    assert_eq!(records.len(), 4);

    // Empty Name= maps to the zone apex
    assert_eq!(records[0].name, "@");
    assert_eq!(records[0].record_type, "SOA");
    assert_eq!(records[0].ttl, 3600);

    assert_eq!(records[2].record_type, "A");
    assert_eq!(records[2].data, "192.168.1.5");
    assert_eq!(records[2].flags, "600000f0");
    assert_eq!(records[2].serial, 110);

    assert_eq!(records[3].name, "web01");
    assert_eq!(records[3].data, "192.168.1.10");
    assert_eq!(records[3].ttl, 900);
}

#[test]
fn test_parse_query_output_ignores_unrecognized_lines() {
    let output = "something unexpected\n  A: 192.168.1.5 (flags=f0, serial=1, ttl=900)\n";
    let records = parse_query_output(output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "@");
}

#[test]
fn test_parse_query_output_is_deterministic() {
    assert_eq!(parse_query_output(QUERY_OUTPUT), parse_query_output(QUERY_OUTPUT));
}

#[test]
fn test_zone_arg_builders() {
    assert_eq!(
        zonelist_args("dc1"),
        vec!["dns", "zonelist", "dc1"]
    );
    assert_eq!(
        zonecreate_args("dc1", "example.com"),
        vec!["dns", "zonecreate", "dc1", "example.com"]
    );
    assert_eq!(
        zonedelete_args("dc1", "example.com"),
        vec!["dns", "zonedelete", "dc1", "example.com"]
    );
    assert_eq!(serverinfo_args("dc1"), vec!["dns", "serverinfo", "dc1"]);
}

#[test]
fn test_record_arg_builders() {
    assert_eq!(
        add_record_args("dc1", "example.com", "www", DnsRecordType::A, "192.0.2.1"),
        vec!["dns", "add", "dc1", "example.com", "www", "A", "192.0.2.1"]
    );
    assert_eq!(
        delete_record_args("dc1", "example.com", "www", DnsRecordType::A, "192.0.2.1"),
        vec!["dns", "delete", "dc1", "example.com", "www", "A", "192.0.2.1"]
    );
    assert_eq!(
        query_args("dc1", "example.com", "@", "ALL"),
        vec!["dns", "query", "dc1", "example.com", "@", "ALL"]
    );
}

#[test]
fn test_delete_zone_request_confirmation_value() {
    let request: DeleteZoneRequest = serde_json::from_str(r#"{"confirm": "DELETE"}"#).unwrap();
    assert_eq!(request.confirm, "DELETE");

    let request: DeleteZoneRequest = serde_json::from_str(r#"{"confirm": "delete"}"#).unwrap();
    // Case matters; the handler only accepts the exact literal
    assert_ne!(request.confirm, "DELETE");
}

#[test]
fn test_add_record_request_deserialization() {
    let json = r#"{"name": "www", "type": "A", "data": "192.0.2.1"}"#;
    let request: AddRecordRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.name, "www");
    assert_eq!(request.record_type, DnsRecordType::A);
    assert_eq!(request.data, "192.0.2.1");
}

#[test]
fn test_add_record_request_rejects_unknown_type() {
    let json = r#"{"name": "www", "type": "SPF", "data": "x"}"#;
    assert!(serde_json::from_str::<AddRecordRequest>(json).is_err());
}
