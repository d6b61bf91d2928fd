// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Request validation
//!
//! Field syntax checks that run before any samba-tool command is built.
//! A failed check is a 400; no external command is issued for it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::types::ApiError;

lazy_static! {
    /// sAMAccountName syntax: leading alphanumeric, then dots, dashes,
    /// underscores; 64 characters max
    static ref USERNAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("username regex");

    /// Group names additionally allow embedded spaces ("Domain Admins")
    static ref GROUP_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]{0,63}$").expect("group name regex");

    /// IPv4 CIDR with octet range check and mandatory prefix length
    static ref CIDR_RE: Regex = Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.){3}(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])/(3[0-2]|[12]?[0-9])$"
    )
    .expect("cidr regex");

    /// Windows security identifier
    static ref SID_RE: Regex = Regex::new(r"^S-1-\d+(-\d+){1,14}$").expect("sid regex");

    /// Organizational unit distinguished name; must lead with an OU RDN
    static ref OU_DN_RE: Regex =
        Regex::new(r"^(?i)OU=[^,=]+(,(OU|DC)=[^,=]+)*$").expect("ou dn regex");

    /// DNS zone / domain name
    static ref ZONE_NAME_RE: Regex = Regex::new(
        r"^[A-Za-z0-9_]([A-Za-z0-9_-]*[A-Za-z0-9_])?(\.[A-Za-z0-9_]([A-Za-z0-9_-]*[A-Za-z0-9_])?)*$"
    )
    .expect("zone name regex");

    /// DNS record owner name: @ for the apex or a relative/absolute name
    static ref RECORD_NAME_RE: Regex =
        Regex::new(r"^(@|[A-Za-z0-9_][A-Za-z0-9._-]*)$").expect("record name regex");

    /// Kerberos service principal name: service/host with optional port
    static ref SPN_RE: Regex =
        Regex::new(r"^[A-Za-z0-9_-]+/[A-Za-z0-9._-]+(:\d{1,5})?$").expect("spn regex");

    /// Site names follow the same syntax as RDN values without commas
    static ref SITE_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("site name regex");
}

/// DNS record types accepted by the record endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DnsRecordType {
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    PTR,
    SOA,
    SRV,
    TXT,
}

impl DnsRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsRecordType::A => "A",
            DnsRecordType::AAAA => "AAAA",
            DnsRecordType::CNAME => "CNAME",
            DnsRecordType::MX => "MX",
            DnsRecordType::NS => "NS",
            DnsRecordType::PTR => "PTR",
            DnsRecordType::SOA => "SOA",
            DnsRecordType::SRV => "SRV",
            DnsRecordType::TXT => "TXT",
        }
    }
}

impl FromStr for DnsRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(DnsRecordType::A),
            "AAAA" => Ok(DnsRecordType::AAAA),
            "CNAME" => Ok(DnsRecordType::CNAME),
            "MX" => Ok(DnsRecordType::MX),
            "NS" => Ok(DnsRecordType::NS),
            "PTR" => Ok(DnsRecordType::PTR),
            "SOA" => Ok(DnsRecordType::SOA),
            "SRV" => Ok(DnsRecordType::SRV),
            "TXT" => Ok(DnsRecordType::TXT),
            other => Err(format!("Unknown DNS record type: {}", other)),
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_username(name: &str) -> Result<(), ApiError> {
    if USERNAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid account name: {}",
            name
        )))
    }
}

pub fn validate_group_name(name: &str) -> Result<(), ApiError> {
    if GROUP_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid group name: {}",
            name
        )))
    }
}

pub fn validate_subnet(subnet: &str) -> Result<(), ApiError> {
    if CIDR_RE.is_match(subnet) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid subnet, expected CIDR notation (e.g. 192.168.1.0/24): {}",
            subnet
        )))
    }
}

pub fn validate_sid(sid: &str) -> Result<(), ApiError> {
    if SID_RE.is_match(sid) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!("Invalid SID: {}", sid)))
    }
}

pub fn validate_ou_dn(dn: &str) -> Result<(), ApiError> {
    if OU_DN_RE.is_match(dn) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid organizational unit DN, expected OU=...: {}",
            dn
        )))
    }
}

pub fn validate_zone_name(zone: &str) -> Result<(), ApiError> {
    if zone.len() <= 253 && ZONE_NAME_RE.is_match(zone) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid zone name: {}",
            zone
        )))
    }
}

pub fn validate_record_name(name: &str) -> Result<(), ApiError> {
    if RECORD_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid record name: {}",
            name
        )))
    }
}

pub fn validate_spn(spn: &str) -> Result<(), ApiError> {
    if SPN_RE.is_match(spn) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid service principal name, expected service/host[:port]: {}",
            spn
        )))
    }
}

pub fn validate_site_name(name: &str) -> Result<(), ApiError> {
    if SITE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "Invalid site name: {}",
            name
        )))
    }
}

/// Record data validation mirrors the type-specific checks samba-tool itself
/// applies, failing fast on the obvious cases
pub fn validate_record_data(record_type: DnsRecordType, data: &str) -> Result<(), ApiError> {
    if data.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Record data cannot be empty".to_string(),
        ));
    }

    match record_type {
        DnsRecordType::A => {
            data.parse::<std::net::Ipv4Addr>().map_err(|_| {
                ApiError::InvalidRequest(format!("Invalid IPv4 address: {}", data))
            })?;
        }
        DnsRecordType::AAAA => {
            data.parse::<std::net::Ipv6Addr>().map_err(|_| {
                ApiError::InvalidRequest(format!("Invalid IPv6 address: {}", data))
            })?;
        }
        // MX is "priority host", SRV is "target port priority weight"; both
        // free-form enough that samba-tool is the authority
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_valid() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("svc-web.01").is_ok());
    }

    #[test]
    fn test_username_invalid() {
        assert!(validate_username("").is_err());
        assert!(validate_username("alice; rm -rf /").is_err());
        assert!(validate_username(".leadingdot").is_err());
    }

    #[test]
    fn test_group_name_allows_spaces() {
        assert!(validate_group_name("Domain Admins").is_ok());
        assert!(validate_group_name("IT Staff").is_ok());
        assert!(validate_group_name(" leading space").is_err());
    }

    #[test]
    fn test_subnet_valid() {
        assert!(validate_subnet("192.168.1.0/24").is_ok());
        assert!(validate_subnet("10.0.0.0/8").is_ok());
    }

    #[test]
    fn test_subnet_rejects_missing_mask() {
        assert!(validate_subnet("192.168.1.0").is_err());
    }

    #[test]
    fn test_subnet_rejects_bad_octet() {
        assert!(validate_subnet("999.1.1.0/24").is_err());
        assert!(validate_subnet("192.168.1.256/24").is_err());
    }

    #[test]
    fn test_subnet_rejects_bad_prefix() {
        assert!(validate_subnet("192.168.1.0/33").is_err());
        assert!(validate_subnet("192.168.1.0/").is_err());
    }

    #[test]
    fn test_sid() {
        assert!(validate_sid("S-1-5-21-3623811015-3361044348-30300820-1013").is_ok());
        assert!(validate_sid("S-1-5").is_err());
        assert!(validate_sid("1-5-21").is_err());
    }

    #[test]
    fn test_ou_dn() {
        assert!(validate_ou_dn("OU=Sales,DC=samdom,DC=example,DC=com").is_ok());
        assert!(validate_ou_dn("OU=Nested,OU=Sales,DC=samdom,DC=com").is_ok());
        assert!(validate_ou_dn("CN=Users,DC=samdom,DC=com").is_err());
        assert!(validate_ou_dn("Sales").is_err());
    }

    #[test]
    fn test_zone_name() {
        assert!(validate_zone_name("samdom.example.com").is_ok());
        assert!(validate_zone_name("1.168.192.in-addr.arpa").is_ok());
        assert!(validate_zone_name("bad..zone").is_err());
        assert!(validate_zone_name("-bad.example.com").is_err());
    }

    #[test]
    fn test_record_name() {
        assert!(validate_record_name("@").is_ok());
        assert!(validate_record_name("www").is_ok());
        assert!(validate_record_name("_ldap._tcp").is_ok());
        assert!(validate_record_name("bad name").is_err());
    }

    #[test]
    fn test_spn_syntax() {
        assert!(validate_spn("HTTP/web01.samdom.example.com:8080").is_ok());
        assert!(validate_spn("HOST/fileserver").is_ok());
        assert!(validate_spn("no-slash").is_err());
        assert!(validate_spn("HTTP/host:notaport").is_err());
    }

    #[test]
    fn test_record_type_round_trip() {
        for name in ["A", "AAAA", "CNAME", "MX", "NS", "PTR", "SOA", "SRV", "TXT"] {
            let rt: DnsRecordType = name.parse().unwrap();
            assert_eq!(rt.as_str(), name);
        }
        assert!("SPF".parse::<DnsRecordType>().is_err());
    }

    #[test]
    fn test_record_data_by_type() {
        assert!(validate_record_data(DnsRecordType::A, "192.0.2.1").is_ok());
        assert!(validate_record_data(DnsRecordType::A, "not-an-ip").is_err());
        assert!(validate_record_data(DnsRecordType::AAAA, "2001:db8::1").is_ok());
        assert!(validate_record_data(DnsRecordType::AAAA, "192.0.2.1").is_err());
        assert!(validate_record_data(DnsRecordType::TXT, "v=spf1 -all").is_ok());
        assert!(validate_record_data(DnsRecordType::CNAME, "").is_err());
    }
}
