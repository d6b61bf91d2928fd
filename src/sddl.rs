// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SDDL security-descriptor parser
//!
//! This module parses the Security Descriptor Definition Language strings
//! returned by `samba-tool ntacl get --as-sddl` using nom.
//!
//! The structured result is for display only: the raw SDDL string stays the
//! authoritative value, and callers fall back to it when a descriptor uses
//! syntax this parser does not cover.
//!
//! # Examples
//!
//! ```rust
//! use sambacar::sddl::parse_sddl;
//!
//! let descriptor = parse_sddl("O:LAG:DUD:P(A;OICI;FA;;;LA)").unwrap();
//! assert_eq!(descriptor.owner.as_deref(), Some("LA"));
//! assert_eq!(descriptor.dacl.len(), 1);
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1, take_while_m_n},
    character::complete::char,
    combinator::{opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// SDDL parse errors
#[derive(Debug, Error)]
pub enum SddlParseError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid ACE type: {0}")]
    InvalidAceType(String),

    #[error("Malformed ACE: {0}")]
    MalformedAce(String),

    #[error("Trailing input after descriptor: {0}")]
    TrailingInput(String),

    #[error("Incomplete input")]
    Incomplete,
}

pub type ParseResult<T> = Result<T, SddlParseError>;

/// Access decision carried by an ACE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AceAccessType {
    Allow,
    Deny,
    ObjectAllow,
    ObjectDeny,
    Audit,
    Alarm,
}

/// One access-control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ace {
    /// Allow/Deny/Audit decision
    pub access: AceAccessType,

    /// Inheritance flags (OI, CI, IO, NP, ID, SA, FA)
    pub flags: Vec<String>,

    /// Permission tokens (FA, FR, GR, ...); unknown hex masks are kept raw
    pub rights: Vec<String>,

    /// Object type GUID, for object ACEs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_guid: Option<String>,

    /// Inherited object type GUID, for object ACEs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_object_guid: Option<String>,

    /// SID or two-letter account alias the entry applies to
    pub trustee: String,
}

/// Parsed security descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityDescriptor {
    /// Owner SID or alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Primary group SID or alias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// DACL control flags (P, AR, AI)
    pub dacl_flags: Vec<String>,

    /// Discretionary ACL entries
    pub dacl: Vec<Ace>,

    /// SACL control flags
    pub sacl_flags: Vec<String>,

    /// System (audit) ACL entries
    pub sacl: Vec<Ace>,
}

// ========== Parser Primitives ==========

/// Parse a SID: S-1-<subauthorities>
fn sid(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        tag("S-1-"),
        take_while1(|c: char| c.is_ascii_digit() || c == '-'),
    ))(input)
}

/// Parse a two-letter SDDL account alias (LA, SY, BA, DU, WD, CO, ...)
fn alias(input: &str) -> IResult<&str, &str> {
    take_while_m_n(2, 2, |c: char| c.is_ascii_uppercase())(input)
}

/// Parse a trustee: SID or alias
fn trustee(input: &str) -> IResult<&str, &str> {
    alt((sid, alias))(input)
}

/// Parse ACL control flags preceding the first ACE: P, AR, AI
fn acl_flags(input: &str) -> IResult<&str, Vec<String>> {
    let (input, flags) = many0(alt((tag("AR"), tag("AI"), tag("P"))))(input)?;
    Ok((input, flags.iter().map(|f| f.to_string()).collect()))
}

/// Split a token string into two-character units ("OICI" -> ["OI", "CI"])
fn two_char_tokens(value: &str) -> Vec<String> {
    value
        .as_bytes()
        .chunks(2)
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect()
}

/// Well-known hex access masks with an SDDL token equivalent
fn decode_hex_mask(value: &str) -> Vec<String> {
    let mask = u32::from_str_radix(value.trim_start_matches("0x"), 16).ok();
    match mask {
        Some(0x001f_01ff) => vec!["FA".to_string()],
        Some(0x0012_0089) => vec!["FR".to_string()],
        Some(0x0012_0116) => vec!["FW".to_string()],
        Some(0x0012_00a0) => vec!["FX".to_string()],
        // Unknown mask stays raw so nothing is fabricated
        _ => vec![value.to_string()],
    }
}

/// Parse rights: either a hex mask or concatenated two-letter tokens
fn rights_tokens(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else if value.starts_with("0x") || value.starts_with("0X") {
        decode_hex_mask(value)
    } else {
        two_char_tokens(value)
    }
}

fn ace_access_type(token: &str) -> Option<AceAccessType> {
    match token {
        "A" => Some(AceAccessType::Allow),
        "D" => Some(AceAccessType::Deny),
        "OA" => Some(AceAccessType::ObjectAllow),
        "OD" => Some(AceAccessType::ObjectDeny),
        "AU" => Some(AceAccessType::Audit),
        "AL" => Some(AceAccessType::Alarm),
        _ => None,
    }
}

/// Parse one ACE: (type;flags;rights;object_guid;inherit_guid;trustee)
fn ace(input: &str) -> IResult<&str, Ace> {
    let (input, body) = delimited(char('('), take_until(")"), char(')'))(input)?;

    let fields: Vec<&str> = body.split(';').collect();
    if fields.len() != 6 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let access = match ace_access_type(fields[0]) {
        Some(access) => access,
        None => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )))
        }
    };

    let optional = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };

    Ok((
        input,
        Ace {
            access,
            flags: two_char_tokens(fields[1]),
            rights: rights_tokens(fields[2]),
            object_guid: optional(fields[3]),
            inherit_object_guid: optional(fields[4]),
            trustee: fields[5].to_string(),
        },
    ))
}

/// Parse an ACL section body: flags followed by zero or more ACEs
fn acl_body(input: &str) -> IResult<&str, (Vec<String>, Vec<Ace>)> {
    pair(acl_flags, many0(ace))(input)
}

fn descriptor(input: &str) -> IResult<&str, SecurityDescriptor> {
    let (input, owner) = opt(preceded(tag("O:"), trustee))(input)?;
    let (input, group) = opt(preceded(tag("G:"), trustee))(input)?;
    let (input, dacl) = opt(preceded(tag("D:"), acl_body))(input)?;
    let (input, sacl) = opt(preceded(tag("S:"), acl_body))(input)?;

    let (dacl_flags, dacl) = dacl.unwrap_or_default();
    let (sacl_flags, sacl) = sacl.unwrap_or_default();

    Ok((
        input,
        SecurityDescriptor {
            owner: owner.map(str::to_string),
            group: group.map(str::to_string),
            dacl_flags,
            dacl,
            sacl_flags,
            sacl,
        },
    ))
}

/// Parse a complete SDDL string
///
/// All four sections (O:, G:, D:, S:) are optional, but a string yielding
/// none of them is rejected rather than silently producing an empty
/// descriptor.
pub fn parse_sddl(input: &str) -> ParseResult<SecurityDescriptor> {
    let trimmed = input.trim();

    match descriptor(trimmed) {
        Ok((rest, parsed)) => {
            if !rest.is_empty() {
                return Err(SddlParseError::TrailingInput(rest.to_string()));
            }
            if parsed.owner.is_none()
                && parsed.group.is_none()
                && parsed.dacl.is_empty()
                && parsed.sacl.is_empty()
            {
                return Err(SddlParseError::ParseError(
                    "no recognizable SDDL sections".to_string(),
                ));
            }
            Ok(parsed)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(SddlParseError::ParseError(format!("Parse failed: {:?}", e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(SddlParseError::Incomplete),
    }
}
