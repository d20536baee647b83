// crates/infra-harness-core/src/core/facts.rs
// ============================================================================
// Module: Resource Facts
// Description: Structured security group facts and CIDR containment.
// Purpose: Answer "is port P reachable from CIDR X" over collected facts.
// Dependencies: serde, std::net
// ============================================================================

//! ## Overview
//! The cloud-fact collaborator returns [`SecurityGroupFacts`]; reachability is
//! evaluated locally so every backend shares one rule:
//! - protocol `-1` (all traffic) covers every port;
//! - protocol `tcp`/`6` covers ports inside `[from_port, to_port]`;
//! - a rule CIDR admits the queried CIDR when it contains it (same address
//!   family, shorter or equal prefix, equal network bits).
//!
//! Rule CIDRs that fail to parse never match. A malformed queried CIDR is an
//! error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CIDR Blocks
// ============================================================================

/// Parsed IPv4 or IPv6 CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    /// Network address as written (host bits are ignored when comparing).
    address: IpAddr,
    /// Prefix length in bits.
    prefix: u8,
}

impl CidrBlock {
    /// Returns the address as written.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Returns true when `other` lies entirely inside this block.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let mine = self.bits();
        let theirs = other.bits();
        if mine.1 != theirs.1 || self.prefix > other.prefix {
            return false;
        }
        let mask = prefix_mask(self.prefix, mine.1);
        (mine.0 & mask) == (theirs.0 & mask)
    }

    /// Returns the address as an integer with its family width in bits.
    fn bits(&self) -> (u128, u8) {
        match self.address {
            IpAddr::V4(v4) => (u128::from(u32::from(v4)), 32),
            IpAddr::V6(v6) => (u128::from(v6), 128),
        }
    }
}

/// Builds a left-aligned mask of `prefix` bits inside a `width`-bit address.
fn prefix_mask(prefix: u8, width: u8) -> u128 {
    if prefix == 0 {
        return 0;
    }
    let full = if width == 128 { u128::MAX } else { (1_u128 << width) - 1 };
    let host_bits = u32::from(width - prefix);
    full & !((1_u128 << host_bits) - 1)
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CidrError::Empty);
        }
        let (addr_part, prefix_part) = match trimmed.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (trimmed, None),
        };
        let address: IpAddr =
            addr_part.parse().map_err(|_| CidrError::InvalidAddress(trimmed.to_string()))?;
        let width: u8 = if address.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix_part {
            Some(value) => value
                .parse::<u8>()
                .map_err(|_| CidrError::InvalidPrefix(trimmed.to_string()))?,
            None => width,
        };
        if prefix > width {
            return Err(CidrError::InvalidPrefix(trimmed.to_string()));
        }
        Ok(Self {
            address,
            prefix,
        })
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

/// CIDR parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    /// Empty input.
    #[error("cidr must not be empty")]
    Empty,
    /// Address portion is not an IP address.
    #[error("invalid cidr address: {0}")]
    InvalidAddress(String),
    /// Prefix portion is missing, non-numeric, or too long.
    #[error("invalid cidr prefix: {0}")]
    InvalidPrefix(String),
}

// ============================================================================
// SECTION: Security Groups
// ============================================================================

/// One ingress permission of a security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// IP protocol (`tcp`, `udp`, `icmp`, protocol number, or `-1` for all).
    pub protocol: String,
    /// First port of the range, when the protocol has ports.
    #[serde(default)]
    pub from_port: Option<i32>,
    /// Last port of the range, when the protocol has ports.
    #[serde(default)]
    pub to_port: Option<i32>,
    /// Source CIDR blocks (IPv4 and IPv6).
    #[serde(default)]
    pub cidrs: Vec<String>,
}

impl IngressRule {
    /// Returns true when the rule admits TCP traffic on `port`.
    #[must_use]
    pub fn covers_port(&self, port: u16) -> bool {
        let protocol = self.protocol.trim().to_ascii_lowercase();
        if protocol == "-1" || protocol == "all" {
            return true;
        }
        if protocol != "tcp" && protocol != "6" {
            return false;
        }
        let (Some(from), Some(to)) = (self.from_port, self.to_port) else {
            return false;
        };
        let port = i32::from(port);
        from <= port && port <= to
    }

    /// Returns true when one of the rule's CIDRs contains `source`.
    #[must_use]
    pub fn admits(&self, source: &CidrBlock) -> bool {
        self.cidrs
            .iter()
            .filter_map(|raw| raw.parse::<CidrBlock>().ok())
            .any(|block| block.contains(source))
    }
}

/// Facts collected about one security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupFacts {
    /// Security group identifier.
    pub group_id: String,
    /// Owning VPC identifier.
    pub vpc_id: String,
    /// Ingress permissions.
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
}

impl SecurityGroupFacts {
    /// Returns true when some ingress rule admits `cidr` on TCP `port`.
    ///
    /// # Errors
    ///
    /// Returns [`CidrError`] when `cidr` is not a valid CIDR block.
    pub fn is_port_open_to_cidr(&self, port: u16, cidr: &str) -> Result<bool, CidrError> {
        let source: CidrBlock = cidr.parse()?;
        Ok(self.ingress.iter().any(|rule| rule.covers_port(port) && rule.admits(&source)))
    }
}
