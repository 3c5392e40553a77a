//! ICE candidate parsing and relay classification
//!
//! Candidates arrive as SDP attribute lines; classification only needs
//! their structured fields, in particular the candidate type.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Network-path candidate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    /// Local interface address.
    Host,
    /// Server-reflexive address discovered through STUN.
    Srflx,
    /// Peer-reflexive address learned during checks.
    Prflx,
    /// Address allocated on the TURN relay.
    Relay,
}

impl FromStr for CandidateType {
    type Err = CandidateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Self::Host),
            "srflx" => Ok(Self::Srflx),
            "prflx" => Ok(Self::Prflx),
            "relay" => Ok(Self::Relay),
            other => Err(CandidateParseError::UnknownType {
                typ: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Host => "host",
            Self::Srflx => "srflx",
            Self::Prflx => "prflx",
            Self::Relay => "relay",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CandidateParseError {
    #[error("Not a candidate attribute line: {line}")]
    NotACandidate { line: String },

    #[error("Truncated candidate line: {line}")]
    Truncated { line: String },

    #[error("Invalid field {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unknown candidate type: {typ}")]
    UnknownType { typ: String },
}

/// Structured projection of one discovered network path. Transient:
/// collected during gathering, discarded after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub foundation: String,
    pub component: u16,
    pub protocol: String,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    pub typ: CandidateType,
}

impl FromStr for Candidate {
    type Err = CandidateParseError;

    /// Parses `[a=]candidate:<foundation> <component> <protocol>
    /// <priority> <address> <port> typ <type> ...`; trailing extension
    /// attributes (raddr, rport, tcptype, ...) are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let trimmed = line.trim();
        let body = trimmed
            .strip_prefix("a=")
            .unwrap_or(trimmed)
            .strip_prefix("candidate:")
            .ok_or_else(|| CandidateParseError::NotACandidate {
                line: line.to_string(),
            })?;

        let parts: Vec<&str> = body.split_whitespace().collect();
        if parts.len() < 8 || parts[6] != "typ" {
            return Err(CandidateParseError::Truncated {
                line: line.to_string(),
            });
        }

        let component = parts[1]
            .parse()
            .map_err(|_| CandidateParseError::InvalidField {
                field: "component",
                value: parts[1].to_string(),
            })?;
        let priority = parts[3]
            .parse()
            .map_err(|_| CandidateParseError::InvalidField {
                field: "priority",
                value: parts[3].to_string(),
            })?;
        let port = parts[5]
            .parse()
            .map_err(|_| CandidateParseError::InvalidField {
                field: "port",
                value: parts[5].to_string(),
            })?;

        Ok(Self {
            foundation: parts[0].to_string(),
            component,
            protocol: parts[2].to_ascii_lowercase(),
            priority,
            address: parts[4].to_string(),
            port,
            typ: parts[7].parse()?,
        })
    }
}

/// Success ⇔ at least one discovered path traversed the relay.
pub fn relay_reachable(candidates: &[Candidate]) -> bool {
    candidates.iter().any(|c| c.typ == CandidateType::Relay)
}
