//! Address parser
//!
//! Turns one line of input into an address, the range of a CIDR block, or a
//! rejection. Rejections carry no detail; callers simply skip them.

use ipcon_cidr::Cidr;
use ipcon_core::{parse_address, Address, AddressRange};
use tracing::debug;

/// Result of interpreting one line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedToken {
    /// A single dotted-quad address
    Address(Address),
    /// Range spanned by a CIDR literal
    Range(AddressRange),
    /// Anything that is neither
    Rejected,
}

impl ParsedToken {
    /// Range covered by this token, if any
    pub fn range(&self) -> Option<AddressRange> {
        match *self {
            ParsedToken::Address(ip) => Some(AddressRange::single(ip)),
            ParsedToken::Range(range) => Some(range),
            ParsedToken::Rejected => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ParsedToken::Rejected)
    }
}

/// Parse one line of input
///
/// Surrounding whitespace is ignored. CIDR literals may carry host bits,
/// which are masked off (`10.0.0.7/24` covers `10.0.0.0 - 10.0.0.255`).
///
/// # Examples
///
/// ```
/// use ipcon_engine::{parse, ParsedToken};
///
/// assert_eq!(parse("8.8.8.8"), ParsedToken::Address(0x08080808));
/// assert!(parse("not-an-ip").is_rejected());
/// ```
pub fn parse(token: &str) -> ParsedToken {
    let token = token.trim();

    if token.contains('/') {
        match Cidr::parse(token) {
            Ok(cidr) => ParsedToken::Range(cidr.range()),
            Err(e) => {
                debug!(token, error = %e, "rejected CIDR token");
                ParsedToken::Rejected
            }
        }
    } else {
        match parse_address(token) {
            Ok(ip) => ParsedToken::Address(ip),
            Err(e) => {
                debug!(token, error = %e, "rejected address token");
                ParsedToken::Rejected
            }
        }
    }
}

/// Parse one line as a CIDR block; a bare address becomes a /32
pub fn parse_block(token: &str) -> Option<Cidr> {
    let token = token.trim();

    if token.contains('/') {
        Cidr::parse(token).ok()
    } else {
        parse_address(token)
            .ok()
            .and_then(|ip| Cidr::new(ip, 32).ok())
    }
}
