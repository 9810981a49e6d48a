//! Core types for IPCON (IP consolidation calculator)
//!
//! This crate provides the foundational types used throughout the IPCON workspace:
//! - [`Address`] - IPv4 address as a 32-bit integer
//! - [`AddressRange`] - Inclusive range of addresses
//! - [`IpconError`] - Error types
//! - [`config::Config`] - Environment configuration
//!
//! ```
//! use ipcon_core::{parse_address, AddressRange};
//!
//! let start = parse_address("10.0.0.0").unwrap();
//! let range = AddressRange::new(start, start + 255).unwrap();
//! assert_eq!(range.len(), 256);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

pub mod config;

/// IPv4 address as an unsigned 32-bit integer
pub type Address = u32;

/// Highest address in the IPv4 space (255.255.255.255)
pub const MAX_ADDRESS: Address = u32::MAX;

/// Number of addresses in the IPv4 space (2^32)
pub const ADDRESS_SPACE_SIZE: u64 = 1u64 << 32;

/// Parse a dotted-quad IPv4 address into an [`Address`]
///
/// Leading/trailing whitespace is not accepted here; callers trim lines first.
///
/// # Examples
///
/// ```
/// use ipcon_core::parse_address;
///
/// assert_eq!(parse_address("8.8.8.8").unwrap(), 0x08080808);
/// assert!(parse_address("256.0.0.1").is_err());
/// ```
pub fn parse_address(ip: &str) -> Result<Address> {
    ip.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| IpconError::InvalidAddress(ip.to_string()))
}

/// Format an [`Address`] as a dotted quad
pub fn format_address(ip: Address) -> String {
    Ipv4Addr::from(ip).to_string()
}

/// Inclusive range of IPv4 addresses `[start, end]`
///
/// Invariant: `start <= end`. The only way to build one is through
/// [`AddressRange::new`] or [`AddressRange::single`], which enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressRange {
    start: Address,
    end: Address,
}

impl AddressRange {
    /// Create a new range
    ///
    /// Returns [`IpconError::InvalidRange`] when `start > end`.
    pub fn new(start: Address, end: Address) -> Result<Self> {
        if start > end {
            return Err(IpconError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range holding exactly one address
    pub fn single(ip: Address) -> Self {
        Self { start: ip, end: ip }
    }

    /// The whole IPv4 space, `0.0.0.0 - 255.255.255.255`
    pub fn full() -> Self {
        Self {
            start: 0,
            end: MAX_ADDRESS,
        }
    }

    /// First address
    pub fn start(&self) -> Address {
        self.start
    }

    /// Last address
    pub fn end(&self) -> Address {
        self.end
    }

    /// Number of addresses in the range (at most 2^32)
    pub fn len(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }

    /// Ranges always hold at least one address
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if an address falls inside this range
    pub fn contains(&self, ip: Address) -> bool {
        self.start <= ip && ip <= self.end
    }

    /// Check if two ranges overlap or sit directly next to each other
    pub fn touches(&self, other: &Self) -> bool {
        u64::from(other.start) <= u64::from(self.end) + 1
            && u64::from(self.start) <= u64::from(other.end) + 1
    }

    /// Smallest range spanning both
    pub fn cover(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            Ipv4Addr::from(self.start),
            Ipv4Addr::from(self.end)
        )
    }
}

/// Error types for IPCON operations
#[derive(Error, Debug)]
pub enum IpconError {
    /// Invalid IP address
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// Range with start after end
    #[error("Invalid range: start {} is after end {}", format_address(*.start), format_address(*.end))]
    InvalidRange { start: Address, end: Address },
}

/// Result type alias for IPCON operations
pub type Result<T> = std::result::Result<T, IpconError>;
