//! CIDR blocks, subnet details and range summarization
//!
//! Provides utilities for working with CIDR notation:
//! - Parse CIDR notation (e.g., "192.168.0.0/24"), host bits are masked off
//! - Subnet facts (netmask, broadcast, usable hosts, address class)
//! - Summarize an arbitrary address range into minimal aligned blocks
//!
//! # Examples
//!
//! ```
//! use ipcon_cidr::{summarize, Cidr};
//!
//! let cidr = Cidr::parse("192.168.1.7/24").unwrap();
//! assert_eq!(cidr.prefix_len(), 24);
//! assert_eq!(cidr.network(), 0xC0A80100); // 192.168.1.0
//! assert!(cidr.contains(0xC0A80101)); // 192.168.1.1
//!
//! let blocks = summarize(0, 255);
//! assert_eq!(blocks, vec![Cidr::parse("0.0.0.0/24").unwrap()]);
//! ```

use ipcon_core::{format_address, Address, AddressRange, ADDRESS_SPACE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

mod summarize;

pub use summarize::{summarize, summarize_range};

/// CIDR errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CidrError {
    /// Invalid CIDR notation
    #[error("Invalid CIDR notation: {0}")]
    InvalidNotation(String),

    /// Invalid IP address
    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// Invalid prefix length
    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    /// Base address has bits set below the prefix
    #[error("Base {} is not aligned to a /{prefix_len} block", format_address(*.base))]
    Misaligned { base: Address, prefix_len: u8 },
}

pub type Result<T> = std::result::Result<T, CidrError>;

/// Netmask for a prefix length; `prefix_len` must be at most 32
fn prefix_mask(prefix_len: u8) -> u32 {
    u32::MAX
        .checked_shl(32 - u32::from(prefix_len))
        .unwrap_or(0)
}

/// Classful address class, by first octet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressClass {
    A,
    B,
    C,
    D,
    E,
}

impl AddressClass {
    /// Class of an address
    pub fn of(ip: Address) -> Self {
        match ip >> 24 {
            0..=127 => AddressClass::A,
            128..=191 => AddressClass::B,
            192..=223 => AddressClass::C,
            224..=239 => AddressClass::D,
            _ => AddressClass::E,
        }
    }
}

impl fmt::Display for AddressClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressClass::A => "A",
            AddressClass::B => "B",
            AddressClass::C => "C",
            AddressClass::D => "D",
            AddressClass::E => "E",
        };
        f.write_str(name)
    }
}

/// CIDR block representation
///
/// Invariant: `network` is a multiple of the block size, i.e. no bits are
/// set below the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cidr {
    /// Network address (base IP)
    network: u32,
    /// Prefix length (0-32)
    prefix_len: u8,
    /// Network mask
    mask: u32,
}

impl Cidr {
    /// Parse CIDR notation string
    ///
    /// Host bits in the address are masked off, so `10.1.2.3/8` parses
    /// as `10.0.0.0/8`. The part after `/` may be a prefix length, a dotted
    /// netmask (`255.255.255.0`) or a dotted hostmask (`0.0.0.255`).
    ///
    /// # Arguments
    ///
    /// * `cidr` - CIDR string (e.g., "192.168.1.0/24")
    ///
    /// # Examples
    ///
    /// ```
    /// use ipcon_cidr::Cidr;
    ///
    /// let cidr = Cidr::parse("10.0.0.0/8").unwrap();
    /// assert_eq!(cidr.prefix_len(), 8);
    ///
    /// let cidr = Cidr::parse("10.9.9.9/255.255.0.0").unwrap();
    /// assert_eq!(cidr.to_string(), "10.9.0.0/16");
    /// ```
    pub fn parse(cidr: &str) -> Result<Self> {
        let (ip_str, prefix_str) = cidr.split_once('/').ok_or_else(|| {
            CidrError::InvalidNotation("Expected format: x.x.x.x/prefix".to_string())
        })?;

        let prefix_len = Self::parse_prefix(prefix_str)?;
        let ip = Self::parse_ipv4(ip_str)?;

        Self::new(ip, prefix_len)
    }

    /// Parse the part after `/`
    fn parse_prefix(prefix: &str) -> Result<u8> {
        if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            return match prefix.parse::<u8>() {
                Ok(len) if len <= 32 => Ok(len),
                Ok(len) => Err(CidrError::InvalidPrefixLength(len)),
                Err(_) => Err(CidrError::InvalidNotation(format!(
                    "Invalid prefix: {}",
                    prefix
                ))),
            };
        }

        let mask = prefix
            .parse::<Ipv4Addr>()
            .map(u32::from)
            .map_err(|_| CidrError::InvalidNotation(format!("Invalid prefix: {}", prefix)))?;

        // netmask: leading ones followed by zeros
        if mask.leading_ones() + mask.trailing_zeros() == 32 {
            return Ok(mask.leading_ones() as u8);
        }
        // hostmask: leading zeros followed by ones
        if mask.leading_zeros() + mask.trailing_ones() == 32 {
            return Ok(mask.leading_zeros() as u8);
        }

        Err(CidrError::InvalidNotation(format!(
            "Non-contiguous mask: {}",
            prefix
        )))
    }

    /// Parse IPv4 address string to u32
    fn parse_ipv4(ip: &str) -> Result<u32> {
        ip.parse::<Ipv4Addr>()
            .map(u32::from)
            .map_err(|_| CidrError::InvalidIpAddress(ip.to_string()))
    }

    /// Create new CIDR from an address and prefix length
    ///
    /// Bits of `network` below the prefix are cleared.
    ///
    /// # Arguments
    ///
    /// * `network` - Any address inside the block, as u32
    /// * `prefix_len` - Prefix length (0-32)
    pub fn new(network: u32, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(CidrError::InvalidPrefixLength(prefix_len));
        }

        let mask = prefix_mask(prefix_len);

        Ok(Self {
            network: network & mask,
            prefix_len,
            mask,
        })
    }

    /// Create new CIDR whose base must already be aligned to its size
    ///
    /// Unlike [`Cidr::new`], a base with host bits set is an error.
    pub fn aligned(base: u32, prefix_len: u8) -> Result<Self> {
        let cidr = Self::new(base, prefix_len)?;
        if cidr.network != base {
            return Err(CidrError::Misaligned { base, prefix_len });
        }
        Ok(cidr)
    }

    /// Get network address
    pub fn network(&self) -> u32 {
        self.network
    }

    /// Get prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Get network mask
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Get host mask (inverse of the network mask)
    pub fn hostmask(&self) -> u32 {
        !self.mask
    }

    /// Get broadcast address
    pub fn broadcast(&self) -> u32 {
        self.network | !self.mask
    }

    /// Get first usable IP (network + 1)
    pub fn first_usable(&self) -> u32 {
        if self.prefix_len >= 31 {
            self.network
        } else {
            self.network + 1
        }
    }

    /// Get last usable IP (broadcast - 1)
    pub fn last_usable(&self) -> u32 {
        if self.prefix_len >= 31 {
            self.broadcast()
        } else {
            self.broadcast() - 1
        }
    }

    /// Get total number of IPs in this CIDR block
    pub fn size(&self) -> u64 {
        ADDRESS_SPACE_SIZE >> self.prefix_len
    }

    /// Number of usable hosts
    ///
    /// /31 and /32 blocks have no network/broadcast reservation.
    pub fn usable_hosts(&self) -> u64 {
        match self.prefix_len {
            32 => 1,
            31 => 2,
            _ => self.size() - 2,
        }
    }

    /// Classful address class of the network address
    pub fn address_class(&self) -> AddressClass {
        AddressClass::of(self.network)
    }

    /// Netmask as dotted binary octets, e.g. `11111111.11111111.11111111.00000000`
    pub fn binary_netmask(&self) -> String {
        self.mask
            .to_be_bytes()
            .iter()
            .map(|octet| format!("{:08b}", octet))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Check if IP address is in this CIDR block
    ///
    /// # Arguments
    ///
    /// * `ip` - IP address as u32
    pub fn contains(&self, ip: u32) -> bool {
        (ip & self.mask) == self.network
    }

    /// Address range covered by this block
    pub fn range(&self) -> AddressRange {
        // network <= broadcast always holds
        AddressRange::new(self.network, self.broadcast())
            .unwrap_or_else(|_| AddressRange::single(self.network))
    }

    /// Subnet report for this block
    pub fn details(&self) -> SubnetDetails {
        SubnetDetails {
            cidr: self.to_string(),
            first_ip: format_address(self.first_usable()),
            last_ip: format_address(self.last_usable()),
            total_hosts: self.usable_hosts(),
            network: format_address(self.network),
            broadcast: format_address(self.broadcast()),
            netmask: format_address(self.mask),
            class: self.address_class(),
        }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.network), self.prefix_len)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Subnet facts for a single block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetDetails {
    pub cidr: String,
    #[serde(rename = "firstIP")]
    pub first_ip: String,
    #[serde(rename = "lastIP")]
    pub last_ip: String,
    #[serde(rename = "totalHosts")]
    pub total_hosts: u64,
    pub network: String,
    pub broadcast: String,
    pub netmask: String,
    pub class: AddressClass,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_cidr() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert_eq!(cidr.network(), 0xC0A80100);
        assert_eq!(cidr.prefix_len(), 24);
    }

    #[test]
    fn test_parse_cidr_slash_8() {
        let cidr = Cidr::parse("10.0.0.0/8").unwrap();
        assert_eq!(cidr.network(), 0x0A000000);
        assert_eq!(cidr.prefix_len(), 8);
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let cidr = Cidr::parse("192.168.1.77/24").unwrap();
        assert_eq!(cidr.network(), 0xC0A80100);
        assert_eq!(cidr.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_parse_netmask_and_hostmask() {
        let cidr = Cidr::parse("172.16.5.4/255.240.0.0").unwrap();
        assert_eq!(cidr.to_string(), "172.16.0.0/12");

        let cidr = Cidr::parse("172.16.5.4/0.0.0.255").unwrap();
        assert_eq!(cidr.to_string(), "172.16.5.0/24");

        assert_eq!(Cidr::parse("1.2.3.4/0.0.0.0").unwrap().prefix_len(), 0);
        assert_eq!(Cidr::parse("1.2.3.4/255.255.255.255").unwrap().prefix_len(), 32);
    }

    #[test]
    fn test_parse_invalid_cidr() {
        assert!(Cidr::parse("192.168.1.0").is_err());
        assert!(Cidr::parse("192.168.1.0/33").is_err());
        assert!(Cidr::parse("256.0.0.0/24").is_err());
        assert!(Cidr::parse("10.0.0.0/").is_err());
        assert!(Cidr::parse("10.0.0.0/+8").is_err());
        assert!(Cidr::parse("10.0.0.0/8/8").is_err());
        assert!(Cidr::parse("10.0.0.0/255.0.255.0").is_err());
        assert_eq!(
            Cidr::parse("10.0.0.0/40"),
            Err(CidrError::InvalidPrefixLength(40))
        );
    }

    #[test]
    fn test_aligned() {
        assert!(Cidr::aligned(0x0A000000, 8).is_ok());
        assert_eq!(
            Cidr::aligned(0x0A000001, 8),
            Err(CidrError::Misaligned {
                base: 0x0A000001,
                prefix_len: 8
            })
        );
    }

    #[test]
    fn test_cidr_contains() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert!(cidr.contains(0xC0A80100)); // 192.168.1.0
        assert!(cidr.contains(0xC0A80101)); // 192.168.1.1
        assert!(cidr.contains(0xC0A801FF)); // 192.168.1.255
        assert!(!cidr.contains(0xC0A80001)); // 192.168.0.1
        assert!(!cidr.contains(0xC0A80200)); // 192.168.2.0
    }

    #[test]
    fn test_cidr_broadcast() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert_eq!(cidr.broadcast(), 0xC0A801FF); // 192.168.1.255
        assert_eq!(cidr.hostmask(), 0x000000FF);
    }

    #[test]
    fn test_cidr_usable_range() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert_eq!(cidr.first_usable(), 0xC0A80101); // 192.168.1.1
        assert_eq!(cidr.last_usable(), 0xC0A801FE); // 192.168.1.254
        assert_eq!(cidr.usable_hosts(), 254);
    }

    #[test]
    fn test_cidr_size() {
        assert_eq!(Cidr::parse("192.168.1.0/24").unwrap().size(), 256);
        assert_eq!(Cidr::parse("192.168.0.0/16").unwrap().size(), 65536);
        assert_eq!(Cidr::parse("10.0.0.0/8").unwrap().size(), 16777216);
        assert_eq!(Cidr::parse("0.0.0.0/0").unwrap().size(), ADDRESS_SPACE_SIZE);
        assert_eq!(Cidr::parse("0.0.0.0/32").unwrap().size(), 1);
    }

    #[test]
    fn test_cidr_slash_0() {
        let cidr = Cidr::parse("8.8.8.8/0").unwrap();
        assert_eq!(cidr.network(), 0);
        assert_eq!(cidr.mask(), 0);
        assert_eq!(cidr.broadcast(), u32::MAX);
        assert_eq!(cidr.usable_hosts(), (1u64 << 32) - 2);
    }

    #[test]
    fn test_cidr_slash_31() {
        let cidr = Cidr::parse("10.0.0.4/31").unwrap();
        assert_eq!(cidr.first_usable(), 0x0A000004);
        assert_eq!(cidr.last_usable(), 0x0A000005);
        assert_eq!(cidr.usable_hosts(), 2);
    }

    #[test]
    fn test_cidr_slash_32() {
        let cidr = Cidr::parse("192.168.1.1/32").unwrap();
        assert_eq!(cidr.size(), 1);
        assert_eq!(cidr.first_usable(), 0xC0A80101);
        assert_eq!(cidr.last_usable(), 0xC0A80101);
        assert_eq!(cidr.usable_hosts(), 1);
    }

    #[test]
    fn test_address_class() {
        assert_eq!(AddressClass::of(0x0A000000), AddressClass::A);
        assert_eq!(AddressClass::of(0x7F000001), AddressClass::A);
        assert_eq!(AddressClass::of(0xAC100000), AddressClass::B);
        assert_eq!(AddressClass::of(0xC0A80000), AddressClass::C);
        assert_eq!(AddressClass::of(0xE0000001), AddressClass::D);
        assert_eq!(AddressClass::of(0xF0000000), AddressClass::E);
        assert_eq!(AddressClass::of(u32::MAX).to_string(), "E");
    }

    #[test]
    fn test_binary_netmask() {
        let cidr = Cidr::parse("10.0.0.0/20").unwrap();
        assert_eq!(
            cidr.binary_netmask(),
            "11111111.11111111.11110000.00000000"
        );
    }

    #[test]
    fn test_cidr_display() {
        let cidr = Cidr::parse("192.168.1.0/24").unwrap();
        assert_eq!(cidr.to_string(), "192.168.1.0/24");
        assert_eq!("192.168.1.0/24".parse::<Cidr>().unwrap(), cidr);
    }

    #[test]
    fn test_cidr_new() {
        let cidr = Cidr::new(0xC0A80100, 24).unwrap();
        assert_eq!(cidr.network(), 0xC0A80100);
        assert_eq!(cidr.prefix_len(), 24);
        assert!(Cidr::new(0, 33).is_err());
    }

    #[test]
    fn test_cidr_range() {
        let range = Cidr::parse("10.0.0.0/30").unwrap().range();
        assert_eq!(range.start(), 0x0A000000);
        assert_eq!(range.end(), 0x0A000003);
    }

    #[test]
    fn test_details_serialization() {
        let details = Cidr::parse("192.168.1.0/24").unwrap().details();
        let json = serde_json::to_value(&details).expect("serialization failed");
        assert_eq!(json["cidr"], "192.168.1.0/24");
        assert_eq!(json["firstIP"], "192.168.1.1");
        assert_eq!(json["lastIP"], "192.168.1.254");
        assert_eq!(json["totalHosts"], 254);
        assert_eq!(json["netmask"], "255.255.255.0");
        assert_eq!(json["class"], "C");
    }

    proptest! {
        #[test]
        fn parse_masks_any_address(ip in any::<u32>(), len in 0u8..=32) {
            let text = format!("{}/{}", Ipv4Addr::from(ip), len);
            let cidr = Cidr::parse(&text).unwrap();
            prop_assert!(cidr.contains(ip));
            prop_assert_eq!(u64::from(cidr.network()) % cidr.size(), 0);
        }
    }
}
