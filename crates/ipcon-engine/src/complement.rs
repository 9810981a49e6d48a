//! Complement calculation
//!
//! Finds every address in `0.0.0.0 - 255.255.255.255` not covered by a set of
//! merged ranges and summarizes the gaps into CIDR blocks.

use ipcon_cidr::{summarize_range, Cidr};
use ipcon_core::{AddressRange, MAX_ADDRESS};

/// Uncovered ranges between and around `merged`
///
/// `merged` must be sorted and non-overlapping, as returned by
/// [`merge`](crate::merge).
pub fn gaps(merged: &[AddressRange]) -> Vec<AddressRange> {
    let mut gaps = Vec::with_capacity(merged.len() + 1);
    // u64 so that end + 1 past 255.255.255.255 does not wrap
    let mut next_free: u64 = 0;

    for range in merged {
        let start = u64::from(range.start());
        if next_free < start {
            gaps.extend(AddressRange::new(next_free as u32, range.start() - 1).ok());
        }
        next_free = next_free.max(u64::from(range.end()) + 1);
    }

    if next_free <= u64::from(MAX_ADDRESS) {
        gaps.extend(AddressRange::new(next_free as u32, MAX_ADDRESS).ok());
    }

    gaps
}

/// CIDR blocks covering everything `merged` does not
///
/// # Examples
///
/// ```
/// use ipcon_core::AddressRange;
/// use ipcon_engine::complement;
///
/// let lower_half = AddressRange::new(0, 0x7FFFFFFF).unwrap();
/// let blocks = complement(&[lower_half]);
/// assert_eq!(blocks[0].to_string(), "128.0.0.0/1");
/// ```
pub fn complement(merged: &[AddressRange]) -> Vec<Cidr> {
    gaps(merged).into_iter().flat_map(summarize_range).collect()
}
