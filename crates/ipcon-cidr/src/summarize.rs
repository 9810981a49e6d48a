//! Range summarization
//!
//! Splits an inclusive address range into the fewest CIDR blocks whose union
//! is exactly that range. Each step emits the largest block that is aligned
//! at the cursor and still fits inside what is left of the range.

use crate::Cidr;
use ipcon_core::{Address, AddressRange};
use tracing::warn;

/// Summarize `[start, end]` into the minimal list of aligned CIDR blocks
///
/// Blocks come out in ascending order, pairwise disjoint. An empty list is
/// returned when `start > end`.
///
/// # Examples
///
/// ```
/// use ipcon_cidr::summarize;
///
/// let blocks: Vec<String> = summarize(0x0A000000, 0x0A000002)
///     .iter()
///     .map(|b| b.to_string())
///     .collect();
/// assert_eq!(blocks, vec!["10.0.0.0/31", "10.0.0.2/32"]);
/// ```
pub fn summarize(start: Address, end: Address) -> Vec<Cidr> {
    let mut blocks = Vec::new();
    if start > end {
        return blocks;
    }

    // u64 so the cursor can step past 255.255.255.255 without wrapping
    let end = u64::from(end);
    let mut cursor = u64::from(start);

    while cursor <= end {
        let bits = block_bits(cursor, end - cursor + 1);
        match Cidr::aligned(cursor as u32, (32 - bits) as u8) {
            Ok(block) => blocks.push(block),
            Err(e) => {
                warn!(error = %e, "summarize fell back to /32 blocks");
                blocks.extend(host_blocks(cursor, end));
                break;
            }
        }
        cursor += 1u64 << bits;
    }

    blocks
}

/// Summarize an [`AddressRange`]
pub fn summarize_range(range: AddressRange) -> Vec<Cidr> {
    summarize(range.start(), range.end())
}

/// log2 of the block size to emit at `cursor` with `remaining` addresses left
fn block_bits(cursor: u64, remaining: u64) -> u32 {
    let by_alignment = if cursor == 0 {
        32
    } else {
        cursor.trailing_zeros().min(32)
    };
    let by_remaining = 63 - remaining.leading_zeros();
    by_alignment.min(by_remaining)
}

/// One /32 per address in `[start, end]`
fn host_blocks(start: u64, end: u64) -> impl Iterator<Item = Cidr> {
    (start..=end).filter_map(|ip| Cidr::new(ip as u32, 32).ok())
}
