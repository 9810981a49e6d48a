//! Address consolidation engine
//!
//! Turns lists of IPv4 addresses and CIDR blocks into:
//! - the minimal set of CIDR blocks covering exactly those addresses
//!   ([`consolidate`])
//! - the minimal set of CIDR blocks covering everything else
//!   ([`complement_of`])
//!
//! Lines that are neither an address nor a CIDR block are dropped without
//! an error. Every function here is pure; calls share no state.
//!
//! # Examples
//!
//! ```
//! use ipcon_engine::{complement_of, consolidate};
//!
//! let ranges = consolidate(["10.0.0.0", "10.0.0.1", "10.0.0.3"]);
//! assert_eq!(ranges, vec!["10.0.0.0/31", "10.0.0.3/32"]);
//!
//! let rest = complement_of(["0.0.0.0/1"]);
//! assert_eq!(rest, vec!["128.0.0.0/1"]);
//! ```

use ipcon_cidr::{summarize_range, Cidr};
use ipcon_core::AddressRange;
use tracing::debug;

mod complement;
mod merge;
mod parser;

pub use complement::{complement, gaps};
pub use merge::merge;
pub use parser::{parse, parse_block, ParsedToken};

/// Outcome of one consolidation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consolidation {
    /// Non-blank input lines
    pub original_count: usize,
    /// Lines that parsed as an address or CIDR block
    pub accepted: usize,
    /// Lines that were dropped
    pub rejected: usize,
    /// Minimal covering blocks, ascending
    pub ranges: Vec<Cidr>,
}

impl Consolidation {
    /// Ranges in `a.b.c.d/len` form
    pub fn range_strings(&self) -> Vec<String> {
        render(&self.ranges)
    }
}

/// Parsed ranges of all non-blank lines, plus line statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub ranges: Vec<AddressRange>,
    pub original_count: usize,
    pub rejected: usize,
}

/// Parse every non-blank line, keeping the ranges of accepted ones
pub fn parse_lines<I, S>(lines: I) -> ParsedInput
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut input = ParsedInput::default();

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        input.original_count += 1;
        match parse(line).range() {
            Some(range) => input.ranges.push(range),
            None => input.rejected += 1,
        }
    }

    input
}

/// Consolidate lines into a full [`Consolidation`] report
pub fn consolidate_report<I, S>(lines: I) -> Consolidation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input = parse_lines(lines);
    let accepted = input.original_count - input.rejected;
    let ranges: Vec<Cidr> = merge(input.ranges)
        .into_iter()
        .flat_map(summarize_range)
        .collect();

    debug!(
        lines = input.original_count,
        accepted,
        rejected = input.rejected,
        blocks = ranges.len(),
        "consolidated input"
    );

    Consolidation {
        original_count: input.original_count,
        accepted,
        rejected: input.rejected,
        ranges,
    }
}

/// Minimal CIDR blocks covering exactly the addresses in `lines`
pub fn consolidate_blocks<I, S>(lines: I) -> Vec<Cidr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    consolidate_report(lines).ranges
}

/// Minimal CIDR blocks covering exactly the addresses in `lines`, as strings
pub fn consolidate<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    render(&consolidate_blocks(lines))
}

/// Minimal CIDR blocks covering every address not in `lines`
pub fn complement_blocks<I, S>(lines: I) -> Vec<Cidr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input = parse_lines(lines);
    let merged = merge(input.ranges);
    let blocks = complement(&merged);

    debug!(
        lines = input.original_count,
        rejected = input.rejected,
        covered = merged.len(),
        blocks = blocks.len(),
        "computed complement"
    );

    blocks
}

/// Minimal CIDR blocks covering every address not in `lines`, as strings
pub fn complement_of<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    render(&complement_blocks(lines))
}

fn render(blocks: &[Cidr]) -> Vec<String> {
    blocks.iter().map(|b| b.to_string()).collect()
}
