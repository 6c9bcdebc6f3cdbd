//! Merge IPv4 and IPv6 addresses, CIDR blocks and explicit ranges into the
//! smallest list of CIDR blocks covering exactly the same addresses.
//!
//! ```
//! let blocks = ipmerge::merge(["10.0.0.1", "10.0.0.2", "10.0.0.3"]).unwrap();
//! let text: Vec<String> = blocks.iter().map(|b| b.to_string()).collect();
//! assert_eq!(text, ["10.0.0.1/32", "10.0.0.2/31"]);
//! ```

pub mod cidr;
pub mod cli;
pub mod error;
pub mod family;
pub mod format;
pub mod merger;
pub mod parser;

pub use cidr::{decompose, CidrBlock, CidrDecomposer};
pub use error::{Error, Result};
pub use family::{AddressFamily, BlockSize};
pub use format::AddressStyle;
pub use merger::{merge_ranges, MergedSet, RangeMerger};
pub use parser::{parse_line, NumericRange, Parser};

use std::fmt::{self, Display, Formatter};

/// Parses every line and merges the result. Fails on the first bad line.
pub fn merge_lines<I, S>(parser: &Parser, lines: I) -> Result<MergedSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merger = RangeMerger::new();
    for line in lines {
        if let Some(range) = parser.parse_line(line.as_ref())? {
            merger.insert(range);
        }
    }
    Ok(merger.finish())
}

/// Minimal blocks for `lines`, IPv4 first, each family ascending.
pub fn merge<I, S>(lines: I) -> Result<Vec<CidrBlock>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(merge_lines(&Parser::new(), lines)?.all_blocks().collect())
}

/// Before/after counts of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub original: usize,
    pub merged: usize,
}

impl MergeSummary {
    pub fn decrease(&self) -> usize {
        self.original.saturating_sub(self.merged)
    }

    fn percent(&self, n: usize) -> String {
        let p = if self.original == 0 {
            0.0
        } else {
            n as f64 / self.original as f64 * 100.0
        };
        // two decimals at most, trailing zeros dropped: 25.0, 33.33
        let p = (p * 100.0).round() / 100.0;
        if p.fract() == 0.0 {
            format!("{:.1}", p)
        } else {
            p.to_string()
        }
    }
}

impl Display for MergeSummary {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Original block count: {}.", self.original)?;
        writeln!(
            f,
            "Merged block count: {} ({} %).",
            self.merged,
            self.percent(self.merged)
        )?;
        writeln!(
            f,
            "Decrease by: {} ({} %).",
            self.decrease(),
            self.percent(self.decrease())
        )
    }
}
