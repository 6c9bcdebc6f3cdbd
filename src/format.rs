//! Text rendering of merged blocks.

use std::io::{self, Write};
use std::net::Ipv6Addr;

use crate::cidr::CidrBlock;
use crate::family::AddressFamily;
use crate::merger::MergedSet;

/// Written between the IPv4 and the IPv6 group.
const GROUP_SEPARATOR: &str = "\n\n\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressStyle {
    /// Dotted quad, RFC 5952 compressed IPv6.
    #[default]
    Compressed,
    /// Every IPv6 group written out with four hex digits.
    Exploded,
}

pub fn format_address(family: AddressFamily, value: u128, style: AddressStyle) -> String {
    match (family, style) {
        (AddressFamily::V6, AddressStyle::Exploded) => Ipv6Addr::from(value)
            .segments()
            .iter()
            .map(|s| format!("{:04x}", s))
            .collect::<Vec<_>>()
            .join(":"),
        _ => family.format_address(value),
    }
}

pub fn format_block(block: &CidrBlock, style: AddressStyle) -> String {
    format!(
        "{}/{}",
        format_address(block.family(), block.base(), style),
        block.prefix()
    )
}

/// Writes one block per line, IPv4 group first. Returns the number of blocks.
pub fn write_blocks<W: Write>(
    out: &mut W,
    set: &MergedSet,
    style: AddressStyle,
) -> io::Result<usize> {
    let mut count = 0;
    for (i, family) in set.families().enumerate() {
        if i > 0 {
            out.write_all(GROUP_SEPARATOR.as_bytes())?;
        }
        for block in set.blocks(family) {
            writeln!(out, "{}", format_block(&block, style))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Output lines, one per block, without group separators.
pub fn render_lines(set: &MergedSet, style: AddressStyle) -> Vec<String> {
    set.all_blocks().map(|b| format_block(&b, style)).collect()
}
