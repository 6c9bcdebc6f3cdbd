use std::fmt::Display;
use std::fmt::Error as FmtError;
use std::fmt::Formatter;
use std::str::FromStr;

use log::trace;

use crate::error::Error;
use crate::family::{host_mask, AddressFamily};
use crate::parser::NumericRange;

/// An aligned block `base/prefix`.
///
/// `base` never has host bits set: [`CidrBlock::new`] masks them away, the
/// same way `10.1.2.3/8` denotes `10.0.0.0/8`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct CidrBlock {
    family: AddressFamily,
    base: u128,
    size: u8,
}

impl CidrBlock {
    /// Fails like [`AddressFamily::block_size`] when `prefix` exceeds the width.
    pub fn new(family: AddressFamily, net: u128, prefix: u8) -> Result<Self, Error> {
        let size = family.block_size(prefix)?.host_bits();
        let base = net & family.max_address() & !host_mask(size);
        Ok(CidrBlock { family, base, size })
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn base(&self) -> u128 {
        self.base
    }

    pub fn prefix(&self) -> u8 {
        self.family.width() - self.size
    }

    pub fn first(&self) -> u128 {
        self.base
    }

    pub fn last(&self) -> u128 {
        self.base | host_mask(self.size)
    }

    pub fn contains_address(&self, address: u128) -> bool {
        self.first() <= address && address <= self.last()
    }

    pub fn contains_block(&self, other: &CidrBlock) -> bool {
        self.family == other.family && self.size >= other.size && self.contains_address(other.base)
    }

    pub fn to_range(&self) -> NumericRange {
        NumericRange::from_block(self.family, self.first(), self.last())
    }
}

impl FromStr for CidrBlock {
    type Err = Error;

    /// Reads `address/prefix`; a bare address is a single-host block.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (address, prefix) = match s.split_once('/') {
            Some((a, p)) => (a.trim(), Some(p.trim())),
            None => (s, None),
        };
        let (family, net) = AddressFamily::detect(address).map_err(|_| Error::malformed(s))?;
        let prefix = match prefix {
            Some(p) => p.parse::<u8>().map_err(|_| Error::InvalidPrefixLength {
                input: s.to_owned(),
                prefix: p.to_owned(),
                family,
            })?,
            None => family.width(),
        };
        CidrBlock::new(family, net, prefix).map_err(|e| match e {
            Error::InvalidPrefixLength { prefix, family, .. } => Error::InvalidPrefixLength {
                input: s.to_owned(),
                prefix,
                family,
            },
            e => e,
        })
    }
}

impl Display for CidrBlock {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(
            f,
            "{}/{}",
            self.family.format_address(self.base),
            self.prefix()
        )
    }
}

/// Splits a range into the fewest aligned blocks, lowest block first.
///
/// Each step takes the largest block that both starts aligned at the cursor
/// and still fits in what is left of the range.
#[derive(Debug, Clone)]
pub struct CidrDecomposer {
    family: AddressFamily,
    cursor: u128,
    end: u128,
    done: bool,
}

impl CidrDecomposer {
    pub fn new(range: NumericRange) -> Self {
        CidrDecomposer {
            family: range.family(),
            cursor: range.start(),
            end: range.end(),
            done: false,
        }
    }
}

impl Iterator for CidrDecomposer {
    type Item = CidrBlock;

    fn next(&mut self) -> Option<CidrBlock> {
        if self.done {
            return None;
        }
        let width = self.family.width();
        let by_alignment = (self.cursor.trailing_zeros() as u8).min(width);
        // `remaining` is the count minus one, so 2^128 addresses never overflow.
        let remaining = self.end - self.cursor;
        let by_remaining = match remaining.checked_add(1) {
            Some(count) => (127 - count.leading_zeros()) as u8,
            None => 128,
        };
        let bits = by_alignment.min(by_remaining);
        let block = CidrBlock {
            family: self.family,
            base: self.cursor,
            size: bits,
        };
        trace!("emit {}", block);

        let last = block.last();
        if last >= self.end {
            self.done = true;
        } else {
            self.cursor = last + 1;
        }
        Some(block)
    }
}

pub fn decompose(range: NumericRange) -> Vec<CidrBlock> {
    CidrDecomposer::new(range).collect()
}
