//! Address families and the numeric universe each of them spans.
//!
//! Addresses of both families are carried as `u128`; the family decides how
//! many of those bits are meaningful.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// Number of bits in an address, which is also the longest valid prefix.
    pub const fn width(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// Highest address of the family, `2^width - 1`.
    pub const fn max_address(self) -> u128 {
        match self {
            AddressFamily::V4 => u32::MAX as u128,
            AddressFamily::V6 => u128::MAX,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }

    /// Parses dotted-quad (IPv4) or colon-hex (IPv6) notation.
    pub fn parse_address(self, text: &str) -> Result<u128> {
        match self {
            AddressFamily::V4 => parse_ipv4(text),
            AddressFamily::V6 => Ipv6Addr::from_str(text)
                .map(u128::from)
                .map_err(|_| Error::malformed(text)),
        }
    }

    /// Tries every family in turn and returns the first whose grammar accepts `text`.
    pub fn detect(text: &str) -> Result<(AddressFamily, u128)> {
        AddressFamily::ALL
            .iter()
            .find_map(|&family| family.parse_address(text).ok().map(|v| (family, v)))
            .ok_or_else(|| Error::malformed(text))
    }

    /// Size of a block with the given prefix length, `2^(width - prefix_len)`.
    ///
    /// Only the prefix is known here, so the `input` of an
    /// [`Error::InvalidPrefixLength`] is just `/prefix`. Parsers replace it
    /// with the whole token they were given.
    pub fn block_size(self, prefix_len: u8) -> Result<BlockSize> {
        if prefix_len > self.width() {
            return Err(Error::InvalidPrefixLength {
                input: format!("/{}", prefix_len),
                prefix: prefix_len.to_string(),
                family: self,
            });
        }
        Ok(BlockSize {
            bits: self.width() - prefix_len,
        })
    }

    /// Canonical text for `value`: dotted form for IPv4, RFC 5952 for IPv6.
    ///
    /// Bits above the family width are ignored.
    pub fn format_address(self, value: u128) -> String {
        match self {
            AddressFamily::V4 => Ipv4Addr::from(value as u32).to_string(),
            AddressFamily::V6 => Ipv6Addr::from(value).to_string(),
        }
    }
}

impl Display for AddressFamily {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A power-of-two number of addresses, kept as its exponent so that the
/// whole IPv6 space (`2^128`) stays representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockSize {
    bits: u8,
}

impl BlockSize {
    pub fn host_bits(self) -> u8 {
        self.bits
    }

    /// Mask covering the host part, i.e. `size - 1`.
    pub fn mask(self) -> u128 {
        host_mask(self.bits)
    }

    /// Number of addresses, `None` when it is `2^128`.
    pub fn count(self) -> Option<u128> {
        1u128.checked_shl(u32::from(self.bits))
    }
}

/// `2^bits - 1` without overflowing at 128 bits.
pub(crate) fn host_mask(bits: u8) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

fn parse_ipv4(text: &str) -> Result<u128> {
    lazy_static! {
        static ref RE: Regex = Regex::new(
            r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])$"
        )
        .expect("Not possible");
    }
    fn octet(ind: usize, v: &Captures<'_>, text: &str) -> Result<u128> {
        v.get(ind)
            .and_then(|r| r.as_str().parse::<u8>().ok())
            .map(u128::from)
            .ok_or_else(|| Error::malformed(text))
    }

    match RE.captures(text) {
        Some(ref v) => Ok((octet(1, v, text)? << 24)
            | (octet(2, v, text)? << 16)
            | (octet(3, v, text)? << 8)
            | octet(4, v, text)?),
        None => Err(Error::malformed(text)),
    }
}
