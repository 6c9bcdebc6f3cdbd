//! Turns one input line into a [`NumericRange`].
//!
//! Three notations are accepted, tried in this order:
//!
//! * `address/prefix`, the address is masked down to its block unless the
//!   parser is strict,
//! * `first-last`, both ends inclusive,
//! * a single `address`.
//!
//! Anything after a `#` is a comment. Lines that are empty once the comment
//! is removed yield `Ok(None)`.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};
use crate::family::AddressFamily;

/// Closed interval `[start, end]` of addresses of one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericRange {
    family: AddressFamily,
    start: u128,
    end: u128,
}

impl NumericRange {
    /// Returns `None` when `start > end` or either bound lies outside the family.
    pub fn new(family: AddressFamily, start: u128, end: u128) -> Option<Self> {
        if start > end || end > family.max_address() {
            return None;
        }
        Some(NumericRange { family, start, end })
    }

    /// Bounds of an aligned block, already known to be ordered and in range.
    pub(crate) fn from_block(family: AddressFamily, start: u128, end: u128) -> Self {
        NumericRange { family, start, end }
    }

    pub fn single(family: AddressFamily, address: u128) -> Option<Self> {
        NumericRange::new(family, address, address)
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn start(&self) -> u128 {
        self.start
    }

    pub fn end(&self) -> u128 {
        self.end
    }

    pub fn contains(&self, address: u128) -> bool {
        self.start <= address && address <= self.end
    }

    /// Number of addresses minus one, so the full IPv6 space does not overflow.
    pub fn span(&self) -> u128 {
        self.end - self.start
    }

    pub(crate) fn extend_to(&mut self, end: u128) {
        self.end = self.end.max(end);
    }
}

impl Display for NumericRange {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.family.format_address(self.start),
            self.family.format_address(self.end)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parser {
    strict: bool,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    /// Reject `address/prefix` inputs whose address has host bits set.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn parse_line(&self, line: &str) -> Result<Option<NumericRange>> {
        let token = strip_comment(line).trim();
        if token.is_empty() {
            return Ok(None);
        }
        self.parse_token(token).map(Some)
    }

    fn parse_token(&self, token: &str) -> Result<NumericRange> {
        lazy_static! {
            static ref CIDR: Regex =
                Regex::new(r"^([^/]+)/\s*([+-]?[0-9]+)$").expect("Not possible");
            static ref RANGE: Regex = Regex::new(r"^([^-]+)-([^-]+)$").expect("Not possible");
        }

        if let Some(v) = CIDR.captures(token) {
            return self.parse_cidr(token, v[1].trim(), &v[2]);
        }
        if let Some(v) = RANGE.captures(token) {
            return parse_range(token, v[1].trim(), v[2].trim());
        }
        let (family, address) = AddressFamily::detect(token)?;
        NumericRange::single(family, address).ok_or_else(|| Error::malformed(token))
    }

    fn parse_cidr(&self, token: &str, address: &str, prefix: &str) -> Result<NumericRange> {
        let (family, address) =
            AddressFamily::detect(address).map_err(|_| Error::malformed(token))?;
        let invalid_prefix = || Error::InvalidPrefixLength {
            input: token.to_owned(),
            prefix: prefix.to_owned(),
            family,
        };
        let prefix_len = prefix
            .parse::<i64>()
            .ok()
            .and_then(|p| u8::try_from(p).ok())
            .ok_or_else(invalid_prefix)?;
        let mask = family
            .block_size(prefix_len)
            .map_err(|_| invalid_prefix())?
            .mask();
        if self.strict && address & mask != 0 {
            return Err(Error::UnalignedNetwork {
                input: token.to_owned(),
                prefix: prefix_len,
            });
        }
        NumericRange::new(family, address & !mask, address | mask)
            .ok_or_else(|| Error::malformed(token))
    }
}

fn parse_range(token: &str, first: &str, last: &str) -> Result<NumericRange> {
    let (first_family, first) = AddressFamily::detect(first).map_err(|_| Error::malformed(token))?;
    let (last_family, last) = AddressFamily::detect(last).map_err(|_| Error::malformed(token))?;
    if first_family != last_family {
        return Err(Error::InvalidRange {
            input: token.to_owned(),
            reason: format!("mixes {} and {} endpoints", first_family, last_family),
        });
    }
    NumericRange::new(first_family, first, last).ok_or_else(|| Error::InvalidRange {
        input: token.to_owned(),
        reason: "first address is greater than last address".to_owned(),
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parses `line` with the default, non-strict parser.
pub fn parse_line(line: &str) -> Result<Option<NumericRange>> {
    Parser::new().parse_line(line)
}
