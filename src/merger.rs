//! Coalesces overlapping and adjacent ranges, one address family at a time.

use log::debug;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::cidr::{CidrBlock, CidrDecomposer};
use crate::family::AddressFamily;
use crate::parser::NumericRange;

/// Collects ranges of any family and merges them on [`RangeMerger::finish`].
#[derive(Debug, Default, Clone)]
pub struct RangeMerger {
    inner: BTreeMap<AddressFamily, Vec<NumericRange>>,
}

impl RangeMerger {
    pub fn new() -> Self {
        RangeMerger {
            inner: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, range: NumericRange) {
        self.inner.entry(range.family()).or_default().push(range);
    }

    /// Number of ranges inserted so far.
    pub fn len(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self) -> MergedSet {
        let inner = self
            .inner
            .into_iter()
            .map(|(family, ranges)| (family, merge_ranges(ranges)))
            .collect();
        MergedSet { inner }
    }
}

impl Extend<NumericRange> for RangeMerger {
    fn extend<T: IntoIterator<Item = NumericRange>>(&mut self, iter: T) {
        for range in iter {
            self.insert(range);
        }
    }
}

impl FromIterator<NumericRange> for RangeMerger {
    fn from_iter<T: IntoIterator<Item = NumericRange>>(iter: T) -> Self {
        let mut merger = RangeMerger::new();
        merger.extend(iter);
        merger
    }
}

/// Sweeps ranges of a single family into disjoint, non-adjacent ranges
/// sorted by start.
pub fn merge_ranges(mut ranges: Vec<NumericRange>) -> Vec<NumericRange> {
    ranges.sort_by_key(|r| (r.start(), r.end()));

    let mut merged: Vec<NumericRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(acc) = merged.last_mut() {
            // `end + 1` would overflow at the top of the IPv6 space.
            if range.start() <= acc.end() || range.start() - acc.end() == 1 {
                debug_assert_eq!(acc.family(), range.family());
                if range.end() > acc.end() {
                    let before = *acc;
                    acc.extend_to(range.end());
                    debug!("Merged {} and {} into {}.", before, range, acc);
                } else {
                    debug!("Merged {} into {}.", range, acc);
                }
                continue;
            }
        }
        merged.push(range);
    }
    merged
}

/// Disjoint, non-adjacent ranges per family, each list ascending by start.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergedSet {
    inner: BTreeMap<AddressFamily, Vec<NumericRange>>,
}

impl MergedSet {
    pub fn ranges(&self, family: AddressFamily) -> &[NumericRange] {
        self.inner.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Families present, IPv4 first.
    pub fn families(&self) -> impl Iterator<Item = AddressFamily> + '_ {
        self.inner.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values().all(Vec::is_empty)
    }

    /// Minimal CIDR blocks of one family, ascending.
    pub fn blocks(&self, family: AddressFamily) -> impl Iterator<Item = CidrBlock> + '_ {
        self.ranges(family)
            .iter()
            .flat_map(|r| CidrDecomposer::new(*r))
    }

    /// Minimal CIDR blocks of every family, IPv4 before IPv6.
    pub fn all_blocks(&self) -> impl Iterator<Item = CidrBlock> + '_ {
        self.inner
            .values()
            .flatten()
            .flat_map(|r| CidrDecomposer::new(*r))
    }
}

impl Display for MergedSet {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        for block in self.all_blocks() {
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use quickcheck_macros::quickcheck;

    fn ranges(lines: &[&str]) -> Vec<NumericRange> {
        lines
            .iter()
            .map(|l| parse_line(l).unwrap().unwrap())
            .collect()
    }

    fn merged(lines: &[&str]) -> Vec<String> {
        let set: MergedSet = RangeMerger::from_iter(ranges(lines)).finish();
        set.all_blocks().map(|b| b.to_string()).collect()
    }

    #[test]
    fn some_tests() {
        assert_eq!(merged(&["0.0.0.0/1", "128.0.0.0/1"]), ["0.0.0.0/0"]);
        assert_eq!(
            merged(&["0.0.0.0/1", "128.0.0.0/2", "192.0.0.0/2"]),
            ["0.0.0.0/0"]
        );
        assert_eq!(
            merged(&["4.0.0.0/8", "5.61.0.0/16", "6.0.0.0/7"]),
            ["4.0.0.0/8", "5.61.0.0/16", "6.0.0.0/7"]
        );
    }

    #[test]
    fn overlap_and_adjacency() {
        let out = merge_ranges(ranges(&[
            "10.0.0.10-10.0.0.20",
            "10.0.0.0-10.0.0.9",
            "10.0.0.15-10.0.0.30",
            "10.0.0.32-10.0.0.40",
            "10.0.0.12",
        ]));
        let bounds: Vec<_> = out.iter().map(|r| (r.start() & 0xFF, r.end() & 0xFF)).collect();
        assert_eq!(bounds, [(0, 30), (32, 40)]);
    }

    #[test]
    fn families_stay_apart() {
        let set = RangeMerger::from_iter(ranges(&[
            "::/96",
            "0.0.0.0/1",
            "0:0:0:0:0:1::/96",
            "128.0.0.0/1",
        ]))
        .finish();
        assert_eq!(set.families().collect::<Vec<_>>(), AddressFamily::ALL);
        assert_eq!(set.ranges(AddressFamily::V4).len(), 1);
        assert_eq!(set.ranges(AddressFamily::V6).len(), 1);
        assert_eq!(set.to_string(), "0.0.0.0/0\n::/95\n");
    }

    #[test]
    fn top_of_ipv6_space() {
        assert_eq!(
            merged(&[
                "ffff:ffff:ffff:ffff:ffff:ffff:ffff:fffe",
                "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff",
            ]),
            ["ffff:ffff:ffff:ffff:ffff:ffff:ffff:fffe/127"]
        );
        assert_eq!(merged(&["::/1", "8000::/1", "::1"]), ["::/0"]);
    }

    #[test]
    fn empty_input() {
        let set = RangeMerger::new().finish();
        assert!(set.is_empty());
        assert_eq!(set.all_blocks().count(), 0);
        assert!(merge_ranges(Vec::new()).is_empty());
    }

    fn v4_ranges(pairs: &[(u32, u32)]) -> Vec<NumericRange> {
        pairs
            .iter()
            .map(|&(a, b)| {
                NumericRange::new(AddressFamily::V4, u128::from(a.min(b)), u128::from(a.max(b)))
                    .unwrap()
            })
            .collect()
    }

    #[quickcheck]
    fn check_disjoint_sorted(pairs: Vec<(u32, u32)>) -> bool {
        let out = merge_ranges(v4_ranges(&pairs));
        out.windows(2).all(|w| w[1].start() > w[0].end() + 1)
    }

    #[quickcheck]
    fn check_coverage(pairs: Vec<(u8, u8)>, probe: u8) -> bool {
        // keep the numbers small so probes hit ranges often
        let pairs: Vec<(u32, u32)> = pairs
            .iter()
            .map(|&(a, b)| (u32::from(a), u32::from(b)))
            .collect();
        let input = v4_ranges(&pairs);
        let out = merge_ranges(input.clone());
        let probe = u128::from(probe);
        input.iter().any(|r| r.contains(probe)) == out.iter().any(|r| r.contains(probe))
    }

    #[quickcheck]
    fn check_order_independent(pairs: Vec<(u32, u32)>) -> bool {
        let forward = merge_ranges(v4_ranges(&pairs));
        let mut reversed = pairs.clone();
        reversed.reverse();
        forward == merge_ranges(v4_ranges(&reversed))
    }

    #[quickcheck]
    fn check_idempotent(pairs: Vec<(u32, u32)>) -> bool {
        let once = RangeMerger::from_iter(v4_ranges(&pairs)).finish();
        let again = RangeMerger::from_iter(once.all_blocks().map(|b| b.to_range())).finish();
        once == again
    }
}
