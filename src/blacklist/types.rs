use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

/// How the classifier treats lines that are neither an address nor a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip malformed lines and record them in [`Classification::discarded`]
    #[default]
    Lenient,
    /// Fail on the first malformed line
    Strict,
}

/// A non-empty line that was dropped during classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardedLine {
    /// One-based line number in the raw text
    pub line_number: usize,
    /// The line after whitespace trimming
    pub content: String,
}

/// Classified blacklist: single addresses and network ranges.
///
/// Addresses are kept in ascending order (every IPv4 address sorts before
/// every IPv6 address). Ranges are always stored with host bits cleared, so
/// `10.0.0.5/8` and `10.0.0.0/8` are the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    addresses: BTreeSet<IpAddr>,
    ranges: BTreeSet<IpNet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    discarded: Vec<DiscardedLine>,
}

impl Classification {
    /// Create an empty classification
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_address(&mut self, addr: IpAddr) {
        self.addresses.insert(addr);
    }

    pub(crate) fn insert_range(&mut self, net: IpNet) {
        self.ranges.insert(net.trunc());
    }

    pub(crate) fn discard(&mut self, line_number: usize, content: &str) {
        self.discarded.push(DiscardedLine {
            line_number,
            content: content.to_string(),
        });
    }

    /// Blocked single addresses in ascending order
    pub fn addresses(&self) -> impl ExactSizeIterator<Item = &IpAddr> + '_ {
        self.addresses.iter()
    }

    /// Blocked single addresses in their canonical text form, ascending
    pub fn address_strings(&self) -> Vec<String> {
        self.addresses.iter().map(ToString::to_string).collect()
    }

    /// Blocked network ranges, normalized to their network address
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = &IpNet> + '_ {
        self.ranges.iter()
    }

    /// Blocked network ranges in CIDR notation
    pub fn range_strings(&self) -> Vec<String> {
        self.ranges.iter().map(ToString::to_string).collect()
    }

    /// Lines dropped because they were neither an address nor a range
    pub fn discarded(&self) -> &[DiscardedLine] {
        &self.discarded
    }

    /// Total number of addresses and ranges
    pub fn len(&self) -> usize {
        self.addresses.len() + self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.ranges.is_empty()
    }

    /// Check if an address is listed directly or falls inside a listed range
    pub fn is_blocked(&self, addr: IpAddr) -> bool {
        self.addresses.contains(&addr) || self.ranges.iter().any(|net| net.contains(&addr))
    }
}
