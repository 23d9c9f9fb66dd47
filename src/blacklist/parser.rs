use std::net::{IpAddr, Ipv4Addr};

use ipnet::{IpNet, Ipv4Net};

use super::error::{BlacklistError, BlacklistResult};
use super::types::{Classification, ParseMode};

/// A single recognized blacklist line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Address(IpAddr),
    /// Network range with host bits already cleared
    Range(IpNet),
}

/// Parse one trimmed line.
///
/// A line containing `/` is only ever tried as a network range, anything
/// else only as a single address. Ranges are accepted with host bits set
/// and normalized to their containing network.
pub fn parse_entry(line: &str) -> Option<Entry> {
    if line.contains('/') {
        parse_range(line).map(Entry::Range)
    } else {
        line.parse::<IpAddr>().ok().map(Entry::Address)
    }
}

fn parse_range(line: &str) -> Option<IpNet> {
    if let Ok(net) = line.parse::<IpNet>() {
        return Some(net.trunc());
    }

    // IPv4 netmask (10.0.0.0/255.0.0.0) or hostmask (10.0.0.0/0.255.255.255)
    let (addr, mask) = line.split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let mask: Ipv4Addr = mask.parse().ok()?;
    let prefix = ipnet::ipv4_mask_to_prefix(mask)
        .or_else(|_| ipnet::ipv4_mask_to_prefix(!mask))
        .ok()?;
    Ipv4Net::new(addr, prefix)
        .ok()
        .map(|net| IpNet::V4(net.trunc()))
}

/// Classify raw blacklist text, skipping malformed lines.
///
/// Skipped lines are available through [`Classification::discarded`].
pub fn classify(raw: &str) -> Classification {
    let mut classification = Classification::new();

    for (line_number, line) in entries(raw) {
        match parse_entry(line) {
            Some(Entry::Address(addr)) => classification.insert_address(addr),
            Some(Entry::Range(net)) => classification.insert_range(net),
            None => classification.discard(line_number, line),
        }
    }

    tracing::debug!(
        "Classified blacklist: {} addresses, {} ranges, {} lines discarded",
        classification.addresses().len(),
        classification.ranges().len(),
        classification.discarded().len()
    );

    classification
}

/// Classify raw blacklist text using the given parse mode
pub fn classify_with(raw: &str, mode: ParseMode) -> BlacklistResult<Classification> {
    if mode == ParseMode::Lenient {
        return Ok(classify(raw));
    }

    let mut classification = Classification::new();
    for (line_number, line) in entries(raw) {
        match parse_entry(line) {
            Some(Entry::Address(addr)) => classification.insert_address(addr),
            Some(Entry::Range(net)) => classification.insert_range(net),
            None => {
                return Err(BlacklistError::MalformedEntry {
                    line_number,
                    content: line.to_string(),
                });
            }
        }
    }

    Ok(classification)
}

/// Non-empty trimmed lines with their one-based line numbers
fn entries(raw: &str) -> impl Iterator<Item = (usize, &str)> {
    UniversalLines::new(raw)
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Line iterator that accepts every universal newline, with `\r\n` counted once
struct UniversalLines<'a> {
    rest: Option<&'a str>,
}

impl<'a> UniversalLines<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: Some(text) }
    }
}

impl<'a> Iterator for UniversalLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest.filter(|rest| !rest.is_empty())?;

        match rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((idx, c)) => {
                let mut next = idx + c.len_utf8();
                if c == '\r' && rest[next..].starts_with('\n') {
                    next += 1;
                }
                self.rest = Some(&rest[next..]);
                Some(&rest[..idx])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}
