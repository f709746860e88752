//! # Address-Table Parser
//!
//! Reads the output of `arp -n -a`. We stick to the BSD format so that it works on macOS and
//! Linux without platform switching; the interesting part of a line is the same on both:
//!
//! ```text
//! ? (169.254.201.244) at 00:3e:e1:c7:3b:26 [ether] on eth0
//! ? (169.254.46.250) at dc:a6:32:19:1d:88 on en1 [ethernet]
//! ```
//!
//! Parsing is a filter, not a validation: lines that do not have this shape, that carry a
//! non-IPv4 address, or whose MAC prefix is not accepted simply produce no record.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use descry_common::network::mac::{HardwareAddress, VendorPrefix};
use descry_common::network::record::AddressRecord;
use regex::Regex;
use tracing::trace;

use crate::vendors::VendorRegistry;

// BSD `arp` prints octets without their leading zero, so each field is 1-2 digits.
const LINE_PATTERN: &str =
    r"(?im)^\S+ \((?P<ip>[^)]+)\) at (?P<mac>(?:[0-9a-f]{1,2}:){5}[0-9a-f]{1,2})(?:[ \t\r]|$)";

enum PrefixFilter {
    Any,
    Accepted(HashSet<VendorPrefix>),
}

impl PrefixFilter {
    fn accepts(&self, prefix: &VendorPrefix) -> bool {
        match self {
            PrefixFilter::Any => true,
            PrefixFilter::Accepted(prefixes) => prefixes.contains(prefix),
        }
    }
}

pub struct AddressTableParser {
    line_re: Regex,
    filter: PrefixFilter,
    registry: Option<VendorRegistry>,
}

impl AddressTableParser {
    /// A parser keeping only hardware addresses whose first three octets are in `accepted`.
    pub fn new(accepted: impl IntoIterator<Item = VendorPrefix>) -> Self {
        Self::build(PrefixFilter::Accepted(accepted.into_iter().collect()), None)
    }

    /// A parser keeping the registry's prefixes and tagging each record with its model.
    pub fn classifying(registry: &VendorRegistry) -> Self {
        Self::build(
            PrefixFilter::Accepted(registry.known_prefixes().into_iter().collect()),
            Some(registry.clone()),
        )
    }

    /// A parser keeping every well-formed line.
    pub fn unfiltered() -> Self {
        Self::build(PrefixFilter::Any, None)
    }

    fn build(filter: PrefixFilter, registry: Option<VendorRegistry>) -> Self {
        Self {
            line_re: Regex::new(LINE_PATTERN).expect("neighbor line pattern is valid"),
            filter,
            registry,
        }
    }

    /// Extracts records in input order. Duplicates are kept; the inventory sorts them out.
    pub fn parse_table(&self, raw: &str) -> Vec<AddressRecord> {
        if let PrefixFilter::Accepted(prefixes) = &self.filter {
            if prefixes.is_empty() {
                return Vec::new();
            }
        }

        self.line_re
            .captures_iter(raw)
            .filter_map(|caps| {
                let hardware_address: HardwareAddress = caps["mac"].parse().ok()?;
                if !self.filter.accepts(&hardware_address.prefix()) {
                    return None;
                }
                let Ok(ip_address) = caps["ip"].parse::<Ipv4Addr>() else {
                    trace!("Ignoring {hardware_address}: '{}' is not IPv4", &caps["ip"]);
                    return None;
                };

                let record = AddressRecord::new(hardware_address, ip_address);
                Some(match &self.registry {
                    Some(registry) => record.with_model(registry.classify(hardware_address.prefix())),
                    None => record,
                })
            })
            .collect()
    }
}

/// One-shot form of [`AddressTableParser::parse_table`] for an explicit prefix list.
pub fn parse_table(raw: &str, accepted: &[VendorPrefix]) -> Vec<AddressRecord> {
    AddressTableParser::new(accepted.iter().copied()).parse_table(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
? (169.254.201.244) at 00:3e:e1:c7:3b:26 [ether] on eth0
? (169.254.46.250) at dc:a6:32:19:1d:88 on en1 [ethernet]
router.lan (192.168.1.1) at 0:11:22:33:44:55 on en0 ifscope [ethernet]
? (192.168.1.50) at b8:27:eb:1:2:3 on en0 ifscope [ethernet]
? (192.168.1.51) at (incomplete) on en0 ifscope [ethernet]
? (192.168.1.52) at B8:27:EB:AA:BB:CC [ether] on eth0
";

    fn prefixes(list: &[&str]) -> Vec<VendorPrefix> {
        list.iter().map(|p| p.parse().unwrap()).collect()
    }

    fn mac(s: &str) -> HardwareAddress {
        s.parse().unwrap()
    }

    #[test]
    fn parse_table_should_keep_accepted_prefixes_in_order() {
        let records = parse_table(TABLE, &prefixes(&["B8:27:EB", "DC:A6:32"]));
        assert_eq!(
            records,
            vec![
                AddressRecord::new(mac("DC:A6:32:19:1D:88"), Ipv4Addr::new(169, 254, 46, 250)),
                AddressRecord::new(mac("B8:27:EB:01:02:03"), Ipv4Addr::new(192, 168, 1, 50)),
                AddressRecord::new(mac("B8:27:EB:AA:BB:CC"), Ipv4Addr::new(192, 168, 1, 52)),
            ]
        );
    }

    #[test]
    fn parse_table_should_canonicalize_single_digit_octets() {
        let records = parse_table("? (10.0.0.9) at b8:27:eb:1:a:f on en0\n", &prefixes(&["B8:27:EB"]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hardware_address.to_string(), "B8:27:EB:01:0A:0F");
    }

    #[test]
    fn parse_table_should_ignore_crlf_line_endings() {
        let raw = "? (192.168.1.50) at b8:27:eb:11:22:33 on en0 [ethernet]\r\n? (192.168.1.51) at b8:27:eb:1:a:f\r\n";
        let records = parse_table(raw, &prefixes(&["B8:27:EB"]));
        assert_eq!(
            records,
            vec![
                AddressRecord::new(mac("B8:27:EB:11:22:33"), Ipv4Addr::new(192, 168, 1, 50)),
                AddressRecord::new(mac("B8:27:EB:01:0A:0F"), Ipv4Addr::new(192, 168, 1, 51)),
            ]
        );
    }

    #[test]
    fn parse_table_should_drop_unaccepted_lines_however_malformed() {
        let raw = "\
? (not-an-ip) at 00:11:22:33:44:55 on en0
garbage at (()) b8:27:eb
? (192.168.1.7) at b8:27:eb:01:02:03:04 on en0
? (192.168.1.8) at b8:27:eb:01:02:345 on en0
";
        assert!(parse_table(raw, &prefixes(&["B8:27:EB"])).is_empty());
    }

    #[test]
    fn parse_table_should_drop_non_ipv4_addresses() {
        let raw = "? (fe80::1) at b8:27:eb:01:02:03 on en0\n";
        assert!(parse_table(raw, &prefixes(&["B8:27:EB"])).is_empty());
    }

    #[test]
    fn parse_table_should_preserve_duplicates() {
        let raw = "\
? (192.168.1.50) at b8:27:eb:11:22:33 on en0
? (192.168.1.99) at b8:27:eb:11:22:33 on en1
";
        let records = parse_table(raw, &prefixes(&["B8:27:EB"]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hardware_address, records[1].hardware_address);
    }

    #[test]
    fn parse_table_should_match_nothing_with_empty_prefixes() {
        assert!(parse_table(TABLE, &[]).is_empty());
    }

    #[test]
    fn classifying_parser_should_attach_models() {
        let registry = VendorRegistry::builtin();
        let records = AddressTableParser::classifying(&registry).parse_table(TABLE);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.model.as_deref() == Some("Raspberry Pi")));
    }

    #[test]
    fn unfiltered_parser_should_keep_every_well_formed_line() {
        let records = AddressTableParser::unfiltered().parse_table(TABLE);
        assert_eq!(records.len(), 5);
        assert_eq!(records[2].hardware_address, mac("00:11:22:33:44:55"));
        assert!(records.iter().all(|r| r.model.is_none()));
    }
}
