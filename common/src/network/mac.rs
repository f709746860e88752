//! **Medium Access Control (MAC)** address types.
//!
//! The first three octets of a MAC address are the **Organizationally unique identifier**
//! handed out by the IEEE Registration Authority, which is how a board's maker (and thus its
//! model) is recognised on the wire.

use std::fmt;
use std::str::FromStr;

use pnet::util::MacAddr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacParseError {
    #[error("expected {expected} colon-separated octets in '{input}', found {found}")]
    OctetCount {
        input: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid octet '{octet}' in '{input}'")]
    InvalidOctet { input: String, octet: String },
}

/// A six octet hardware address, displayed as upper-case two-digit octets (`B8:27:EB:01:02:03`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HardwareAddress([u8; 6]);

impl HardwareAddress {
    /// The vendor-identifying half of the address.
    pub fn prefix(&self) -> VendorPrefix {
        VendorPrefix([self.0[0], self.0[1], self.0[2]])
    }
}

impl FromStr for HardwareAddress {
    type Err = MacParseError;

    /// Accepts one or two hex digits per octet, in any case, since `arp` on BSD drops
    /// leading zeros (`b8:27:eb:3:a:1f`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(parse_octets::<6>(s)?))
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl From<MacAddr> for HardwareAddress {
    fn from(mac: MacAddr) -> Self {
        Self([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5])
    }
}

impl From<HardwareAddress> for MacAddr {
    fn from(addr: HardwareAddress) -> Self {
        let [a, b, c, d, e, g] = addr.0;
        MacAddr::new(a, b, c, d, e, g)
    }
}

// Stored as the canonical string so it can key a JSON object.
impl Serialize for HardwareAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HardwareAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The first three octets of a [`HardwareAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VendorPrefix([u8; 3]);

impl VendorPrefix {
    pub const fn new(octets: [u8; 3]) -> Self {
        Self(octets)
    }

    /// Parses the IEEE registry's compact assignment form, e.g. `B827EB`.
    pub fn from_assignment(assignment: &str) -> Option<Self> {
        let assignment = assignment.trim();
        if assignment.len() != 6 || !assignment.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(assignment, 16).ok()?;
        let [_, a, b, c] = value.to_be_bytes();
        Some(Self([a, b, c]))
    }
}

impl FromStr for VendorPrefix {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(parse_octets::<3>(s)?))
    }
}

impl fmt::Display for VendorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}")
    }
}

fn parse_octets<const N: usize>(input: &str) -> Result<[u8; N], MacParseError> {
    let fields: Vec<&str> = input.trim().split(':').collect();
    if fields.len() != N {
        return Err(MacParseError::OctetCount {
            input: input.to_string(),
            expected: N,
            found: fields.len(),
        });
    }

    let mut octets = [0u8; N];
    for (slot, field) in octets.iter_mut().zip(fields) {
        let well_formed = (1..=2).contains(&field.len()) && field.chars().all(|c| c.is_ascii_hexdigit());
        *slot = well_formed
            .then(|| u8::from_str_radix(field, 16).ok())
            .flatten()
            .ok_or_else(|| MacParseError::InvalidOctet {
                input: input.to_string(),
                octet: field.to_string(),
            })?;
    }
    Ok(octets)
}
