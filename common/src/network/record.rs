use std::net::Ipv4Addr;

use crate::network::mac::HardwareAddress;

/// One neighbor-table observation: a hardware address seen at an IPv4 address.
///
/// Records are rebuilt on every parse and only feed reconciliation; they are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub hardware_address: HardwareAddress,
    pub ip_address: Ipv4Addr,
    /// Board model, when the record was classified against a vendor registry.
    pub model: Option<String>,
}

impl AddressRecord {
    pub fn new(hardware_address: HardwareAddress, ip_address: Ipv4Addr) -> Self {
        Self {
            hardware_address,
            ip_address,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
