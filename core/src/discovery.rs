//! # Board Discovery Service
//!
//! Implements the "find the boards" use case.
//!
//! Orchestrates the pieces that do the real work: the [`SystemRepository`] for the raw
//! tables, the [`AddressTableParser`] to pick the boards out of them, and the
//! [`InventoryStore`] to remember what was found.

use std::net::Ipv4Addr;

use anyhow::Context;
use descry_common::network::interface::{Interface, InterfaceParser};
use descry_common::network::record::AddressRecord;
use pnet::ipnetwork::Ipv4Network;
use tracing::{debug, info};

use crate::arp::AddressTableParser;
use crate::inventory::{Change, InventoryStore};
use crate::sweep::{self, SweepError};
use crate::system::SystemRepository;

pub struct DiscoveryService {
    system: Box<dyn SystemRepository>,
    parser: AddressTableParser,
    interfaces: InterfaceParser,
    store: InventoryStore,
}

impl DiscoveryService {
    pub fn new(
        system: Box<dyn SystemRepository>,
        parser: AddressTableParser,
        store: InventoryStore,
    ) -> Self {
        Self {
            system,
            parser,
            interfaces: InterfaceParser::new(),
            store,
        }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Boards currently in the neighbor table. The inventory is not touched.
    pub fn records(&self) -> anyhow::Result<Vec<AddressRecord>> {
        let table = self.system.neighbor_table()?;
        let records = self.parser.parse_table(&table);
        debug!("Neighbor table yielded {} records", records.len());
        Ok(records)
    }

    /// Every well-formed neighbor-table entry, boards or not.
    pub fn all_records(&self) -> anyhow::Result<Vec<AddressRecord>> {
        let table = self.system.neighbor_table()?;
        Ok(AddressTableParser::unfiltered().parse_table(&table))
    }

    /// Reads the neighbor table and records every board found into the inventory.
    ///
    /// Returns one [`Change`] per observation, in table order.
    pub fn perform_discovery(&self) -> anyhow::Result<Vec<Change>> {
        let records = self.records()?;
        let changes = self
            .store
            .record(&records)
            .with_context(|| format!("failed to update {}", self.store.path().display()))?;
        Ok(changes)
    }

    /// Local interfaces that are up and addressed, optionally only the one named.
    pub fn local_interfaces(&self, name: Option<&str>) -> anyhow::Result<Vec<Interface>> {
        let config = self.system.interface_config(name)?;
        Ok(self.interfaces.parse_interface_config(&config))
    }

    /// The interface named `name`, or the first one with an IPv4 network.
    pub fn select_interface(&self, name: Option<&str>) -> anyhow::Result<Interface> {
        let interfaces = self.local_interfaces(name)?;
        let interface = match name {
            Some(name) => interfaces
                .into_iter()
                .find(|interface| interface.name == name)
                .ok_or_else(|| SweepError::NotConfigured {
                    interface: name.to_string(),
                })?,
            None => interfaces
                .into_iter()
                .find(|interface| interface.network.is_some())
                .context("no interface is up with an IPv4 network to sweep")?,
        };
        Ok(interface)
    }

    /// Pings every address on the network of `interface_name` (or of the first configured
    /// interface) so that answering boards land in the neighbor table.
    ///
    /// Returns the hosts that answered.
    pub fn sweep(&self, interface_name: Option<&str>) -> anyhow::Result<Vec<Ipv4Addr>> {
        let interface = self.select_interface(interface_name)?;
        let network = sweep::sweep_target(&interface)?;
        info!("Sweeping {network} on {}", interface.name);
        self.sweep_network(network)
    }

    pub fn sweep_network(&self, network: Ipv4Network) -> anyhow::Result<Vec<Ipv4Addr>> {
        let range = sweep::usable_range(network);
        debug!("Pinging {} addresses ({range})", range.len());
        let output = self.system.sweep(network)?;
        Ok(sweep::parse_sweep_output(&output))
    }

    /// Which of `hosts` answer a ping right now.
    pub fn alive(&self, hosts: &[Ipv4Addr]) -> anyhow::Result<Vec<Ipv4Addr>> {
        if hosts.is_empty() {
            return Ok(Vec::new());
        }
        let output = self.system.ping(hosts)?;
        Ok(sweep::parse_alive(&output))
    }
}
