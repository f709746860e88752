use std::collections::HashSet;
use std::net::Ipv4Addr;

use descry_common::config::Config;
use descry_core::discovery::DiscoveryService;
use descry_core::vendors::VendorRegistry;

use crate::mprint;
use crate::terminal::{format, print};

/// `descry hosts`: the inventory, optionally with a liveness check.
pub fn hosts(
    service: &DiscoveryService,
    registry: &VendorRegistry,
    ping: bool,
    cfg: &Config,
) -> anyhow::Result<()> {
    let inventory = service.store().load()?;
    if inventory.is_empty() {
        print::no_results("hosts in the inventory");
        return Ok(());
    }

    let alive: Option<HashSet<Ipv4Addr>> = if ping {
        let current: Vec<Ipv4Addr> = inventory.iter().map(|(_, entry)| entry.current).collect();
        Some(service.alive(&current)?.into_iter().collect())
    } else {
        None
    };

    print::header(&format!("{} inventory", service.store().path().display()), cfg.quiet);
    for (idx, (hardware_address, entry)) in inventory.iter().enumerate() {
        if cfg.quiet >= 2 {
            print::print(&format!("{hardware_address} {}", entry.current));
            continue;
        }

        print::tree_head(idx, &hardware_address.to_string());
        let mut details = vec![format::model_detail(registry.classify(hardware_address.prefix()))];
        details.extend(format::entry_details(
            entry,
            alive.as_ref().map(|alive| alive.contains(&entry.current)),
        ));
        print::as_tree_one_level(details);
        if idx + 1 != inventory.len() {
            mprint!();
        }
    }
    Ok(())
}
