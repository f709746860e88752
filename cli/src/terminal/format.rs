use colored::*;
use descry_common::network::interface::Interface;
use descry_core::inventory::{Change, InventoryEntry};
use descry_core::vendors::UNKNOWN_MODEL;
use pnet::ipnetwork::Ipv4Network;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn model_detail(model: &str) -> Detail {
    let value = if model == UNKNOWN_MODEL {
        model.dimmed()
    } else {
        model.color(colors::MODEL)
    };
    ("Model".to_string(), value)
}

pub fn vendor_detail(vendor: &str) -> Detail {
    ("Vendor".to_string(), vendor.normal())
}

pub fn network_detail(key: &str, network: &Ipv4Network) -> Detail {
    let address: ColoredString = network.ip().to_string().color(colors::IPV4_ADDR);
    let prefix: ColoredString = network.prefix().to_string().color(colors::IPV4_PREFIX);
    (key.to_string(), format!("{address}/{prefix}").color(colors::SEPARATOR))
}

pub fn change_status(change: &Change) -> Detail {
    let value = match (change.new, change.assigned) {
        (true, _) => "new".color(colors::NEW_HOST).bold(),
        (false, Some(assigned)) if change.is_drift() => {
            format!("assigned {assigned}, drifted").color(colors::DRIFT).bold()
        }
        (false, Some(assigned)) => format!("assigned {assigned}").color(colors::FROZEN),
        (false, None) => "updated".normal(),
    };
    ("Status".to_string(), value)
}

pub fn entry_details(entry: &InventoryEntry, alive: Option<bool>) -> Vec<Detail> {
    let mut details = vec![(
        "Current".to_string(),
        entry.current.to_string().color(colors::IPV4_ADDR),
    )];
    details.push(match entry.assigned {
        Some(assigned) => ("Assigned".to_string(), assigned.to_string().color(colors::FROZEN)),
        None => ("Assigned".to_string(), "not set".dimmed()),
    });
    if let Some(alive) = alive {
        let value = if alive { "alive".green() } else { "no answer".red() };
        details.push(("Ping".to_string(), value));
    }
    details
}

pub fn interface_details(interface: &Interface) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();
    if let Some(ip) = interface.ip {
        details.push(("IPv4".to_string(), ip.to_string().color(colors::IPV4_ADDR)));
    }
    match &interface.network {
        Some(network) => details.push(network_detail("Network", network)),
        None => details.push(("Network".to_string(), "not configured".dimmed())),
    }
    if let Some(gateway) = interface.gateway {
        details.push(("Gateway".to_string(), gateway.to_string().color(colors::IPV4_ADDR)));
    }
    details
}
