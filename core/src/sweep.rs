//! Ping sweeps fill the ARP cache: once every address on an interface's network has been
//! pinged, any board that answered has its MAC address recorded for the parser to find.
//!
//! The sweep itself is `fping`'s job; this module decides what to sweep and reads back who
//! answered.

use std::net::Ipv4Addr;

use descry_common::network::interface::Interface;
use descry_common::network::range::Ipv4Range;
use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SweepError {
    #[error("interface {interface} has no IPv4 network configured (down or unaddressed?)")]
    NotConfigured { interface: String },
}

/// The network to sweep for `interface`.
pub fn sweep_target(interface: &Interface) -> Result<Ipv4Network, SweepError> {
    interface.network.ok_or_else(|| SweepError::NotConfigured {
        interface: interface.name.clone(),
    })
}

/// Host addresses of `network`, without the network and broadcast addresses when the
/// network is large enough to have them.
pub fn usable_range(network: Ipv4Network) -> Ipv4Range {
    let net_u32: u32 = network.network().into();
    let broadcast_u32: u32 = network.broadcast().into();

    let start_u32 = net_u32.saturating_add(1);
    let end_u32 = broadcast_u32.saturating_sub(1);

    if network.prefix() < 31 && start_u32 <= end_u32 {
        Ipv4Range::new(Ipv4Addr::from(start_u32), Ipv4Addr::from(end_u32))
    } else {
        Ipv4Range::new(network.network(), network.broadcast())
    }
}

/// Responding hosts from `fping --count` summary lines:
///
/// ```text
/// 169.254.19.148  : xmt/rcv/%loss = 1/1/0%, min/avg/max = 0.25/0.25/0.25
/// 169.255.255.254 : xmt/rcv/%loss = 1/0/100%
/// ```
pub fn parse_sweep_output(raw: &str) -> Vec<Ipv4Addr> {
    raw.lines()
        .filter(|line| line.contains("rcv"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let ip: Ipv4Addr = fields.first()?.parse().ok()?;
            let received: u32 = fields.get(4)?.split('/').nth(1)?.parse().ok()?;
            if received == 0 {
                trace!("{ip} did not answer");
                return None;
            }
            Some(ip)
        })
        .collect()
}

/// Hosts reported by plain `fping` as `<ip> is alive`.
pub fn parse_alive(raw: &str) -> Vec<Ipv4Addr> {
    raw.lines()
        .filter(|line| line.contains("is alive"))
        .filter_map(|line| line.split_whitespace().next()?.parse().ok())
        .collect()
}
