//! # Interface Model
//!
//! Turns the text printed by `ifconfig` (local) and `ip route` (remote, over SSH) into
//! [`Interface`] records: a name plus the IPv4 address, network and gateway needed to
//! target a ping sweep or to write a static address stanza.
//!
//! `ifconfig` is technically deprecated on Linux, but it prints nearly identical blocks on
//! macOS (BSD) and Linux, which keeps this module free of platform switches:
//!
//! ```text
//! Linux: inet 169.254.46.250  netmask 255.255.0.0  broadcast 169.254.255.255
//! macOS: inet 169.254.201.244 netmask 0xffff0000 broadcast 169.254.255.255
//! ```

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::network::range;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    /// The default route and the subnet route were expected to describe one interface.
    #[error(
        "mismatch on interface and/or IP in route table: default route uses {default_iface} ({default_ip}) \
         but subnet route uses {subnet_iface} ({subnet_ip}); check `ip route`"
    )]
    CrossValidation {
        default_iface: String,
        default_ip: Ipv4Addr,
        subnet_iface: String,
        subnet_ip: Ipv4Addr,
    },
}

/// The IPv4 configuration of one hardware interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Interface name, e.g. `eth0`.
    pub name: String,
    pub ip: Option<Ipv4Addr>,
    pub network: Option<Ipv4Network>,
    /// Gateway/router address, only known from a route query.
    pub gateway: Option<Ipv4Addr>,
}

struct DefaultRoute {
    gateway: Option<Ipv4Addr>,
    iface: String,
    src: Ipv4Addr,
}

struct SubnetRoute {
    network: Ipv4Network,
    iface: String,
    src: Ipv4Addr,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: None,
            network: None,
            gateway: None,
        }
    }
}

// Header first, then the indented block: one combined pattern backtracks badly.
const HEADER_PATTERN: &str = r"^(?P<name>[A-Za-z][\w.-]*): .*<UP[,>]";
const INET_PATTERN: &str =
    r"inet (?P<ip>\S+)\s+netmask\s+(?P<netmask>\S+)\s+broadcast\s+(?P<broadcast>\S+)";
const DEFAULT_ROUTE_PATTERN: &str =
    r"(?m)^default (?:via (?P<gateway>[0-9.]+) )?dev (?P<iface>\S+)(?: .*)? src (?P<ip>[0-9.]+)";
const SUBNET_ROUTE_PATTERN: &str =
    r"(?m)^(?P<subnet>[0-9.]+/[0-9]+) dev (?P<iface>\S+)(?: .*)? src (?P<ip>[0-9.]+)";

/// Reads `ifconfig` and `ip route` listings into [`Interface`] records.
pub struct InterfaceParser {
    header_re: Regex,
    inet_re: Regex,
    default_route_re: Regex,
    subnet_route_re: Regex,
}

impl InterfaceParser {
    pub fn new() -> Self {
        Self {
            header_re: Regex::new(HEADER_PATTERN).expect("interface header pattern is valid"),
            inet_re: Regex::new(INET_PATTERN).expect("inet pattern is valid"),
            default_route_re: Regex::new(DEFAULT_ROUTE_PATTERN)
                .expect("default route pattern is valid"),
            subnet_route_re: Regex::new(SUBNET_ROUTE_PATTERN)
                .expect("subnet route pattern is valid"),
        }
    }

    /// Parses `ifconfig` output into one [`Interface`] per interface that is up and has
    /// link-layer framing (an `ether` line) as well as an IPv4 address.
    ///
    /// Loopback and tunnel interfaces have no `ether` line and are dropped. A kept block whose
    /// `inet` line cannot be read yields an interface that only carries its name.
    pub fn parse_interface_config(&self, raw: &str) -> Vec<Interface> {
        config_blocks(raw, &self.header_re)
            .into_iter()
            .filter(|(name, block)| {
                let keep = block.contains("ether ") && block.contains("inet ");
                if !keep {
                    trace!("Skipping interface {name}: no ether/inet lines");
                }
                keep
            })
            .map(|(name, block)| self.config_block(name, &block))
            .collect()
    }

    fn config_block(&self, name: &str, block: &str) -> Interface {
        let mut interface = Interface::new(name);
        let Some(caps) = self.inet_re.captures(block) else {
            debug!("No inet/netmask/broadcast line for {name}");
            return interface;
        };

        interface.ip = caps["ip"].parse().ok();
        let prefix = netmask_prefix(&caps["netmask"]);
        let broadcast: Option<Ipv4Addr> = caps["broadcast"].parse().ok();

        // Derived from the broadcast address rather than the host IP, which is ambiguous on
        // point-to-point and link-local setups.
        interface.network = match (broadcast, prefix) {
            (Some(broadcast), Some(prefix)) => range::cidr_range(broadcast, prefix)
                .and_then(|span| Ipv4Network::new(span.start_addr, prefix))
                .ok(),
            _ => None,
        };
        if interface.network.is_none() {
            debug!(
                "Could not derive network for {name} from netmask '{}' and broadcast '{}'",
                &caps["netmask"], &caps["broadcast"]
            );
        }

        interface
    }

    /// Parses `ip route` output captured on `expected_host`.
    ///
    /// ```text
    /// default via 192.168.2.1 dev wlan0 proto dhcp src 192.168.2.65 metric 303
    /// 192.168.2.0/24 dev wlan0 proto dhcp scope link src 192.168.2.65 metric 303
    /// ```
    ///
    /// Without a gateway the `via` clause is absent (`default dev eth0 scope link src ...`),
    /// which is only noted. Returns `Ok(None)` when there is no default route.
    ///
    /// # Errors
    /// [`InterfaceError::CrossValidation`] when the subnet route disagrees with the default
    /// route on interface or source address.
    pub fn parse_route_query(
        &self,
        raw: &str,
        expected_host: Ipv4Addr,
    ) -> Result<Option<Interface>, InterfaceError> {
        let default = self.default_route_re.captures_iter(raw).find_map(|caps| {
            Some(DefaultRoute {
                gateway: match caps.name("gateway") {
                    Some(gateway) => Some(gateway.as_str().parse().ok()?),
                    None => None,
                },
                iface: caps["iface"].to_string(),
                src: caps["ip"].parse().ok()?,
            })
        });
        let subnets: Vec<SubnetRoute> = self
            .subnet_route_re
            .captures_iter(raw)
            .filter_map(|caps| {
                let network: Ipv4Network = caps["subnet"].parse().ok()?;
                Some(SubnetRoute {
                    network: Ipv4Network::new(network.network(), network.prefix()).ok()?,
                    iface: caps["iface"].to_string(),
                    src: caps["ip"].parse().ok()?,
                })
            })
            .collect();

        let Some(default) = default else {
            warn!("No default route found for {expected_host}");
            return Ok(None);
        };

        if default.src != expected_host {
            warn!(
                "Found surprise host {} in route table (expected {expected_host})",
                default.src
            );
        }
        if default.gateway.is_none() {
            info!("Host {expected_host} appears to be missing a gateway");
        }

        let subnet = subnets
            .iter()
            .find(|subnet| subnet.iface == default.iface)
            .or(subnets.first());

        let network = match subnet {
            Some(subnet) if subnet.iface != default.iface || subnet.src != default.src => {
                return Err(InterfaceError::CrossValidation {
                    default_iface: default.iface,
                    default_ip: default.src,
                    subnet_iface: subnet.iface.clone(),
                    subnet_ip: subnet.src,
                });
            }
            Some(subnet) => Some(subnet.network),
            None => {
                debug!("No subnet route for {} on {expected_host}", default.iface);
                None
            }
        };

        Ok(Some(Interface {
            name: default.iface,
            ip: Some(default.src),
            network,
            gateway: default.gateway,
        }))
    }
}

impl Default for InterfaceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefix length of a netmask written either as a dotted quad (`255.255.0.0`) or as a hex
/// bitmask (`0xffff0000`), counted as set bits.
pub fn netmask_prefix(mask: &str) -> Option<u8> {
    let mask = mask.trim();
    let bits: u32 = match mask.strip_prefix("0x").or_else(|| mask.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => mask.parse::<Ipv4Addr>().ok()?.into(),
    };
    Some(bits.count_ones() as u8)
}

/// Splits `ifconfig` output into `(name, indented body)` pairs for headers that are up.
fn config_blocks<'a>(raw: &'a str, header: &Regex) -> Vec<(&'a str, String)> {
    let mut blocks: Vec<(&'a str, String)> = Vec::new();
    let mut current: Option<(&'a str, String)> = None;

    for line in raw.lines() {
        if line.starts_with(char::is_whitespace) {
            if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
            continue;
        }

        blocks.extend(current.take());
        current = header
            .captures(line)
            .and_then(|caps| caps.name("name"))
            .map(|name| (name.as_str(), String::new()));
    }
    blocks.extend(current);

    blocks
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
