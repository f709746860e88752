pub mod discover;
pub mod hosts;
pub mod interfaces;
pub mod remote;
pub mod scan;
pub mod vendors;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use descry_common::config::{Config, DEFAULT_INVENTORY, DEFAULT_SSH_USER};
use descry_common::network::mac::VendorPrefix;
use descry_core::ieee::DEFAULT_QUERY;
use descry_core::vendors::RASPBERRY_PI;

#[derive(Parser)]
#[command(name = "descry")]
#[command(version, about = "Find single-board computers on the local network.")]
pub struct CommandLine {
    /// JSON file the MAC -> IP inventory is kept in
    #[arg(long, global = true, env = "DESCRY_INVENTORY", default_value = DEFAULT_INVENTORY)]
    pub inventory: PathBuf,

    /// User to log in as on the boards
    #[arg(long, global = true, default_value = DEFAULT_SSH_USER)]
    pub user: String,

    /// Extra vendor prefix to look for, e.g. `2C:CF:67=Raspberry Pi`
    #[arg(long = "prefix", global = true, value_name = "AA:BB:CC=MODEL", value_parser = parse_prefix_mapping)]
    pub prefixes: Vec<(VendorPrefix, String)>,

    /// Print less; repeat for bare results
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record the boards in the neighbor table into the inventory
    #[command(alias = "l")]
    List,
    /// Ping the local network to fill the neighbor table, then list
    #[command(alias = "s")]
    Scan {
        /// Interface to sweep, e.g. eth0 (default: first configured one)
        #[arg(short, long)]
        interface: Option<String>,
    },
    /// Show the neighbor table without touching the inventory
    #[command(alias = "t")]
    Table {
        /// Include devices from every vendor
        #[arg(long)]
        all: bool,
    },
    /// Show the inventory
    #[command(alias = "h")]
    Hosts {
        /// Also ping every host
        #[arg(long)]
        ping: bool,
    },
    /// Show local interfaces and the networks a scan would sweep
    #[command(alias = "i")]
    Interfaces { interface: Option<String> },
    /// Show the interface a board routes through, queried over ssh
    #[command(alias = "r")]
    Route { host: Ipv4Addr },
    /// Check the IEEE registry for new vendor prefixes
    #[command(alias = "v")]
    Vendors {
        /// Registry search term
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,
        /// Model whose known prefixes are compared
        #[arg(long, default_value = RASPBERRY_PI)]
        model: String,
    },
    /// Change the login password (default: every inventory host)
    Passwd { hosts: Vec<String> },
    /// Install ssh keys for password-less login (default: every inventory host)
    CopyKeys { hosts: Vec<String> },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            inventory: self.inventory.clone(),
            ssh_user: self.user.clone(),
            extra_prefixes: self.prefixes.clone(),
            quiet: self.quiet,
        }
    }
}

fn parse_prefix_mapping(raw: &str) -> Result<(VendorPrefix, String), String> {
    let (prefix, model) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected AA:BB:CC=MODEL, got '{raw}'"))?;
    let prefix: VendorPrefix = prefix.trim().parse().map_err(|e| format!("{e}"))?;
    let model = model.trim();
    if model.is_empty() {
        return Err(format!("missing model name in '{raw}'"));
    }
    Ok((prefix, model.to_string()))
}
