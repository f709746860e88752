use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use descry_core::system::SystemRepository;
use pnet::ipnetwork::Ipv4Network;

/// Output a scripted machine hands back. Tests keep a clone and rewrite it between runs.
#[derive(Clone, Default)]
pub struct Script {
    pub neighbor_table: Arc<Mutex<String>>,
    pub interface_config: Arc<Mutex<String>>,
    pub sweep_output: Arc<Mutex<String>>,
    pub swept: Arc<Mutex<Vec<Ipv4Network>>>,
}

impl Script {
    pub fn set_neighbor_table(&self, raw: &str) {
        set(&self.neighbor_table, raw);
    }

    pub fn set_interface_config(&self, raw: &str) {
        set(&self.interface_config, raw);
    }

    pub fn set_sweep_output(&self, raw: &str) {
        set(&self.sweep_output, raw);
    }

    pub fn swept(&self) -> Vec<Ipv4Network> {
        self.swept.lock().map(|swept| swept.clone()).unwrap_or_default()
    }
}

fn set(slot: &Mutex<String>, raw: &str) {
    if let Ok(mut slot) = slot.lock() {
        *slot = raw.to_string();
    }
}

fn get(slot: &Mutex<String>) -> anyhow::Result<String> {
    slot.lock()
        .map(|slot| slot.clone())
        .map_err(|_| anyhow::anyhow!("script poisoned"))
}

/// A [`SystemRepository`] replaying a [`Script`].
pub struct ScriptedSystem(pub Script);

impl SystemRepository for ScriptedSystem {
    fn neighbor_table(&self) -> anyhow::Result<String> {
        get(&self.0.neighbor_table)
    }

    fn interface_config(&self, _name: Option<&str>) -> anyhow::Result<String> {
        get(&self.0.interface_config)
    }

    fn sweep(&self, network: Ipv4Network) -> anyhow::Result<String> {
        if let Ok(mut swept) = self.0.swept.lock() {
            swept.push(network);
        }
        get(&self.0.sweep_output)
    }

    fn ping(&self, hosts: &[Ipv4Addr]) -> anyhow::Result<String> {
        Ok(hosts.iter().map(|host| format!("{host} is alive\n")).collect())
    }
}

pub fn arp_line(ip: &str, mac: &str) -> String {
    format!("? ({ip}) at {mac} on en0 ifscope [ethernet]\n")
}
