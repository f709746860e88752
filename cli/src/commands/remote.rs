use descry_common::config::Config;
use descry_core::inventory::InventoryStore;
use descry_core::remote::{FACTORY_PASSWORD, HostOutcome, Ssh};
use tracing::{error, info};

use crate::terminal::{input, print};

/// Hosts named on the command line, or every host in the inventory.
fn target_hosts(hosts: Vec<String>, cfg: &Config) -> anyhow::Result<Vec<String>> {
    if !hosts.is_empty() {
        return Ok(hosts);
    }
    let store = InventoryStore::open(&cfg.inventory)?;
    Ok(store.hosts()?.iter().map(ToString::to_string).collect())
}

fn current_password() -> anyhow::Result<String> {
    let password = input::read_password("Current password (<Return> for default): ")?;
    Ok(if password.is_empty() {
        FACTORY_PASSWORD.to_string()
    } else {
        password
    })
}

/// `descry passwd`: rotate the login password on every host.
pub fn passwd(hosts: Vec<String>, cfg: &Config) -> anyhow::Result<()> {
    let hosts = target_hosts(hosts, cfg)?;
    if hosts.is_empty() {
        print::no_results("hosts");
        return Ok(());
    }

    info!("Changing password for {}", cfg.ssh_user);
    let current = current_password()?;
    let new = input::read_password("New password: ")?;
    let retyped = input::read_password("Retype new password: ")?;
    if new != retyped {
        anyhow::bail!("Sorry, passwords do not match");
    }

    let outcomes = Ssh::new(&cfg.ssh_user).change_password(&hosts, &current, &new);
    report(&outcomes, "password updated")
}

/// `descry copy-keys`: install the local public key on every host.
pub fn copy_keys(hosts: Vec<String>, cfg: &Config) -> anyhow::Result<()> {
    let hosts = target_hosts(hosts, cfg)?;
    if hosts.is_empty() {
        print::no_results("hosts");
        return Ok(());
    }

    info!("Installing SSH keys for {}", cfg.ssh_user);
    let password = current_password()?;
    let outcomes = Ssh::new(&cfg.ssh_user).copy_id(&hosts, &password);
    report(&outcomes, "keys installed")
}

fn report(outcomes: &[HostOutcome], success: &str) -> anyhow::Result<()> {
    for outcome in outcomes {
        match &outcome.result {
            Ok(_) => info!("{}: {success}", outcome.host),
            Err(e) => error!("{}: {e}", outcome.host),
        }
    }

    let failed = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} hosts failed", outcomes.len());
    }
    Ok(())
}
