use std::net::Ipv4Addr;

use descry_common::config::Config;
use descry_core::discovery::DiscoveryService;
use descry_core::remote::Ssh;
use descry_core::sweep;

use crate::mprint;
use crate::terminal::{format, print};

/// `descry interfaces`: local interfaces and what a scan would sweep on each.
pub fn interfaces(service: &DiscoveryService, name: Option<&str>, cfg: &Config) -> anyhow::Result<()> {
    let interfaces = service.local_interfaces(name)?;
    if interfaces.is_empty() {
        print::no_results("configured interfaces");
        return Ok(());
    }

    print::header("local interfaces", cfg.quiet);
    for (idx, interface) in interfaces.iter().enumerate() {
        print::tree_head(idx, &interface.name);
        let mut details = format::interface_details(interface);
        if let Ok(network) = sweep::sweep_target(interface) {
            let range = sweep::usable_range(network);
            details.push(("Sweep".to_string(), format!("{range} ({} hosts)", range.len()).into()));
        }
        print::as_tree_one_level(details);
        if idx + 1 != interfaces.len() {
            mprint!();
        }
    }
    Ok(())
}

/// `descry route`: the interface a board reaches its default route through.
pub fn route(host: Ipv4Addr, cfg: &Config) -> anyhow::Result<()> {
    let ssh = Ssh::new(&cfg.ssh_user);
    let Some(interface) = ssh.remote_interface(host)? else {
        print::no_results("default route");
        return Ok(());
    };

    print::header(&format!("routes of {host}"), cfg.quiet);
    print::tree_head(0, &interface.name);
    print::as_tree_one_level(format::interface_details(&interface));
    Ok(())
}
