use colored::*;
use descry_common::config::Config;
use descry_core::discovery::DiscoveryService;
use descry_core::sweep;
use descry_core::vendors::VendorRegistry;
use tracing::info;

use crate::commands::discover;
use crate::terminal::spinner;

/// `descry scan`: ping the interface's network so every board lands in the neighbor table,
/// then list as usual.
pub fn scan(
    service: &DiscoveryService,
    registry: &VendorRegistry,
    interface: Option<&str>,
    cfg: &Config,
) -> anyhow::Result<()> {
    let interface = service.select_interface(interface)?;
    let network = sweep::sweep_target(&interface)?;
    let range = sweep::usable_range(network);

    let span = spinner::sweep_span(&network.to_string(), range.len());
    let alive = {
        let _guard = span.enter();
        service.sweep_network(network)?
    };
    drop(span);

    info!(
        "{} answered on {}",
        format!("{} hosts", alive.len()).green().bold(),
        interface.name
    );

    discover::list(service, registry, cfg)
}
