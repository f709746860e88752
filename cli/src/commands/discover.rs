use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use descry_common::config::Config;
use descry_common::network::record::AddressRecord;
use descry_core::arp::AddressTableParser;
use descry_core::discovery::DiscoveryService;
use descry_core::inventory::{Change, InventoryStore};
use descry_core::system::SystemRepo;
use descry_core::vendors::{MacOuiRepo, VendorRegistry, VendorRepository};
use tracing::warn;

use crate::mprint;
use crate::terminal::{colors, format, print};

pub fn service(cfg: &Config, registry: &VendorRegistry) -> anyhow::Result<DiscoveryService> {
    let store = InventoryStore::open(&cfg.inventory)
        .with_context(|| format!("failed to open inventory {}", cfg.inventory.display()))?;
    Ok(DiscoveryService::new(
        Box::new(SystemRepo),
        AddressTableParser::classifying(registry),
        store,
    ))
}

/// `descry list`: record the boards currently in the neighbor table.
pub fn list(service: &DiscoveryService, registry: &VendorRegistry, cfg: &Config) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let changes = service.perform_discovery()?;
    discovery_ends(&changes, registry, start_time.elapsed(), cfg);
    Ok(())
}

fn discovery_ends(changes: &[Change], registry: &VendorRegistry, total_time: Duration, cfg: &Config) {
    if changes.is_empty() {
        print::header("zero boards detected", cfg.quiet);
        print::no_results("boards");
        return;
    }

    print::header("boards found", cfg.quiet);
    for (idx, change) in changes.iter().enumerate() {
        match cfg.quiet {
            2 => print::print(&format!("{} {}", change.hardware_address, change.ip)),
            _ => print_change(change, idx, registry),
        }
        if cfg.quiet < 2 && idx + 1 != changes.len() {
            mprint!();
        }
        if change.is_drift() {
            if let Some(assigned) = change.assigned {
                warn!(
                    "{} is at {} but assigned {assigned}",
                    change.hardware_address, change.ip
                );
            }
        }
    }
    print_summary(changes, total_time, cfg);
}

fn print_change(change: &Change, idx: usize, registry: &VendorRegistry) {
    print::tree_head(idx, &change.hardware_address.to_string());
    let details = vec![
        ("IPv4".to_string(), change.ip.to_string().color(colors::IPV4_ADDR)),
        format::model_detail(registry.classify(change.hardware_address.prefix())),
        format::change_status(change),
    ];
    print::as_tree_one_level(details);
}

fn print_summary(changes: &[Change], total_time: Duration, cfg: &Config) {
    let new_hosts = changes.iter().filter(|change| change.new).count();
    let boards: ColoredString = format!("{} boards", changes.len()).bold().green();
    let new: ColoredString = format!("{new_hosts} new").bold().color(colors::NEW_HOST);
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString = format!("Discovery Complete: {boards} ({new}) in {total_time}")
        .color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        1 => {
            mprint!();
            tracing::info!("{output}");
        }
        _ => {}
    }
}

/// `descry table`: the neighbor table as parsed, without touching the inventory.
pub fn table(
    service: &DiscoveryService,
    registry: &VendorRegistry,
    all: bool,
    cfg: &Config,
) -> anyhow::Result<()> {
    let records = if all {
        service.all_records()?
    } else {
        service.records()?
    };

    if records.is_empty() {
        print::no_results("neighbors");
        return Ok(());
    }

    // The OUI database is only worth loading when unregistered vendors are shown.
    let vendors: Option<MacOuiRepo> = if all {
        match MacOuiRepo::load() {
            Ok(repo) => Some(repo),
            Err(e) => {
                warn!("{e:#}");
                None
            }
        }
    } else {
        None
    };

    print::header("neighbor table", cfg.quiet);
    for (idx, record) in records.iter().enumerate() {
        if cfg.quiet >= 2 {
            print::print(&format!("{} {}", record.hardware_address, record.ip_address));
            continue;
        }
        print_record(record, idx, registry, vendors.as_ref().map(|v| v as &dyn VendorRepository));
    }
    Ok(())
}

fn print_record(
    record: &AddressRecord,
    idx: usize,
    registry: &VendorRegistry,
    vendors: Option<&dyn VendorRepository>,
) {
    print::tree_head(idx, &record.hardware_address.to_string());
    let model = record
        .model
        .as_deref()
        .unwrap_or_else(|| registry.classify(record.hardware_address.prefix()));

    let mut details = vec![
        ("IPv4".to_string(), record.ip_address.to_string().color(colors::IPV4_ADDR)),
        format::model_detail(model),
    ];
    if let Some(vendor) = vendors.and_then(|repo| repo.get_vendor(record.hardware_address.into())) {
        details.push(format::vendor_detail(&vendor));
    }
    print::as_tree_one_level(details);
}
