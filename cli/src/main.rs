mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, hosts, interfaces, remote, scan, vendors};
use descry_common::config::Config;
use descry_core::vendors::VendorRegistry;
use terminal::{logging, print};
use tracing::error;

#[tokio::main]
async fn main() {
    let commands = CommandLine::parse_args();
    let cfg = commands.config();
    logging::init(cfg.quiet, commands.no_color);

    if let Err(e) = run(commands.command, &cfg).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, cfg: &Config) -> anyhow::Result<()> {
    let registry = cfg
        .extra_prefixes
        .iter()
        .fold(VendorRegistry::builtin(), |registry, (prefix, model)| {
            registry.with_prefix(*prefix, model.clone())
        });

    match command {
        Commands::List => {
            let service = discover::service(cfg, &registry)?;
            discover::list(&service, &registry, cfg)
        }
        Commands::Scan { interface } => {
            print::header("sweeping the network", cfg.quiet);
            let service = discover::service(cfg, &registry)?;
            scan::scan(&service, &registry, interface.as_deref(), cfg)
        }
        Commands::Table { all } => {
            let service = discover::service(cfg, &registry)?;
            discover::table(&service, &registry, all, cfg)
        }
        Commands::Hosts { ping } => {
            let service = discover::service(cfg, &registry)?;
            hosts::hosts(&service, &registry, ping, cfg)
        }
        Commands::Interfaces { interface } => {
            let service = discover::service(cfg, &registry)?;
            interfaces::interfaces(&service, interface.as_deref(), cfg)
        }
        Commands::Route { host } => interfaces::route(host, cfg),
        Commands::Vendors { query, model } => vendors::vendors(&registry, &query, &model, cfg).await,
        Commands::Passwd { hosts } => remote::passwd(hosts, cfg),
        Commands::CopyKeys { hosts } => remote::copy_keys(hosts, cfg),
    }
}
