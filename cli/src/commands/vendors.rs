use colored::*;
use descry_common::config::Config;
use descry_core::ieee::{self, IeeeRegistry};
use descry_core::vendors::VendorRegistry;
use tracing::{info, warn};

use crate::terminal::{colors, print};

/// `descry vendors`: compare the IEEE registry against the prefixes known for `model`.
///
/// A registry that cannot be reached is reported and the command still succeeds.
pub async fn vendors(registry: &VendorRegistry, query: &str, model: &str, cfg: &Config) -> anyhow::Result<()> {
    let known = registry.prefixes_for(model);
    print::header(&format!("{model} prefixes"), cfg.quiet);
    for prefix in &known {
        print::aligned_line("Known", 7, prefix.to_string().color(colors::MAC_ADDR));
    }

    let source = IeeeRegistry::new();
    match ieee::diff_against_known(&source, registry, model, query).await {
        Ok(None) => info!("IEEE registry agrees with the {} known prefixes", known.len()),
        Ok(Some(fetched)) => {
            warn!("IEEE registry disagrees for {model}");
            for prefix in fetched.iter().filter(|prefix| !known.contains(prefix)) {
                print::aligned_line("Added", 7, prefix.to_string().color(colors::NEW_HOST).bold());
            }
            for prefix in known.iter().filter(|prefix| !fetched.contains(prefix)) {
                print::aligned_line("Missing", 7, prefix.to_string().color(colors::DRIFT));
            }
            info!("Register additions with --prefix AA:BB:CC=\"{model}\"");
        }
        // Already logged by the registry client.
        Err(_) => {}
    }
    Ok(())
}
