//! # Vendor Registry
//!
//! Maps 3-octet MAC prefixes to the board model they were assigned for. The Raspberry Pi
//! folks hold several prefixes and may be handed more; [`crate::ieee`] checks the IEEE
//! Registration Authority for drift.
//!
//! For anything outside the registry, a [`VendorRepository`] resolves the manufacturer name
//! from the full OUI database.

use std::collections::BTreeMap;

use descry_common::network::mac::VendorPrefix;
use mac_oui::Oui;
use pnet::util::MacAddr;

/// Model name reported for prefixes the registry does not know.
pub const UNKNOWN_MODEL: &str = "Unknown";

pub const RASPBERRY_PI: &str = "Raspberry Pi";
pub const ROCK_PI: &str = "Rock Pi";

const BUILTIN_PREFIXES: &[(&str, [u8; 3])] = &[
    (RASPBERRY_PI, [0xB8, 0x27, 0xEB]),
    (RASPBERRY_PI, [0xDC, 0xA6, 0x32]),
    (RASPBERRY_PI, [0xE4, 0x5F, 0x01]),
    (RASPBERRY_PI, [0x28, 0xCD, 0xC1]),
    (RASPBERRY_PI, [0xD8, 0x3A, 0xDD]),
    (RASPBERRY_PI, [0x2C, 0xCF, 0x67]),
    // The Rock Pi does not appear in the IEEE RA.
    (ROCK_PI, [0xEA, 0x62, 0x9D]),
];

/// Immutable prefix -> model table. Build one and pass it where it is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRegistry {
    models: BTreeMap<VendorPrefix, String>,
}

impl VendorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The boards `descry` looks for out of the box.
    pub fn builtin() -> Self {
        BUILTIN_PREFIXES
            .iter()
            .fold(Self::empty(), |registry, (model, octets)| {
                registry.with_prefix(VendorPrefix::new(*octets), *model)
            })
    }

    /// Returns a registry that also maps `prefix` to `model`, replacing any previous mapping.
    pub fn with_prefix(mut self, prefix: VendorPrefix, model: impl Into<String>) -> Self {
        self.models.insert(prefix, model.into());
        self
    }

    pub fn classify(&self, prefix: VendorPrefix) -> &str {
        self.models
            .get(&prefix)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_MODEL)
    }

    /// All registered prefixes, sorted.
    pub fn known_prefixes(&self) -> Vec<VendorPrefix> {
        self.models.keys().copied().collect()
    }

    /// Sorted prefixes registered for `model`.
    pub fn prefixes_for(&self, model: &str) -> Vec<VendorPrefix> {
        self.models
            .iter()
            .filter(|(_, name)| name.as_str() == model)
            .map(|(prefix, _)| *prefix)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Defines the contract for resolving device manufacturers from MAC addresses.
pub trait VendorRepository {
    /// Retrieves the manufacturer for a given MAC address, `None` if the OUI is unknown.
    fn get_vendor(&self, mac_addr: MacAddr) -> Option<String>;
}

/// [`VendorRepository`] over the bundled IEEE OUI database.
pub struct MacOuiRepo {
    db: Oui,
}

impl MacOuiRepo {
    pub fn load() -> anyhow::Result<Self> {
        let db = Oui::default().map_err(|e| anyhow::anyhow!("failed to load OUI database: {e:?}"))?;
        Ok(Self { db })
    }
}

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac_addr: MacAddr) -> Option<String> {
        match self.db.lookup_by_mac(&mac_addr.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            Ok(None) => None,
            Err(_) => None,
        }
    }
}
