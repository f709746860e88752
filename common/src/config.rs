use std::path::PathBuf;

use crate::network::mac::VendorPrefix;

/// File the inventory is kept in when no path is given.
pub const DEFAULT_INVENTORY: &str = "mac_ips.json";
/// Login the boards ship with.
pub const DEFAULT_SSH_USER: &str = "pi";

pub struct Config {
    /// JSON file holding the MAC -> IP inventory between runs.
    pub inventory: PathBuf,
    /// User for `ssh`, `passwd` and `ssh-copy-id`.
    pub ssh_user: String,
    /// Prefixes registered on top of the built-in vendor table.
    pub extra_prefixes: Vec<(VendorPrefix, String)>,
    /// 0 prints everything, 1 drops headers, 2 prints bare results.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from(DEFAULT_INVENTORY),
            ssh_user: DEFAULT_SSH_USER.to_string(),
            extra_prefixes: Vec::new(),
            quiet: 0,
        }
    }
}
