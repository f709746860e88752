//! # Inventory Store
//!
//! A JSON file of MAC -> IP mappings kept between runs. Once a board is seen its IP is
//! recorded; an operator may then fill in `assigned` with the static IP the board should get.
//! From that point the entry is frozen: scans report where the board actually is, but never
//! overwrite the plan.
//!
//! ```json
//! {
//!     "B8:27:EB:11:22:33": {
//!         "current": "192.168.1.50",
//!         "assigned": null
//!     }
//! }
//! ```
//!
//! Entries are never removed, even for boards that have not answered in a long time.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use descry_common::network::mac::HardwareAddress;
use descry_common::network::record::AddressRecord;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Placeholder the first generation of inventory files used instead of `null`.
pub const LEGACY_UNSET: &str = "Set this for a static IP";

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to access inventory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("inventory {} is corrupt, refusing to continue: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode inventory: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Last address the board was observed at.
    pub current: Ipv4Addr,
    /// Static address planned for the board; `None` until an operator sets one.
    #[serde(default, deserialize_with = "deserialize_assigned")]
    pub assigned: Option<Ipv4Addr>,
}

impl InventoryEntry {
    pub fn unassigned(current: Ipv4Addr) -> Self {
        Self {
            current,
            assigned: None,
        }
    }
}

fn deserialize_assigned<'de, D>(deserializer: D) -> Result<Option<Ipv4Addr>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some(LEGACY_UNSET) => Ok(None),
        Some(ip) => ip.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    hosts: BTreeMap<HardwareAddress, InventoryEntry>,
}

impl Inventory {
    pub fn get(&self, hardware_address: &HardwareAddress) -> Option<&InventoryEntry> {
        self.hosts.get(hardware_address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HardwareAddress, &InventoryEntry)> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    fn observe(&mut self, record: &AddressRecord) -> Change {
        let hardware_address = record.hardware_address;
        let ip = record.ip_address;

        let (new, assigned) = match self.hosts.get_mut(&hardware_address) {
            None => {
                self.hosts.insert(hardware_address, InventoryEntry::unassigned(ip));
                (true, None)
            }
            Some(entry) => match entry.assigned {
                Some(assigned) => (false, Some(assigned)),
                None => {
                    entry.current = ip;
                    (false, None)
                }
            },
        };

        Change {
            hardware_address,
            ip,
            new,
            assigned,
        }
    }
}

impl FromIterator<(HardwareAddress, InventoryEntry)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (HardwareAddress, InventoryEntry)>>(iter: T) -> Self {
        Self {
            hosts: iter.into_iter().collect(),
        }
    }
}

// Keys are canonicalized while reading, so `b8:27:eb:3:a:1f` and `b8:27:eb:03:0a:1f` name the
// same board. Two such keys are refused.
impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(InventoryVisitor)
    }
}

struct InventoryVisitor;

impl<'de> Visitor<'de> for InventoryVisitor {
    type Value = Inventory;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of hardware addresses to inventory entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Inventory, A::Error> {
        let mut hosts = BTreeMap::new();
        while let Some((hardware_address, entry)) =
            map.next_entry::<HardwareAddress, InventoryEntry>()?
        {
            if hosts.insert(hardware_address, entry).is_some() {
                return Err(de::Error::custom(format_args!(
                    "hardware address {hardware_address} appears more than once"
                )));
            }
        }
        Ok(Inventory { hosts })
    }
}

/// What one observation did to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub hardware_address: HardwareAddress,
    /// Address the board was observed at in this scan.
    pub ip: Ipv4Addr,
    /// The board had never been seen before.
    pub new: bool,
    /// The entry holds a static assignment and was left untouched.
    pub assigned: Option<Ipv4Addr>,
}

impl Change {
    /// The board is not where its assignment says it should be.
    pub fn is_drift(&self) -> bool {
        self.assigned.is_some_and(|assigned| assigned != self.ip)
    }
}

/// Merges a scan into `inventory`, observation by observation.
///
/// Returns the new inventory and one [`Change`] per observation, in scan order.
pub fn reconcile(inventory: &Inventory, scan: &[AddressRecord]) -> (Inventory, Vec<Change>) {
    let mut next = inventory.clone();
    let changes = scan.iter().map(|record| next.observe(record)).collect();
    (next, changes)
}

pub struct InventoryStore {
    path: PathBuf,
}

impl InventoryStore {
    /// Opens the inventory at `path`, creating an empty one if it does not exist.
    ///
    /// # Errors
    /// [`InventoryError::Corrupt`] when the existing file cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, InventoryError> {
        let store = Self { path: path.into() };
        if store.path.exists() {
            let inventory = store.load()?;
            debug!("Loaded {} hosts from {}", inventory.len(), store.path.display());
        } else {
            info!("Creating empty inventory at {}", store.path.display());
            store.write(&Inventory::default())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole inventory. A missing file is an empty inventory.
    pub fn load(&self) -> Result<Inventory, InventoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Inventory::default()),
            Err(source) => return Err(self.io_error(source)),
        };

        serde_json::from_str(&raw).map_err(|source| InventoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the file with `inventory`, through a temporary file in the same directory so
    /// a crash never leaves a half-written inventory behind. An existing file keeps its
    /// permissions.
    pub fn write(&self, inventory: &Inventory) -> Result<(), InventoryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;

        {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut tmp, formatter);
            inventory.serialize(&mut serializer)?;
        }
        tmp.write_all(b"\n").map_err(|e| self.io_error(e))?;
        match fs::metadata(&self.path) {
            Ok(meta) => tmp
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| self.io_error(e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        Ok(())
    }

    /// Reconciles `scan` into the stored inventory and rewrites it.
    pub fn record(&self, scan: &[AddressRecord]) -> Result<Vec<Change>, InventoryError> {
        let inventory = self.load()?;
        let (next, changes) = reconcile(&inventory, scan);
        self.write(&next)?;

        let new_hosts = changes.iter().filter(|change| change.new).count();
        debug!(
            "Recorded {} observations ({new_hosts} new) into {}",
            changes.len(),
            self.path.display()
        );
        Ok(changes)
    }

    /// Last known address of every board, for the remote commands.
    pub fn hosts(&self) -> Result<Vec<Ipv4Addr>, InventoryError> {
        Ok(self.load()?.iter().map(|(_, entry)| entry.current).collect())
    }

    fn io_error(&self, source: io::Error) -> InventoryError {
        InventoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mac(s: &str) -> HardwareAddress {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn record(m: &str, i: &str) -> AddressRecord {
        AddressRecord::new(mac(m), ip(i))
    }

    fn store_in(dir: &TempDir) -> InventoryStore {
        InventoryStore::open(dir.path().join("mac_ips.json")).unwrap()
    }

    #[test]
    fn reconcile_should_create_unseen_hosts() {
        let (inventory, changes) = reconcile(&Inventory::default(), &[record("B8:27:EB:11:22:33", "192.168.1.50")]);

        assert_eq!(
            changes,
            vec![Change {
                hardware_address: mac("B8:27:EB:11:22:33"),
                ip: ip("192.168.1.50"),
                new: true,
                assigned: None,
            }]
        );
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory.get(&mac("B8:27:EB:11:22:33")),
            Some(&InventoryEntry::unassigned(ip("192.168.1.50")))
        );
    }

    #[test]
    fn reconcile_should_follow_unassigned_hosts() {
        let before: Inventory = [(mac("B8:27:EB:11:22:33"), InventoryEntry::unassigned(ip("192.168.1.50")))]
            .into_iter()
            .collect();
        let (after, changes) = reconcile(&before, &[record("B8:27:EB:11:22:33", "192.168.1.99")]);

        assert!(!changes[0].new);
        assert_eq!(changes[0].assigned, None);
        assert_eq!(after.get(&mac("B8:27:EB:11:22:33")).unwrap().current, ip("192.168.1.99"));
    }

    #[test]
    fn reconcile_should_freeze_assigned_hosts() {
        let frozen = InventoryEntry {
            current: ip("192.168.1.50"),
            assigned: Some(ip("192.168.1.10")),
        };
        let before: Inventory = [(mac("B8:27:EB:11:22:33"), frozen)].into_iter().collect();
        let scan = [record("B8:27:EB:11:22:33", "192.168.1.99")];

        let (once, first) = reconcile(&before, &scan);
        let (twice, second) = reconcile(&once, &scan);

        for changes in [&first, &second] {
            assert!(!changes[0].new);
            assert_eq!(changes[0].assigned, Some(ip("192.168.1.10")));
            assert!(changes[0].is_drift());
        }
        assert_eq!(once, before);
        assert_eq!(twice, before);
    }

    #[test]
    fn reconcile_should_not_duplicate_keys_within_one_scan() {
        let scan = [
            record("B8:27:EB:11:22:33", "192.168.1.50"),
            record("b8:27:eb:11:22:33", "192.168.1.51"),
        ];
        let (inventory, changes) = reconcile(&Inventory::default(), &scan);

        assert_eq!(inventory.len(), 1);
        assert!(changes[0].new);
        assert!(!changes[1].new);
        assert_eq!(inventory.get(&mac("B8:27:EB:11:22:33")).unwrap().current, ip("192.168.1.51"));
    }

    #[test]
    fn reconcile_should_keep_absent_hosts() {
        let before: Inventory = [
            (mac("B8:27:EB:00:00:01"), InventoryEntry::unassigned(ip("10.0.0.1"))),
            (mac("B8:27:EB:00:00:02"), InventoryEntry::unassigned(ip("10.0.0.2"))),
        ]
        .into_iter()
        .collect();
        let (after, changes) = reconcile(&before, &[]);
        assert!(changes.is_empty());
        assert_eq!(after, before);
    }

    #[test]
    fn open_should_initialize_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{}\n");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn open_should_reject_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mac_ips.json");
        fs::write(&path, "{ \"B8:27:EB:11:22:33\": ").unwrap();

        let result = InventoryStore::open(&path);
        assert!(matches!(result, Err(InventoryError::Corrupt { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ \"B8:27:EB:11:22:33\": ");
    }

    #[test]
    fn open_should_reject_non_mac_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mac_ips.json");
        fs::write(&path, r#"{"192.168.1.50": {"current": "192.168.1.50", "assigned": null}}"#).unwrap();

        assert!(matches!(InventoryStore::open(&path), Err(InventoryError::Corrupt { .. })));
    }

    #[test]
    fn load_should_read_legacy_placeholder_as_unassigned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mac_ips.json");
        fs::write(
            &path,
            r#"{
    "b8:27:eb:11:22:33": {
        "current": "192.168.1.50",
        "assigned": "Set this for a static IP"
    },
    "dc:a6:32:19:1d:88": {
        "current": "192.168.1.51",
        "assigned": "192.168.1.10"
    }
}"#,
        )
        .unwrap();

        let inventory = InventoryStore::open(&path).unwrap().load().unwrap();
        assert_eq!(inventory.get(&mac("B8:27:EB:11:22:33")).unwrap().assigned, None);
        assert_eq!(inventory.get(&mac("DC:A6:32:19:1D:88")).unwrap().assigned, Some(ip("192.168.1.10")));
    }

    #[test]
    fn load_should_reject_keys_naming_the_same_board() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mac_ips.json");
        let raw = r#"{
    "b8:27:eb:03:0a:1f": {"current": "192.168.1.50", "assigned": "192.168.1.10"},
    "b8:27:eb:3:a:1f": {"current": "192.168.1.77", "assigned": "Set this for a static IP"}
}"#;
        fs::write(&path, raw).unwrap();

        assert!(matches!(InventoryStore::open(&path), Err(InventoryError::Corrupt { .. })));

        let store = InventoryStore { path: path.clone() };
        assert!(matches!(
            store.record(&[record("b8:27:eb:3:a:1f", "192.168.1.99")]),
            Err(InventoryError::Corrupt { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[cfg(unix)]
    #[test]
    fn record_should_keep_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mac_ips.json");
        fs::write(&path, "{}\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = InventoryStore::open(&path).unwrap();
        store.record(&[record("B8:27:EB:11:22:33", "192.168.1.50")]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn record_should_persist_with_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.record(&[record("b8:27:eb:11:22:33", "192.168.1.50")]).unwrap();

        let expected = "\
{
    \"B8:27:EB:11:22:33\": {
        \"current\": \"192.168.1.50\",
        \"assigned\": null
    }
}
";
        assert_eq!(fs::read_to_string(store.path()).unwrap(), expected);
    }

    #[test]
    fn round_trip_then_empty_scan_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .record(&[
                record("B8:27:EB:11:22:33", "192.168.1.50"),
                record("DC:A6:32:19:1D:88", "192.168.1.51"),
            ])
            .unwrap();
        let before = store.load().unwrap();

        let reopened = store_in(&dir);
        let changes = reopened.record(&[]).unwrap();

        assert!(changes.is_empty());
        assert_eq!(reopened.load().unwrap(), before);
    }

    #[test]
    fn hosts_lists_current_addresses() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .record(&[
                record("DC:A6:32:19:1D:88", "192.168.1.51"),
                record("B8:27:EB:11:22:33", "192.168.1.50"),
            ])
            .unwrap();
        assert_eq!(store.hosts().unwrap(), vec![ip("192.168.1.50"), ip("192.168.1.51")]);
    }
}
