use std::fs;
use std::net::Ipv4Addr;

use descry_common::network::interface::{InterfaceError, InterfaceParser};
use descry_core::arp::AddressTableParser;
use descry_core::discovery::DiscoveryService;
use descry_core::inventory::{InventoryError, InventoryStore};
use descry_core::vendors::VendorRegistry;
use tempfile::TempDir;

use crate::util::{Script, ScriptedSystem, arp_line};

const PI: &str = "B8:27:EB:11:22:33";

fn service(dir: &TempDir, script: &Script) -> DiscoveryService {
    let store = InventoryStore::open(dir.path().join("mac_ips.json")).unwrap();
    let parser = AddressTableParser::classifying(&VendorRegistry::builtin());
    DiscoveryService::new(Box::new(ScriptedSystem(script.clone())), parser, store)
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// A board shows up, moves while unassigned, then gets an assignment and stays put in the
/// inventory however often it moves.
#[test]
fn board_lifecycle_from_first_sighting_to_frozen_assignment() {
    let dir = TempDir::new().unwrap();
    let script = Script::default();
    let service = service(&dir, &script);

    script.set_neighbor_table(&arp_line("192.168.1.50", "b8:27:eb:11:22:33"));
    let changes = service.perform_discovery().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].new);
    assert_eq!(changes[0].assigned, None);
    assert_eq!(changes[0].ip, ip("192.168.1.50"));

    script.set_neighbor_table(&arp_line("192.168.1.99", "b8:27:eb:11:22:33"));
    let changes = service.perform_discovery().unwrap();
    assert!(!changes[0].new);
    assert_eq!(changes[0].assigned, None);
    let inventory = service.store().load().unwrap();
    let entry = inventory.get(&PI.parse().unwrap()).unwrap();
    assert_eq!(entry.current, ip("192.168.1.99"));

    // The operator plans a static address by editing the file.
    let path = service.store().path().to_path_buf();
    let edited = fs::read_to_string(&path)
        .unwrap()
        .replace("\"assigned\": null", "\"assigned\": \"192.168.1.10\"");
    fs::write(&path, edited).unwrap();

    script.set_neighbor_table(&arp_line("192.168.1.120", "b8:27:eb:11:22:33"));
    for _ in 0..2 {
        let changes = service.perform_discovery().unwrap();
        assert!(!changes[0].new);
        assert_eq!(changes[0].assigned, Some(ip("192.168.1.10")));
        assert!(changes[0].is_drift());

        let inventory = service.store().load().unwrap();
        let entry = inventory.get(&PI.parse().unwrap()).unwrap();
        assert_eq!(entry.current, ip("192.168.1.99"));
        assert_eq!(entry.assigned, Some(ip("192.168.1.10")));
    }
}

#[test]
fn scan_sweeps_the_interface_network_then_records_boards() {
    let dir = TempDir::new().unwrap();
    let script = Script::default();
    script.set_interface_config(
        "\
eth0: flags=4163<UP,BROADCAST,RUNNING,MULTICAST>  mtu 1500
        inet 169.254.46.250  netmask 255.255.0.0  broadcast 169.254.255.255
        ether dc:a6:32:19:1d:88  txqueuelen 1000  (Ethernet)

lo: flags=73<UP,LOOPBACK,RUNNING>  mtu 65536
        inet 127.0.0.1  netmask 255.0.0.0
        loop  txqueuelen 1000  (Local Loopback)
",
    );
    script.set_sweep_output(
        "\
169.254.19.148 : xmt/rcv/%loss = 2/2/0%, min/avg/max = 0.25/0.25/0.25
169.254.19.149 : xmt/rcv/%loss = 2/0/100%
",
    );
    script.set_neighbor_table(
        &[
            arp_line("169.254.19.148", "b8:27:eb:1:2:3"),
            arp_line("169.254.19.1", "0:11:22:33:44:55"),
        ]
        .concat(),
    );
    let service = service(&dir, &script);

    let alive = service.sweep(None).unwrap();
    assert_eq!(alive, vec![ip("169.254.19.148")]);
    assert_eq!(script.swept()[0].to_string(), "169.254.0.0/16");

    let changes = service.perform_discovery().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].hardware_address.to_string(), "B8:27:EB:01:02:03");
    assert_eq!(service.store().hosts().unwrap(), vec![ip("169.254.19.148")]);
}

#[test]
fn legacy_placeholder_is_rewritten_as_null() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mac_ips.json");
    fs::write(
        &path,
        r#"{"b8:27:eb:11:22:33": {"current": "192.168.1.50", "assigned": "Set this for a static IP"}}"#,
    )
    .unwrap();

    let script = Script::default();
    script.set_neighbor_table(&arp_line("192.168.1.51", "b8:27:eb:11:22:33"));
    let service = service(&dir, &script);

    let changes = service.perform_discovery().unwrap();
    assert!(!changes[0].new);
    assert_eq!(changes[0].assigned, None);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"B8:27:EB:11:22:33\""));
    assert!(written.contains("\"current\": \"192.168.1.51\""));
    assert!(written.contains("\"assigned\": null"));
}

#[test]
fn corrupt_inventory_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mac_ips.json");
    fs::write(&path, "not json at all").unwrap();

    assert!(matches!(InventoryStore::open(&path), Err(InventoryError::Corrupt { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), "not json at all");
}

#[test]
fn route_query_across_two_interfaces_fails_cross_validation() {
    let routes = "\
default via 10.0.0.1 dev eth0 proto dhcp src 10.0.0.5 metric 202
10.0.0.0/24 dev wlan0 proto dhcp scope link src 10.0.0.5 metric 303
";
    let err = InterfaceParser::new().parse_route_query(routes, ip("10.0.0.5")).unwrap_err();
    assert_eq!(
        err,
        InterfaceError::CrossValidation {
            default_iface: "eth0".to_string(),
            default_ip: ip("10.0.0.5"),
            subnet_iface: "wlan0".to_string(),
            subnet_ip: ip("10.0.0.5"),
        }
    );
}

#[test]
fn extra_prefixes_widen_discovery() {
    let dir = TempDir::new().unwrap();
    let script = Script::default();
    script.set_neighbor_table(&arp_line("192.168.1.70", "02:42:ac:11:00:02"));

    let registry = VendorRegistry::builtin().with_prefix("02:42:AC".parse().unwrap(), "Lab board");
    let store = InventoryStore::open(dir.path().join("mac_ips.json")).unwrap();
    let service = DiscoveryService::new(
        Box::new(ScriptedSystem(script.clone())),
        AddressTableParser::classifying(&registry),
        store,
    );

    let records = service.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].model.as_deref(), Some("Lab board"));
}
