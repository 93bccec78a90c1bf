// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-netbox-sync
//!
//! Two switches at one site, cabled to each other, as a collector would
//! report them. Every value is fixed so expected statistics can be spelled
//! out in the tests.
//!
//! | Device | Interfaces | Addresses | Cables | Inventory |
//! |---|---|---|---|---|
//! | sw1 | 6 (one LAG with two members, one SVI, one loopback) | 2 | 1 + 1 unknown neighbor | 3 |
//! | sw2 | 2 | 0 | 1 (same cable, seen from the other end) | 0 |

#![allow(dead_code)]

use cim_netbox_sync::collector::{
    DeviceObservation, RawDevice, RawInterface, RawInventoryItem, RawIpAddress, RawNeighbor,
};
use cim_netbox_sync::{Classifier, DeviceSnapshot};

pub const SITE: &str = "dc1";

pub fn raw_device(hostname: &str) -> RawDevice {
    RawDevice {
        hostname: hostname.to_string(),
        site: Some(SITE.to_string()),
        role: Some("access".to_string()),
        model: Some("C9300-48P".to_string()),
        platform: Some("ios-xe".to_string()),
        ..Default::default()
    }
}

fn port(name: &str, hardware: &str) -> RawInterface {
    RawInterface {
        name: name.to_string(),
        hardware: Some(hardware.to_string()),
        status: Some("up".to_string()),
        ..Default::default()
    }
}

fn uplink(name: &str, lag: &str) -> RawInterface {
    RawInterface {
        media_type: Some("SFP-10GBase-LR".to_string()),
        switchport_mode: Some("trunk".to_string()),
        lag_parent: Some(lag.to_string()),
        speed: Some("10Gb/s".to_string()),
        ..port(name, "TenGigabitEthernet")
    }
}

fn neighbor(local: &str, device: &str, remote: &str) -> RawNeighbor {
    RawNeighbor {
        local_interface: local.to_string(),
        remote_device: device.to_string(),
        remote_interface: remote.to_string(),
    }
}

fn module(name: &str, serial: &str) -> RawInventoryItem {
    RawInventoryItem {
        name: name.to_string(),
        serial: Some(serial.to_string()),
        vendor: Some("Cisco".to_string()),
        ..Default::default()
    }
}

pub fn sw1_observation() -> DeviceObservation {
    DeviceObservation {
        device: raw_device("sw1"),
        interfaces: vec![
            RawInterface {
                switchport_mode: Some("access".to_string()),
                speed: Some("1000 Mbps".to_string()),
                mtu: Some("1500".to_string()),
                description: Some("desk phone".to_string()),
                ..port("Gi1/0/1", "Gigabit Ethernet")
            },
            uplink("Te1/0/1", "Po1"),
            uplink("Te1/0/2", "Po1"),
            port("Po1", "EtherChannel"),
            RawInterface {
                description: Some("users".to_string()),
                ip_address: Some("10.0.10.1/24".to_string()),
                ..port("Vlan10", "EtherSVI")
            },
            RawInterface {
                ip_address: Some("10.255.0.1/32".to_string()),
                ..port("Loopback0", "Loopback")
            },
        ],
        ip_addresses: vec![RawIpAddress {
            interface: "Loopback0".to_string(),
            address: "10.255.0.1".to_string(),
            netmask: Some("255.255.255.255".to_string()),
        }],
        neighbors: vec![
            neighbor("Te1/0/1", "sw2", "Te1/0/1"),
            neighbor("Gi1/0/1", "SEP00AABBCCDDEE (phone)", "Port 1"),
        ],
        inventory: vec![
            module("Chassis", "FOC0001"),
            module("PSU", "LIT0001"),
            module("PSU", "LIT0002"),
        ],
    }
}

pub fn sw2_observation() -> DeviceObservation {
    DeviceObservation {
        device: raw_device("sw2"),
        interfaces: vec![
            RawInterface {
                media_type: Some("SFP-10GBase-LR".to_string()),
                ..port("Te1/0/1", "TenGigabitEthernet")
            },
            port("Gi1/0/1", "Gigabit Ethernet"),
        ],
        neighbors: vec![neighbor("Te1/0/1", "sw1", "Te1/0/1")],
        ..Default::default()
    }
}

/// Both switches, classified with default options
pub fn snapshots() -> Vec<DeviceSnapshot> {
    let classifier = Classifier::default();
    vec![
        classifier.classify(&sw1_observation()),
        classifier.classify(&sw2_observation()),
    ]
}
