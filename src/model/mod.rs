// Copyright (c) 2025 - Cowboy AI, Inc.
//! Canonical Record Model
//!
//! Vendor-agnostic value records built fresh for every run from collector
//! output. Records are never mutated while a sync call runs; the CMDB is only
//! changed through a client adapter.
//!
//! | Record | Natural key |
//! |---|---|
//! | [`Device`] | hostname |
//! | [`Interface`] | (device, name) |
//! | [`IpAddress`] | address |
//! | [`Vlan`] | (vid, site) |
//! | [`Cable`] | unordered pair of endpoints |
//! | [`InventoryItem`] | (device, name) |
//!
//! Every record exposes its attributes as a flat [`FieldMap`]. The same flat
//! schema is used for the attributes of objects held by the CMDB, so a record
//! can be rebuilt from an observed object with [`Record::from_attributes`].

pub mod cable;
pub mod device;
pub mod interface;
pub mod inventory;
pub mod ip_address;
pub mod values;
pub mod vlan;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

pub use cable::{Cable, CableEndpoint, CableKey};
pub use device::Device;
pub use interface::{Interface, InterfaceType, SwitchportMode};
pub use inventory::InventoryItem;
pub use ip_address::IpAddress;
pub use values::{IpAddressWithCidr, Mtu, NetworkError, VlanId};
pub use vlan::{Vlan, VlanKey};

/// Flat attribute object as stored by (or sent to) the CMDB
pub type Attributes = serde_json::Map<String, Value>;

/// Field name to value, ordered for deterministic diffs
pub type FieldMap = BTreeMap<&'static str, Value>;

/// The closed set of entity types the engine reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Device,
    Interface,
    IpAddress,
    Vlan,
    Cable,
    InventoryItem,
}

impl EntityKind {
    /// Full-sync order; each kind only depends on kinds before it
    pub const SYNC_ORDER: [EntityKind; 6] = [
        EntityKind::Device,
        EntityKind::Interface,
        EntityKind::IpAddress,
        EntityKind::Vlan,
        EntityKind::Cable,
        EntityKind::InventoryItem,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "devices",
            Self::Interface => "interfaces",
            Self::IpAddress => "ip-addresses",
            Self::Vlan => "vlans",
            Self::Cable => "cables",
            Self::InventoryItem => "inventory",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "device" | "devices" => Some(Self::Device),
            "interface" | "interfaces" => Some(Self::Interface),
            "ip" | "ips" | "ip-address" | "ip-addresses" | "ip_addresses" => {
                Some(Self::IpAddress)
            }
            "vlan" | "vlans" => Some(Self::Vlan),
            "cable" | "cables" => Some(Self::Cable),
            "inventory" | "inventory-item" | "inventory-items" | "inventory_items" => {
                Some(Self::InventoryItem)
            }
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical record with a natural key
pub trait Record: Clone + fmt::Debug + Send + Sync {
    /// Natural key, unique within the record's scope
    type Key: Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// Entity kind this record reconciles against
    const KIND: EntityKind;

    /// Fields compared when a key exists on both sides
    const COMPARED_FIELDS: &'static [&'static str];

    /// Natural key of this record
    fn key(&self) -> Self::Key;

    /// All attributes in the flat schema
    fn fields(&self) -> FieldMap;

    /// Rebuild a record from observed attributes; `None` when the object
    /// lacks the attributes that make up the natural key
    fn from_attributes(attrs: &Attributes) -> Option<Self>;

    /// Attributes in the form sent to the CMDB on create
    fn to_attributes(&self) -> Attributes {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Key for records owned by a device: interfaces and inventory items
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceScopedKey {
    pub device: String,
    pub name: String,
}

impl DeviceScopedKey {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DeviceScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.name)
    }
}

pub(crate) fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

pub(crate) fn attr_str(attrs: &Attributes, key: &str) -> Option<String> {
    match attrs.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn attr_u64(attrs: &Attributes, key: &str) -> Option<u64> {
    attrs.get(key).and_then(Value::as_u64)
}

pub(crate) fn attr_bool(attrs: &Attributes, key: &str) -> Option<bool> {
    attrs.get(key).and_then(Value::as_bool)
}
