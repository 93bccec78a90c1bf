// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory item record (modules, transceivers, power supplies)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{attr_str, opt_str, Attributes, DeviceScopedKey, EntityKind, FieldMap, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub device: String,
    pub name: String,
    pub serial: Option<String>,
    pub part_id: Option<String>,
    /// Manufacturer name
    pub vendor: Option<String>,
    pub description: String,
}

impl InventoryItem {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            serial: None,
            part_id: None,
            vendor: None,
            description: String::new(),
        }
    }
}

impl Record for InventoryItem {
    type Key = DeviceScopedKey;

    const KIND: EntityKind = EntityKind::InventoryItem;

    const COMPARED_FIELDS: &'static [&'static str] =
        &["serial", "part_id", "vendor", "description"];

    fn key(&self) -> DeviceScopedKey {
        DeviceScopedKey::new(&self.device, &self.name)
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("device", Value::String(self.device.clone())),
            ("name", Value::String(self.name.clone())),
            ("serial", opt_str(&self.serial)),
            ("part_id", opt_str(&self.part_id)),
            ("vendor", opt_str(&self.vendor)),
            ("description", Value::String(self.description.clone())),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        Some(Self {
            device: attr_str(attrs, "device")?,
            name: attr_str(attrs, "name")?,
            serial: attr_str(attrs, "serial"),
            part_id: attr_str(attrs, "part_id"),
            vendor: attr_str(attrs, "vendor"),
            description: attr_str(attrs, "description").unwrap_or_default(),
        })
    }
}
