// Copyright (c) 2025 - Cowboy AI, Inc.
//! IP address record
//!
//! Keyed by CIDR address. The interface binding is an attribute, so an
//! address that moved to another interface is an update (a rebind), not a
//! delete followed by a create.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{attr_str, opt_str, Attributes, EntityKind, FieldMap, IpAddressWithCidr, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: IpAddressWithCidr,
    pub device: Option<String>,
    pub interface: Option<String>,
    pub tenant: Option<String>,
    pub description: String,
}

impl IpAddress {
    pub fn assigned(
        address: IpAddressWithCidr,
        device: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            address,
            device: Some(device.into()),
            interface: Some(interface.into()),
            tenant: None,
            description: String::new(),
        }
    }
}

impl Record for IpAddress {
    type Key = String;

    const KIND: EntityKind = EntityKind::IpAddress;

    const COMPARED_FIELDS: &'static [&'static str] =
        &["device", "interface", "tenant", "description"];

    fn key(&self) -> String {
        self.address.as_cidr()
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("address", Value::String(self.address.as_cidr())),
            ("device", opt_str(&self.device)),
            ("interface", opt_str(&self.interface)),
            ("tenant", opt_str(&self.tenant)),
            ("description", Value::String(self.description.clone())),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        let address = attr_str(attrs, "address")?.parse().ok()?;
        Some(Self {
            address,
            device: attr_str(attrs, "device"),
            interface: attr_str(attrs, "interface"),
            tenant: attr_str(attrs, "tenant"),
            description: attr_str(attrs, "description").unwrap_or_default(),
        })
    }
}
