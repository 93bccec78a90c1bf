// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device record, the root of interface and address ownership

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{attr_str, opt_str, Attributes, EntityKind, FieldMap, Record};

/// A network device keyed by hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub site: String,
    pub role: String,
    pub tenant: Option<String>,
    pub serial: Option<String>,
    /// Device type model, e.g. "C9300-48P"
    pub model: Option<String>,
    pub platform: Option<String>,
}

impl Device {
    pub fn new(name: impl Into<String>, site: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site: site.into(),
            role: role.into(),
            tenant: None,
            serial: None,
            model: None,
            platform: None,
        }
    }
}

impl Record for Device {
    type Key = String;

    const KIND: EntityKind = EntityKind::Device;

    const COMPARED_FIELDS: &'static [&'static str] =
        &["site", "role", "tenant", "serial", "model", "platform"];

    fn key(&self) -> String {
        self.name.clone()
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", Value::String(self.name.clone())),
            ("site", Value::String(self.site.clone())),
            ("role", Value::String(self.role.clone())),
            ("tenant", opt_str(&self.tenant)),
            ("serial", opt_str(&self.serial)),
            ("model", opt_str(&self.model)),
            ("platform", opt_str(&self.platform)),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        Some(Self {
            name: attr_str(attrs, "name")?,
            site: attr_str(attrs, "site").unwrap_or_default(),
            role: attr_str(attrs, "role").unwrap_or_default(),
            tenant: attr_str(attrs, "tenant"),
            serial: attr_str(attrs, "serial"),
            model: attr_str(attrs, "model"),
            platform: attr_str(attrs, "platform"),
        })
    }
}
