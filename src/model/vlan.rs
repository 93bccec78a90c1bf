// Copyright (c) 2025 - Cowboy AI, Inc.
//! VLAN record, derived from SVI-style interface names

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{attr_str, attr_u64, opt_str, Attributes, EntityKind, FieldMap, Record, VlanId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub vid: VlanId,
    /// `None` for global VLANs
    pub site: Option<String>,
    pub name: String,
}

/// VLANs are unique per (vid, site)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VlanKey {
    pub vid: u16,
    pub site: Option<String>,
}

impl fmt::Display for VlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.site {
            Some(site) => write!(f, "{}@{}", self.vid, site),
            None => write!(f, "{}@global", self.vid),
        }
    }
}

impl Record for Vlan {
    type Key = VlanKey;

    const KIND: EntityKind = EntityKind::Vlan;

    const COMPARED_FIELDS: &'static [&'static str] = &["name"];

    fn key(&self) -> VlanKey {
        VlanKey {
            vid: self.vid.value(),
            site: self.site.clone(),
        }
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("vid", Value::from(self.vid.value())),
            ("site", opt_str(&self.site)),
            ("name", Value::String(self.name.clone())),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        let vid = u16::try_from(attr_u64(attrs, "vid")?).ok()?;
        Some(Self {
            vid: VlanId::new(vid).ok()?,
            site: attr_str(attrs, "site"),
            name: attr_str(attrs, "name").unwrap_or_default(),
        })
    }
}
