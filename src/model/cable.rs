// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cable record
//!
//! A cable has no direction: `A <-> B` and `B <-> A` are the same cable, so
//! the key always stores the smaller endpoint first.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{attr_str, Attributes, EntityKind, FieldMap, Record};

/// One end of a cable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CableEndpoint {
    pub device: String,
    pub interface: String,
}

impl CableEndpoint {
    pub fn new(device: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for CableEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.interface)
    }
}

/// Normalized endpoint pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CableKey {
    pub a: CableEndpoint,
    pub b: CableEndpoint,
}

impl CableKey {
    pub fn new(x: CableEndpoint, y: CableEndpoint) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// True if either end sits on `device`
    pub fn touches(&self, device: &str) -> bool {
        self.a.device == device || self.b.device == device
    }
}

impl fmt::Display for CableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    pub a: CableEndpoint,
    pub b: CableEndpoint,
}

impl Cable {
    pub fn new(a: CableEndpoint, b: CableEndpoint) -> Self {
        Self { a, b }
    }

    /// Endpoints in key order
    pub fn normalized(&self) -> CableKey {
        CableKey::new(self.a.clone(), self.b.clone())
    }
}

impl Record for Cable {
    type Key = CableKey;

    const KIND: EntityKind = EntityKind::Cable;

    // Cables are recreated, never updated
    const COMPARED_FIELDS: &'static [&'static str] = &[];

    fn key(&self) -> CableKey {
        self.normalized()
    }

    fn fields(&self) -> FieldMap {
        let key = self.normalized();
        FieldMap::from([
            ("a_device", Value::String(key.a.device)),
            ("a_interface", Value::String(key.a.interface)),
            ("b_device", Value::String(key.b.device)),
            ("b_interface", Value::String(key.b.interface)),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        Some(Self {
            a: CableEndpoint::new(
                attr_str(attrs, "a_device")?,
                attr_str(attrs, "a_interface")?,
            ),
            b: CableEndpoint::new(
                attr_str(attrs, "b_device")?,
                attr_str(attrs, "b_interface")?,
            ),
        })
    }
}
