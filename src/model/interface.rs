// Copyright (c) 2025 - Cowboy AI, Inc.
//! Interface record and its canonical attributes
//!
//! [`InterfaceType`] and [`SwitchportMode`] are only ever set by the
//! classifier; by the time an interface reaches the comparator both are
//! fully resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::{
    attr_bool, attr_str, attr_u64, opt_str, Attributes, DeviceScopedKey, EntityKind, FieldMap,
    IpAddressWithCidr, Record,
};
use crate::errors::ConfigError;

/// Canonical interface type, using the CMDB's type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    // Logical
    Virtual,
    Lag,

    // Copper
    Base100Tx,
    Base1000T,
    Base2_5GT,
    Base5GT,
    Base10GT,

    // Installed optics
    Base1000Sx,
    Base1000Lx,
    Base10GSr,
    Base10GLr,
    Base10GEr,
    Base25GSr,
    Base25GLr,
    Base40GSr4,
    Base40GLr4,
    Base100GSr4,
    Base100GLr4,

    // Pluggable cages with no optic information
    Sfp1000,
    SfpPlus10G,
    Sfp28_25G,
    Qsfp40G,
    Qsfp28_100G,

    Other,
}

impl InterfaceType {
    pub const ALL: [InterfaceType; 24] = [
        Self::Virtual,
        Self::Lag,
        Self::Base100Tx,
        Self::Base1000T,
        Self::Base2_5GT,
        Self::Base5GT,
        Self::Base10GT,
        Self::Base1000Sx,
        Self::Base1000Lx,
        Self::Base10GSr,
        Self::Base10GLr,
        Self::Base10GEr,
        Self::Base25GSr,
        Self::Base25GLr,
        Self::Base40GSr4,
        Self::Base40GLr4,
        Self::Base100GSr4,
        Self::Base100GLr4,
        Self::Sfp1000,
        Self::SfpPlus10G,
        Self::Sfp28_25G,
        Self::Qsfp40G,
        Self::Qsfp28_100G,
        Self::Other,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Virtual => "virtual",
            Self::Lag => "lag",
            Self::Base100Tx => "100base-tx",
            Self::Base1000T => "1000base-t",
            Self::Base2_5GT => "2.5gbase-t",
            Self::Base5GT => "5gbase-t",
            Self::Base10GT => "10gbase-t",
            Self::Base1000Sx => "1000base-sx",
            Self::Base1000Lx => "1000base-lx",
            Self::Base10GSr => "10gbase-sr",
            Self::Base10GLr => "10gbase-lr",
            Self::Base10GEr => "10gbase-er",
            Self::Base25GSr => "25gbase-sr",
            Self::Base25GLr => "25gbase-lr",
            Self::Base40GSr4 => "40gbase-sr4",
            Self::Base40GLr4 => "40gbase-lr4",
            Self::Base100GSr4 => "100gbase-sr4",
            Self::Base100GLr4 => "100gbase-lr4",
            Self::Sfp1000 => "1000base-x-sfp",
            Self::SfpPlus10G => "10gbase-x-sfpp",
            Self::Sfp28_25G => "25gbase-x-sfp28",
            Self::Qsfp40G => "40gbase-x-qsfpp",
            Self::Qsfp28_100G => "100gbase-x-qsfp28",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownInterfaceType(s.to_string()))
    }
}

/// Canonical switchport mode
///
/// Variants are ordered from least to most permissive, which is the order an
/// aggregate uses when its members disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchportMode {
    Access,
    Tagged,
    TaggedAll,
}

impl SwitchportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Tagged => "tagged",
            Self::TaggedAll => "tagged-all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(Self::Access),
            "tagged" => Some(Self::Tagged),
            "tagged-all" => Some(Self::TaggedAll),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified interface on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub device: String,
    pub name: String,
    pub kind: InterfaceType,
    /// `None` for routed ports
    pub mode: Option<SwitchportMode>,
    pub description: String,
    pub enabled: bool,
    pub mtu: Option<u32>,
    /// Speed in kbps
    pub speed: Option<u64>,
    /// Name of the parent aggregate
    pub lag: Option<String>,
    /// Primary address as reported on the interface itself
    pub ip: Option<IpAddressWithCidr>,
}

impl Interface {
    pub fn new(device: impl Into<String>, name: impl Into<String>, kind: InterfaceType) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            kind,
            mode: None,
            description: String::new(),
            enabled: true,
            mtu: None,
            speed: None,
            lag: None,
            ip: None,
        }
    }
}

impl Record for Interface {
    type Key = DeviceScopedKey;

    const KIND: EntityKind = EntityKind::Interface;

    const COMPARED_FIELDS: &'static [&'static str] = &[
        "type",
        "mode",
        "description",
        "enabled",
        "mtu",
        "speed",
        "lag",
    ];

    fn key(&self) -> DeviceScopedKey {
        DeviceScopedKey::new(&self.device, &self.name)
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("device", Value::String(self.device.clone())),
            ("name", Value::String(self.name.clone())),
            ("type", Value::String(self.kind.as_str().to_string())),
            (
                "mode",
                self.mode
                    .map(|m| Value::String(m.as_str().to_string()))
                    .unwrap_or(Value::Null),
            ),
            ("description", Value::String(self.description.clone())),
            ("enabled", Value::Bool(self.enabled)),
            ("mtu", self.mtu.map(Value::from).unwrap_or(Value::Null)),
            ("speed", self.speed.map(Value::from).unwrap_or(Value::Null)),
            ("lag", opt_str(&self.lag)),
        ])
    }

    fn from_attributes(attrs: &Attributes) -> Option<Self> {
        let kind = attr_str(attrs, "type")
            .and_then(|t| t.parse().ok())
            .unwrap_or(InterfaceType::Other);

        Some(Self {
            device: attr_str(attrs, "device")?,
            name: attr_str(attrs, "name")?,
            kind,
            mode: attr_str(attrs, "mode").and_then(|m| SwitchportMode::parse(&m)),
            description: attr_str(attrs, "description").unwrap_or_default(),
            enabled: attr_bool(attrs, "enabled").unwrap_or(true),
            mtu: attr_u64(attrs, "mtu").and_then(|v| u32::try_from(v).ok()),
            speed: attr_u64(attrs, "speed"),
            lag: attr_str(attrs, "lag"),
            ip: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_type_parse() {
        assert_eq!(
            "10gbase-lr".parse::<InterfaceType>().unwrap(),
            InterfaceType::Base10GLr
        );
        assert_eq!(
            " 1000BASE-T ".parse::<InterfaceType>().unwrap(),
            InterfaceType::Base1000T
        );
        assert!("10gbase-zz".parse::<InterfaceType>().is_err());
    }

    #[test]
    fn test_mode_permissiveness_order() {
        assert!(SwitchportMode::Access < SwitchportMode::Tagged);
        assert!(SwitchportMode::Tagged < SwitchportMode::TaggedAll);
    }

    #[test]
    fn test_unknown_observed_type_becomes_other() {
        let mut attrs = Attributes::new();
        attrs.insert("device".into(), "sw1".into());
        attrs.insert("name".into(), "Gi0/1".into());
        attrs.insert("type".into(), "cdma".into());

        let iface = Interface::from_attributes(&attrs).unwrap();
        assert_eq!(iface.kind, InterfaceType::Other);
        assert!(iface.enabled);
        assert_eq!(iface.mode, None);
    }
}
