// Copyright (c) 2025 - Cowboy AI, Inc.
//! Interface type resolution
//!
//! Rules are tried in strict priority order and the first one that fires
//! decides the type:
//!
//! 1. media descriptor (installed transceiver) - optic table
//! 2. hardware descriptor (port capability) - port table
//! 3. interface name - aggregate, virtual and management patterns
//! 4. the caller's default
//!
//! A lower rule never overrides a higher one. A 25G-capable cage holding a
//! 10G LR optic is `10gbase-lr`, because the optic is what is installed.
//!
//! Rule 1 fires for any present descriptor. Descriptors missing from the
//! optic table are resolved from their form factor alone, or to `other`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::InterfaceType;

/// Which rule produced a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRule {
    Media,
    Hardware,
    Name,
    Default,
}

/// Resolved type and the rule that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeResolution {
    pub kind: InterfaceType,
    pub rule: TypeRule,
}

/// Inputs to type resolution, already read through the field mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeInputs<'a> {
    pub media: Option<&'a str>,
    pub hardware: Option<&'a str>,
    pub name: &'a str,
}

/// Optic table, matched against the compacted descriptor
const OPTIC_TABLE: &[(&[&str], InterfaceType)] = &[
    (&["100GBASELR4", "100GLR4"], InterfaceType::Base100GLr4),
    (&["100GBASESR4", "100GSR4"], InterfaceType::Base100GSr4),
    (&["40GBASELR4", "40GLR4"], InterfaceType::Base40GLr4),
    (&["40GBASESR4", "40GSR4"], InterfaceType::Base40GSr4),
    (&["25GBASELR", "25GLR"], InterfaceType::Base25GLr),
    (&["25GBASESR", "25GSR"], InterfaceType::Base25GSr),
    (&["10GBASEER", "10GER"], InterfaceType::Base10GEr),
    (&["10GBASELR", "10GLR"], InterfaceType::Base10GLr),
    (&["10GBASESR", "10GSR"], InterfaceType::Base10GSr),
    (&["10GBASET", "10GT"], InterfaceType::Base10GT),
    (&["1000BASESX", "GLCSX", "1GSX"], InterfaceType::Base1000Sx),
    (
        &["1000BASELX", "1000BASELH", "GLCLH", "GLCLX", "1GLX"],
        InterfaceType::Base1000Lx,
    ),
    (
        &["1000BASETX", "1000BASET", "GLCT", "GLCTE", "RJ45"],
        InterfaceType::Base1000T,
    ),
    (&["100BASETX"], InterfaceType::Base100Tx),
];

/// Form factors, for descriptors the optic table does not know
const FORM_FACTOR_TABLE: &[(&[&str], InterfaceType)] = &[
    (&["QSFP28"], InterfaceType::Qsfp28_100G),
    (&["QSFP+", "QSFPP", "QSFP"], InterfaceType::Qsfp40G),
    (&["SFP28"], InterfaceType::Sfp28_25G),
    (&["SFP+", "SFPP", "XFP"], InterfaceType::SfpPlus10G),
    (&["SFP", "GBIC"], InterfaceType::Sfp1000),
];

/// Port capability table
const HARDWARE_TABLE: &[(&[&str], InterfaceType)] = &[
    (
        &["HUNDREDGIG", "100GBASE", "100GE", "100000"],
        InterfaceType::Qsfp28_100G,
    ),
    (&["FORTYGIG", "40GBASE", "40GE", "40000"], InterfaceType::Qsfp40G),
    (
        &["TWENTYFIVEGIG", "25GBASE", "25GE", "25000"],
        InterfaceType::Sfp28_25G,
    ),
    (&["TENGIG", "10GBASE", "10GE", "10000"], InterfaceType::SfpPlus10G),
    (
        &["ETHERCHANNEL", "PORTCHANNEL", "AGGREGATE"],
        InterfaceType::Lag,
    ),
    (
        &["ETHERSVI", "LOOPBACK", "TUNNEL", "VIRTUAL"],
        InterfaceType::Virtual,
    ),
    (&["2.5GBASE", "2500"], InterfaceType::Base2_5GT),
    (&["5GBASE", "FIVEGIG"], InterfaceType::Base5GT),
    (&["GIGABIT", "1000"], InterfaceType::Base1000T),
    (&["FASTETHERNET", "100BASE"], InterfaceType::Base100Tx),
];

/// Values collectors print for an empty cage
const PLACEHOLDERS: &[&str] = &["", "NONE", "NOTPRESENT", "UNKNOWN", "N.A", "NA", "UNSUPPORTED"];

static LAG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(port-?channel|po|bundle-ether|be|ae|bond|eth-trunk|lag|aggregate)\s*\d")
        .unwrap()
});

static VIRTUAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((vlan|vlanif|vlan-interface|vl|loopback|lo|tunnel|tu|nve|vxlan|bdi|bvi|null|dialer|virtual-template)\s*\d|irb(\.\d+)?$)",
    )
    .unwrap()
});

static SUBINTERFACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z-]+\s*[\d/:]+\.\d+$").unwrap());

static MANAGEMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mgmt(eth)?|management|ma|fxp|me|em)\s*\d").unwrap()
});

/// Uppercase, keeping only characters that carry meaning in descriptors
fn compact(descriptor: &str) -> String {
    descriptor
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn lookup(table: &[(&[&str], InterfaceType)], compacted: &str) -> Option<InterfaceType> {
    table
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| compacted.contains(needle)))
        .map(|(_, kind)| *kind)
}

fn is_placeholder(compacted: &str) -> bool {
    PLACEHOLDERS.contains(&compacted)
}

/// Rule 1: installed media
pub fn from_media(descriptor: &str) -> Option<InterfaceType> {
    let compacted = compact(descriptor);
    if is_placeholder(&compacted) {
        return None;
    }
    Some(
        lookup(OPTIC_TABLE, &compacted)
            .or_else(|| lookup(FORM_FACTOR_TABLE, &compacted))
            .unwrap_or(InterfaceType::Other),
    )
}

/// Rule 2: port capability
pub fn from_hardware(descriptor: &str) -> Option<InterfaceType> {
    lookup(HARDWARE_TABLE, &compact(descriptor))
}

/// Rule 3: name patterns
pub fn from_name(name: &str) -> Option<InterfaceType> {
    let name = name.trim();
    if LAG_NAME.is_match(name) {
        Some(InterfaceType::Lag)
    } else if VIRTUAL_NAME.is_match(name) || SUBINTERFACE_NAME.is_match(name) {
        Some(InterfaceType::Virtual)
    } else if MANAGEMENT_NAME.is_match(name) {
        Some(InterfaceType::Base1000T)
    } else {
        None
    }
}

/// Resolve a canonical interface type; never fails
pub fn resolve(inputs: TypeInputs<'_>, default: InterfaceType) -> TypeResolution {
    if let Some(kind) = inputs.media.and_then(from_media) {
        return TypeResolution {
            kind,
            rule: TypeRule::Media,
        };
    }
    if let Some(kind) = inputs.hardware.and_then(from_hardware) {
        return TypeResolution {
            kind,
            rule: TypeRule::Hardware,
        };
    }
    if let Some(kind) = from_name(inputs.name) {
        return TypeResolution {
            kind,
            rule: TypeRule::Name,
        };
    }
    TypeResolution {
        kind: default,
        rule: TypeRule::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SFP-10GBase-LR", InterfaceType::Base10GLr ; "cisco lr")]
    #[test_case("SFP-10G-SR", InterfaceType::Base10GSr ; "cisco sr short")]
    #[test_case("10GBASE-ER SFP+", InterfaceType::Base10GEr ; "er")]
    #[test_case("QSFP-100G-LR4-S", InterfaceType::Base100GLr4 ; "100g lr4")]
    #[test_case("QSFP-40G-SR4", InterfaceType::Base40GSr4 ; "40g sr4")]
    #[test_case("SFP-25G-SR-S", InterfaceType::Base25GSr ; "25g sr")]
    #[test_case("GLC-SX-MMD", InterfaceType::Base1000Sx ; "glc sx")]
    #[test_case("GLC-LH-SMD", InterfaceType::Base1000Lx ; "glc lh")]
    #[test_case("10/100/1000BaseTX", InterfaceType::Base1000T ; "copper media type")]
    #[test_case("QSFP28 ACME-123", InterfaceType::Qsfp28_100G ; "unknown qsfp28 optic")]
    #[test_case("SFP+ ACME-DAC", InterfaceType::SfpPlus10G ; "unknown sfp plus")]
    #[test_case("Fancy Optic", InterfaceType::Other ; "unknown optic")]
    fn test_media_table(descriptor: &str, expected: InterfaceType) {
        assert_eq!(from_media(descriptor), Some(expected));
    }

    #[test_case("Not Present" ; "not present")]
    #[test_case("unknown" ; "unknown")]
    #[test_case("  " ; "blank")]
    fn test_media_placeholders_do_not_fire(descriptor: &str) {
        assert_eq!(from_media(descriptor), None);
    }

    #[test_case("Twenty Five Gigabit Ethernet", InterfaceType::Sfp28_25G ; "25g")]
    #[test_case("Ten Gigabit Ethernet", InterfaceType::SfpPlus10G ; "10g")]
    #[test_case("100/1000/10000 Ethernet", InterfaceType::SfpPlus10G ; "nxos multi rate")]
    #[test_case("Gigabit Ethernet", InterfaceType::Base1000T ; "1g")]
    #[test_case("EtherChannel", InterfaceType::Lag ; "etherchannel")]
    #[test_case("EtherSVI", InterfaceType::Virtual ; "svi")]
    #[test_case("Fast Ethernet", InterfaceType::Base100Tx ; "fast ethernet")]
    fn test_hardware_table(descriptor: &str, expected: InterfaceType) {
        assert_eq!(from_hardware(descriptor), Some(expected));
    }

    #[test_case("Port-channel10", Some(InterfaceType::Lag) ; "port channel")]
    #[test_case("Po1", Some(InterfaceType::Lag) ; "po")]
    #[test_case("ae0", Some(InterfaceType::Lag) ; "junos ae")]
    #[test_case("Bundle-Ether100", Some(InterfaceType::Lag) ; "bundle ether")]
    #[test_case("Vlan10", Some(InterfaceType::Virtual) ; "svi")]
    #[test_case("Loopback0", Some(InterfaceType::Virtual) ; "loopback")]
    #[test_case("Tunnel5", Some(InterfaceType::Virtual) ; "tunnel")]
    #[test_case("irb.100", Some(InterfaceType::Virtual) ; "irb unit")]
    #[test_case("GigabitEthernet0/0.100", Some(InterfaceType::Virtual) ; "subinterface")]
    #[test_case("mgmt0", Some(InterfaceType::Base1000T) ; "mgmt")]
    #[test_case("Management1", Some(InterfaceType::Base1000T) ; "management")]
    #[test_case("GigabitEthernet1/0/1", None ; "physical")]
    #[test_case("Ethernet1/1", None ; "nxos physical")]
    #[test_case("Power1", None ; "power is not a port channel")]
    fn test_name_patterns(name: &str, expected: Option<InterfaceType>) {
        assert_eq!(from_name(name), expected);
    }

    #[test]
    fn test_installed_optic_beats_port_capability() {
        let resolved = resolve(
            TypeInputs {
                media: Some("SFP-10GBase-LR"),
                hardware: Some("Twenty Five Gigabit Ethernet"),
                name: "TwentyFiveGigE1/0/1",
            },
            InterfaceType::Base1000T,
        );
        assert_eq!(resolved.kind, InterfaceType::Base10GLr);
        assert_eq!(resolved.rule, TypeRule::Media);
    }

    #[test]
    fn test_hardware_beats_name() {
        let resolved = resolve(
            TypeInputs {
                media: None,
                hardware: Some("Gigabit Ethernet"),
                name: "Port-channel1",
            },
            InterfaceType::Other,
        );
        assert_eq!(resolved.kind, InterfaceType::Base1000T);
        assert_eq!(resolved.rule, TypeRule::Hardware);
    }

    #[test]
    fn test_fallback_to_default() {
        let resolved = resolve(
            TypeInputs {
                media: Some("Not Present"),
                hardware: Some("Ethernet"),
                name: "Ethernet1/1",
            },
            InterfaceType::Base10GT,
        );
        assert_eq!(resolved.kind, InterfaceType::Base10GT);
        assert_eq!(resolved.rule, TypeRule::Default);
    }
}
