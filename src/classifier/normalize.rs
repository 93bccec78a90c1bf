// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scalar normalisation for raw interface columns
//!
//! Every function here is total: unreadable input becomes `None` (or the
//! documented default) and is logged at `debug`.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::model::{Mtu, VlanId};

/// Longest description the CMDB accepts
pub const MAX_DESCRIPTION_LEN: usize = 200;

static SPEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([gmk])?").unwrap());

static SVI_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:vlan-interface|vlanif|vlan|vl|irb\.|bvi)\s*(\d+)$").unwrap()
});

static NEIGHBOR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());

/// Parse a speed or bandwidth column into kbps.
///
/// `10Gb/s`, `1000 Mbps`, `a-1000`, `100000 Kbit`. A bare number is Mbps.
pub fn parse_speed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return None;
    }

    let caps = SPEED.captures(raw)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(unit) if unit == "g" => 1_000_000.0,
        Some(unit) if unit == "k" => 1.0,
        _ => 1_000.0,
    };

    let kbps = (value * multiplier).round();
    if kbps <= 0.0 {
        debug!("Ignoring non-positive speed: {}", raw);
        return None;
    }
    Some(kbps as u64)
}

/// Parse an MTU column; out-of-range values are dropped
pub fn parse_mtu(raw: &str) -> Option<u32> {
    let digits: String = raw.trim().chars().take_while(char::is_ascii_digit).collect();
    let size: u32 = digits.parse().ok()?;
    match Mtu::new(size) {
        Ok(mtu) => Some(mtu.value()),
        Err(e) => {
            debug!("Ignoring MTU {}: {}", raw, e);
            None
        }
    }
}

/// Administrative state; only an explicit administrative shutdown disables
pub fn parse_enabled(status: Option<&str>) -> bool {
    let Some(status) = status else {
        return true;
    };
    let status = status.trim().to_lowercase();
    let admin_down = status.contains("admin") && status.contains("down");
    !(admin_down || status.contains("disabled") || status.contains("shutdown"))
}

/// Trim and cap a description
pub fn clean_description(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    trimmed.chars().take(MAX_DESCRIPTION_LEN).collect()
}

/// VLAN ID carried by an SVI-style interface name (`Vlan10`, `vlan 10`,
/// `Vlanif10`, `Vlan-interface10`, `irb.10`, `BVI10`)
pub fn svi_vlan(name: &str) -> Option<VlanId> {
    let caps = SVI_NAME.captures(name.trim())?;
    let vid: u16 = caps.get(1)?.as_str().parse().ok()?;
    VlanId::new(vid).ok()
}

/// Neighbor device name as announced, without a trailing `(serial)`
pub fn neighbor_name(raw: &str) -> Option<String> {
    let name = NEIGHBOR_SUFFIX.replace(raw.trim(), "");
    let name = name.trim().trim_end_matches('.');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10Gb/s", Some(10_000_000) ; "gigabit suffix")]
    #[test_case("1000 Mbps", Some(1_000_000) ; "megabit suffix")]
    #[test_case("100000 Kbit", Some(100_000) ; "kilobit bandwidth")]
    #[test_case("a-1000", Some(1_000_000) ; "auto negotiated")]
    #[test_case("2.5G", Some(2_500_000) ; "fractional")]
    #[test_case("1000", Some(1_000_000) ; "bare number is mbps")]
    #[test_case("auto", None ; "auto")]
    #[test_case("unknown", None ; "text")]
    #[test_case("0", None ; "zero")]
    fn test_parse_speed(raw: &str, expected: Option<u64>) {
        assert_eq!(parse_speed(raw), expected);
    }

    #[test_case("1500", Some(1500) ; "plain")]
    #[test_case("9216 bytes", Some(9216) ; "with unit")]
    #[test_case("65535", None ; "too large")]
    #[test_case("", None ; "empty")]
    fn test_parse_mtu(raw: &str, expected: Option<u32>) {
        assert_eq!(parse_mtu(raw), expected);
    }

    #[test_case(Some("up"), true ; "up")]
    #[test_case(Some("down"), true ; "link down")]
    #[test_case(Some("administratively down"), false ; "admin down")]
    #[test_case(Some("down (Administratively down)"), false ; "nxos admin down")]
    #[test_case(Some("disabled"), false ; "disabled")]
    #[test_case(None, true ; "missing")]
    fn test_parse_enabled(status: Option<&str>, expected: bool) {
        assert_eq!(parse_enabled(status), expected);
    }

    #[test_case("Vlan10", Some(10) ; "cisco")]
    #[test_case("vlan 20", Some(20) ; "spaced")]
    #[test_case("Vlanif30", Some(30) ; "huawei")]
    #[test_case("Vlan-interface40", Some(40) ; "h3c")]
    #[test_case("irb.50", Some(50) ; "junos irb")]
    #[test_case("Vlan4095", None ; "out of range")]
    #[test_case("GigabitEthernet0/1", None ; "physical")]
    fn test_svi_vlan(name: &str, expected: Option<u16>) {
        assert_eq!(svi_vlan(name).map(|v| v.value()), expected);
    }

    #[test]
    fn test_description_is_capped() {
        let long = "x".repeat(250);
        assert_eq!(clean_description(Some(&long)).len(), MAX_DESCRIPTION_LEN);
        assert_eq!(clean_description(Some("  uplink ")), "uplink");
        assert_eq!(clean_description(None), "");
    }

    #[test]
    fn test_neighbor_name_strips_serial() {
        assert_eq!(neighbor_name("sw2(FOC1234X)"), Some("sw2".to_string()));
        assert_eq!(neighbor_name("sw3.example.com."), Some("sw3.example.com".to_string()));
        assert_eq!(neighbor_name("  "), None);
    }
}
