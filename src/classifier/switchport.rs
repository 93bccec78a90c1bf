// Copyright (c) 2025 - Cowboy AI, Inc.
//! Switchport mode resolution
//!
//! - access and untagged ports resolve to `access`
//! - trunks resolve by their allowed-VLAN list: `ALL`, a missing list, or a
//!   list covering every VLAN ID (1-4094) is `tagged-all`; any other list is
//!   `tagged`
//! - aggregates take the most permissive mode reported by their members

use std::collections::HashMap;
use tracing::debug;

use crate::model::{Interface, SwitchportMode, VlanId};

/// Set of VLAN IDs, one bit per ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanSet {
    bits: [u64; 64],
}

impl Default for VlanSet {
    fn default() -> Self {
        Self { bits: [0; 64] }
    }
}

impl VlanSet {
    /// Insert `lo..=hi`, clamped to the valid VLAN range
    pub fn insert_range(&mut self, lo: u16, hi: u16) {
        let lo = lo.max(VlanId::MIN);
        let hi = hi.min(VlanId::MAX);
        for vid in lo..=hi {
            self.bits[usize::from(vid / 64)] |= 1 << (vid % 64);
        }
    }

    pub fn contains(&self, vid: u16) -> bool {
        vid <= VlanId::MAX && self.bits[usize::from(vid / 64)] & (1 << (vid % 64)) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every assignable VLAN is present
    pub fn is_full(&self) -> bool {
        self.len() == usize::from(VlanId::MAX - VlanId::MIN + 1)
    }
}

/// Parsed allowed-VLAN list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedVlans {
    All,
    List(VlanSet),
}

impl AllowedVlans {
    /// Parse `ALL`, `1-4094`, `10,20,30-40`, `none`; unreadable tokens are
    /// ignored
    pub fn parse(spec: &str) -> Self {
        let mut set = VlanSet::default();

        for token in spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            if token.eq_ignore_ascii_case("all") {
                return AllowedVlans::All;
            }
            if token.eq_ignore_ascii_case("none") {
                continue;
            }

            let parsed = match token.split_once('-') {
                Some((lo, hi)) => lo.parse::<u16>().ok().zip(hi.parse::<u16>().ok()),
                None => token.parse::<u16>().ok().map(|vid| (vid, vid)),
            };

            match parsed {
                Some((lo, hi)) if lo <= hi => set.insert_range(lo, hi),
                _ => debug!("Ignoring unreadable VLAN token: {}", token),
            }
        }

        if set.is_full() {
            AllowedVlans::All
        } else {
            AllowedVlans::List(set)
        }
    }
}

/// Resolve the canonical mode from raw mode and allowed-VLAN columns;
/// `None` for routed or unknown ports
pub fn resolve_mode(mode: Option<&str>, trunk_vlans: Option<&str>) -> Option<SwitchportMode> {
    let mode = mode?.trim().to_lowercase();
    let words: Vec<&str> = mode
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |word: &str| words.iter().any(|w| *w == word);

    // "untagged" is an access port on vendors that speak in tags
    if has("access") || has("untagged") {
        return Some(SwitchportMode::Access);
    }

    if words.iter().any(|w| w.starts_with("trunk")) || has("tagged") || has("hybrid") {
        let allowed = match trunk_vlans.map(str::trim).filter(|v| !v.is_empty()) {
            Some(spec) => AllowedVlans::parse(spec),
            None => AllowedVlans::All,
        };
        return Some(match allowed {
            AllowedVlans::All => SwitchportMode::TaggedAll,
            AllowedVlans::List(_) => SwitchportMode::Tagged,
        });
    }

    None
}

/// Combine member modes; the most permissive wins
pub fn aggregate_mode<I>(members: I) -> Option<SwitchportMode>
where
    I: IntoIterator<Item = SwitchportMode>,
{
    members.into_iter().max()
}

/// Give every aggregate the combined mode of its members. Aggregates with no
/// moded members keep their own mode.
pub fn inherit_lag_modes(interfaces: &mut [Interface]) {
    let mut member_modes: HashMap<String, Vec<SwitchportMode>> = HashMap::new();
    for iface in interfaces.iter() {
        if let (Some(lag), Some(mode)) = (&iface.lag, iface.mode) {
            member_modes.entry(lag.clone()).or_default().push(mode);
        }
    }

    for iface in interfaces.iter_mut() {
        if let Some(modes) = member_modes.get(&iface.name) {
            let inherited = aggregate_mode(modes.iter().copied());
            if inherited != iface.mode {
                debug!(
                    "{}:{} inherits mode {:?} from members (was {:?})",
                    iface.device, iface.name, inherited, iface.mode
                );
                iface.mode = inherited;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterfaceType;
    use test_case::test_case;

    #[test_case("ALL", SwitchportMode::TaggedAll ; "all token")]
    #[test_case("all", SwitchportMode::TaggedAll ; "lowercase all")]
    #[test_case("1-4094", SwitchportMode::TaggedAll ; "full range")]
    #[test_case("1-100,101-4094", SwitchportMode::TaggedAll ; "split full range")]
    #[test_case("1-4095", SwitchportMode::TaggedAll ; "range past the end")]
    #[test_case("10,20,30", SwitchportMode::Tagged ; "explicit list")]
    #[test_case("2-4094", SwitchportMode::Tagged ; "missing vlan 1")]
    #[test_case("none", SwitchportMode::Tagged ; "none")]
    fn test_trunk_lists(allowed: &str, expected: SwitchportMode) {
        assert_eq!(resolve_mode(Some("trunk"), Some(allowed)), Some(expected));
    }

    #[test]
    fn test_trunk_without_list_carries_all() {
        assert_eq!(
            resolve_mode(Some("trunk"), None),
            Some(SwitchportMode::TaggedAll)
        );
        assert_eq!(
            resolve_mode(Some("trunk"), Some("  ")),
            Some(SwitchportMode::TaggedAll)
        );
    }

    #[test_case(Some("static access"), Some(SwitchportMode::Access) ; "static access")]
    #[test_case(Some("access"), Some(SwitchportMode::Access) ; "access")]
    #[test_case(Some("untagged"), Some(SwitchportMode::Access) ; "untagged")]
    #[test_case(Some("Untagged VLAN"), Some(SwitchportMode::Access) ; "untagged with suffix")]
    #[test_case(Some("routed"), None ; "routed")]
    #[test_case(Some("down"), None ; "down")]
    #[test_case(None, None ; "missing")]
    fn test_non_trunk_modes(mode: Option<&str>, expected: Option<SwitchportMode>) {
        assert_eq!(resolve_mode(mode, Some("10")), expected);
    }

    #[test_case("trunk" ; "trunk")]
    #[test_case("trunking" ; "trunking")]
    #[test_case("tagged" ; "tagged")]
    #[test_case("hybrid" ; "hybrid")]
    #[test_case("static trunk" ; "static trunk")]
    fn test_trunk_spellings(mode: &str) {
        assert_eq!(
            resolve_mode(Some(mode), Some("10,20")),
            Some(SwitchportMode::Tagged)
        );
    }

    #[test]
    fn test_vlan_set() {
        let mut set = VlanSet::default();
        set.insert_range(0, 10);
        assert!(!set.contains(0));
        assert!(set.contains(1));
        assert!(set.contains(10));
        assert_eq!(set.len(), 10);
        assert!(!set.is_full());
    }

    #[test]
    fn test_most_permissive_member_wins() {
        assert_eq!(
            aggregate_mode([
                SwitchportMode::Access,
                SwitchportMode::Tagged,
                SwitchportMode::TaggedAll
            ]),
            Some(SwitchportMode::TaggedAll)
        );
        assert_eq!(
            aggregate_mode([SwitchportMode::Access, SwitchportMode::Tagged]),
            Some(SwitchportMode::Tagged)
        );
        assert_eq!(aggregate_mode([]), None);
    }

    #[test]
    fn test_inherit_lag_modes() {
        let mut po1 = Interface::new("sw1", "Po1", InterfaceType::Lag);
        po1.mode = Some(SwitchportMode::Access);
        let mut member_a = Interface::new("sw1", "Gi0/1", InterfaceType::Base1000T);
        member_a.lag = Some("Po1".into());
        member_a.mode = Some(SwitchportMode::Tagged);
        let mut member_b = Interface::new("sw1", "Gi0/2", InterfaceType::Base1000T);
        member_b.lag = Some("Po1".into());
        member_b.mode = Some(SwitchportMode::TaggedAll);
        let po2 = Interface::new("sw1", "Po2", InterfaceType::Lag);

        let mut interfaces = vec![po1, member_a, member_b, po2];
        inherit_lag_modes(&mut interfaces);

        assert_eq!(interfaces[0].mode, Some(SwitchportMode::TaggedAll));
        assert_eq!(interfaces[3].mode, None);
    }
}
