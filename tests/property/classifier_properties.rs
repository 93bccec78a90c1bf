// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Classification
//!
//! Type rules apply in strict priority: installed media beats port
//! capability, which beats the interface name. Resolution never fails.

use cim_netbox_sync::classifier::interface_type::{from_hardware, from_media, resolve};
use cim_netbox_sync::classifier::{AllowedVlans, TypeInputs, TypeRule};
use cim_netbox_sync::model::InterfaceType;
use proptest::prelude::*;
use std::collections::BTreeSet;

const MEDIA: &[&str] = &[
    "SFP-10GBase-LR",
    "SFP-10G-SR",
    "QSFP-100G-LR4-S",
    "QSFP-40G-SR4",
    "SFP-25G-SR-S",
    "GLC-SX-MMD",
    "SFP+ ACME-DAC",
    "Fancy Optic",
];

const HARDWARE: &[&str] = &[
    "Ten Gigabit Ethernet",
    "Gigabit Ethernet",
    "EtherChannel",
    "EtherSVI",
    "Fast Ethernet",
    "Twenty Five Gigabit Ethernet",
];

const NAMES: &[&str] = &[
    "GigabitEthernet1/0/1",
    "Port-channel10",
    "Vlan10",
    "Loopback0",
    "mgmt0",
    "Ethernet1/1",
];

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(NAMES).prop_map(str::to_string),
        "[A-Za-z0-9/.-]{0,16}",
    ]
}

fn default_strategy() -> impl Strategy<Value = InterfaceType> {
    prop::sample::select(vec![
        InterfaceType::Other,
        InterfaceType::Base1000T,
        InterfaceType::Virtual,
    ])
}

proptest! {
    #[test]
    fn prop_media_outranks_hardware_and_name(
        media in prop::sample::select(MEDIA),
        hardware in prop::option::of(prop::sample::select(HARDWARE)),
        name in name_strategy(),
        default in default_strategy(),
    ) {
        let resolved = resolve(
            TypeInputs { media: Some(media), hardware, name: &name },
            default,
        );

        prop_assert_eq!(resolved.rule, TypeRule::Media);
        prop_assert_eq!(Some(resolved.kind), from_media(media));
    }

    #[test]
    fn prop_hardware_outranks_name(
        hardware in prop::sample::select(HARDWARE),
        name in name_strategy(),
        default in default_strategy(),
    ) {
        let resolved = resolve(
            TypeInputs { media: Some("Not Present"), hardware: Some(hardware), name: &name },
            default,
        );

        prop_assert_eq!(resolved.rule, TypeRule::Hardware);
        prop_assert_eq!(Some(resolved.kind), from_hardware(hardware));
    }

    #[test]
    fn prop_resolution_is_total(
        media in prop::option::of(".{0,24}"),
        hardware in prop::option::of(".{0,24}"),
        name in ".{0,24}",
        default in default_strategy(),
    ) {
        let resolved = resolve(
            TypeInputs {
                media: media.as_deref(),
                hardware: hardware.as_deref(),
                name: &name,
            },
            default,
        );

        if resolved.rule == TypeRule::Default {
            prop_assert_eq!(resolved.kind, default);
        }
    }

    #[test]
    fn prop_allowed_list_holds_exactly_its_vlans(
        vids in prop::collection::btree_set(1..=4094u16, 1..24),
    ) {
        let spec = vids
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");

        match AllowedVlans::parse(&spec) {
            AllowedVlans::List(set) => {
                prop_assert_eq!(set.len(), vids.len());
                for vid in &vids {
                    prop_assert!(set.contains(*vid));
                }
            }
            AllowedVlans::All => prop_assert!(false, "short list parsed as ALL"),
        }
    }

    #[test]
    fn prop_ranges_cover_their_span(lo in 1..=4000u16, width in 0..90u16) {
        let hi = lo + width;
        let expected: BTreeSet<u16> = (lo..=hi).collect();

        match AllowedVlans::parse(&format!("{}-{}", lo, hi)) {
            AllowedVlans::List(set) => {
                prop_assert_eq!(set.len(), expected.len());
                prop_assert!(set.contains(lo) && set.contains(hi));
                prop_assert!(!set.contains(hi + 1));
            }
            AllowedVlans::All => prop_assert!(false, "short range parsed as ALL"),
        }
    }
}
