// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Diff Engine
//!
//! Every desired key lands in exactly one of create, update or skip; deletes
//! only ever come from observed-only keys; and a second sync against the
//! store the first one produced changes nothing.

use cim_netbox_sync::cmdb::{InMemoryCmdb, ObjectId};
use cim_netbox_sync::model::Device;
use cim_netbox_sync::sync::sync_devices;
use cim_netbox_sync::{diff, Observed, SyncOptions, SyncSession};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// Generators
// ============================================================================

/// Devices drawn from a small name pool so desired and observed overlap
fn device_strategy() -> impl Strategy<Value = Device> {
    (
        0..12u8,
        prop::sample::select(vec!["dc1", "dc2"]),
        prop::sample::select(vec!["access", "core"]),
        prop::option::of("[A-Z0-9]{4,8}"),
    )
        .prop_map(|(n, site, role, serial)| {
            let mut device = Device::new(format!("sw{}", n), site, role);
            device.serial = serial;
            device
        })
}

/// Unique by name, first one wins
fn devices_strategy() -> impl Strategy<Value = Vec<Device>> {
    prop::collection::vec(device_strategy(), 0..10).prop_map(|devices| {
        let mut by_name = BTreeMap::new();
        for device in devices {
            by_name.entry(device.name.clone()).or_insert(device);
        }
        by_name.into_values().collect()
    })
}

fn observe(devices: Vec<Device>) -> Vec<Observed<Device>> {
    devices
        .into_iter()
        .enumerate()
        .map(|(i, d)| Observed::new(ObjectId(i as u64 + 1), d))
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_desired_keys_are_partitioned(
        desired in devices_strategy(),
        observed in devices_strategy(),
        detect_deletes in any::<bool>(),
    ) {
        let observed = observe(observed);
        let result = diff(&desired, &observed, detect_deletes);

        let mut seen = HashSet::new();
        for name in result
            .creates
            .iter()
            .map(|d| d.name.clone())
            .chain(result.updates.iter().map(|u| u.record.name.clone()))
            .chain(result.skips.iter().map(|s| s.record.name.clone()))
        {
            prop_assert!(seen.insert(name), "key in more than one category");
        }
        prop_assert_eq!(seen.len(), desired.len());
    }

    #[test]
    fn prop_deletes_are_observed_only(
        desired in devices_strategy(),
        observed in devices_strategy(),
        detect_deletes in any::<bool>(),
    ) {
        let wanted: HashSet<String> = desired.iter().map(|d| d.name.clone()).collect();
        let observed = observe(observed);
        let result = diff(&desired, &observed, detect_deletes);

        if detect_deletes {
            let expected = observed
                .iter()
                .filter(|o| !wanted.contains(&o.record.name))
                .count();
            prop_assert_eq!(result.deletes.len(), expected);
        } else {
            prop_assert!(result.deletes.is_empty());
        }
        for deleted in &result.deletes {
            prop_assert!(!wanted.contains(&deleted.record.name));
        }
    }

    #[test]
    fn prop_identical_sides_only_skip(devices in devices_strategy()) {
        let observed = observe(devices.clone());
        let result = diff(&devices, &observed, true);

        prop_assert!(result.is_empty());
        prop_assert_eq!(result.skips.len(), devices.len());
    }

    #[test]
    fn prop_updates_carry_their_changes(
        desired in devices_strategy(),
        observed in devices_strategy(),
    ) {
        let observed = observe(observed);
        let result = diff(&desired, &observed, false);

        for update in &result.updates {
            prop_assert!(!update.changes.is_empty());
            for change in &update.changes {
                prop_assert_ne!(&change.before, &change.after);
            }
        }
    }

    #[test]
    fn prop_second_sync_is_a_no_op(
        seeded in devices_strategy(),
        desired in devices_strategy(),
    ) {
        let cmdb = InMemoryCmdb::new();
        tokio_test::block_on(async {
            let mut session = SyncSession::new(&cmdb, SyncOptions::default());
            sync_devices(&mut session, &seeded).await.unwrap();

            let options = SyncOptions::default().with_updates();
            let mut session = SyncSession::new(&cmdb, options.clone());
            sync_devices(&mut session, &desired).await.unwrap();

            cmdb.reset_calls();
            let mut session = SyncSession::new(&cmdb, options);
            let outcome = sync_devices(&mut session, &desired).await.unwrap();

            assert_eq!(outcome.stats.changed(), 0);
            assert_eq!(outcome.stats.skipped, desired.len());
        });
        prop_assert_eq!(cmdb.calls().mutations(), 0);
    }
}
