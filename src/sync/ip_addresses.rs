// Copyright (c) 2025 - Cowboy AI, Inc.
//! IP address sync
//!
//! Addresses are keyed by CIDR alone. One that already exists elsewhere in
//! the CMDB is rebound to this device's interface as an update.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::{apply, log_outcome, missing_parent, tolerate, Parent, SyncSession};
use crate::cmdb::{CmdbClient, LookupKey, ObjectId, Scope};
use crate::diff::{diff, Observed};
use crate::errors::SyncResult;
use crate::model::{Attributes, EntityKind, IpAddress, Record};
use crate::stats::SyncOutcome;

/// Reconcile the addresses assigned to one device's interfaces
pub async fn sync_ip_addresses<C>(
    session: &mut SyncSession<'_, C>,
    device: &str,
    desired: &[IpAddress],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::IpAddress, device, session.is_dry_run());

    let parent = session.parent(device).await;
    let device_id = match tolerate(&mut outcome, device, parent)? {
        None => {
            log_outcome(&outcome);
            return Ok(outcome);
        }
        Some(Parent::Missing) => {
            missing_parent(&mut outcome, device);
            return Ok(outcome);
        }
        Some(Parent::Planned) => None,
        Some(Parent::Found(id)) => Some(id),
    };

    let mut interface_ids: HashMap<String, ObjectId> = HashMap::new();
    let mut bindable = Vec::with_capacity(desired.len());
    for ip in desired {
        match (device_id, &ip.interface) {
            (Some(device_id), Some(interface)) if !interface_ids.contains_key(interface) => {
                let found = session.interface_id(device_id, interface).await;
                match tolerate(&mut outcome, ip.key(), found)? {
                    None => {}
                    Some(Some(id)) => {
                        interface_ids.insert(interface.clone(), id);
                        bindable.push(ip.clone());
                    }
                    // Bound once the dry run's interface would exist
                    Some(None) if session.plans_interface(device, interface) => {
                        bindable.push(ip.clone());
                    }
                    Some(None) => outcome.fail(
                        ip.key(),
                        format!("interface {} not found on {}", interface, device),
                    ),
                }
            }
            _ => bindable.push(ip.clone()),
        }
    }

    let mut observed: Vec<Observed<IpAddress>> = match device_id {
        Some(id) => {
            let listed = session.observe::<IpAddress>(&Scope::Device(id)).await;
            let Some(listed) = tolerate(&mut outcome, device, listed)? else {
                log_outcome(&outcome);
                return Ok(outcome);
            };
            listed
        }
        None => Vec::new(),
    };

    // Addresses held by another device show up only through a global lookup
    let local: HashSet<String> = observed.iter().map(|o| o.record.key()).collect();
    let mut unreadable = HashSet::new();
    for ip in &bindable {
        let key = ip.key();
        if local.contains(&key) {
            continue;
        }
        let found = session
            .lookup(&LookupKey::IpAddress {
                address: key.clone(),
            })
            .await;
        match tolerate(&mut outcome, key.clone(), found)? {
            None => {
                unreadable.insert(key);
            }
            Some(Some(object)) => {
                if let Some(record) = IpAddress::from_attributes(&object.attrs) {
                    observed.push(Observed::new(object.id, record));
                }
            }
            Some(None) => {}
        }
    }
    bindable.retain(|ip| !unreadable.contains(&ip.key()));

    let mut plan = diff(&bindable, &observed, false);
    if !session.options().update.allows(EntityKind::IpAddress) {
        plan.demote_updates();
    }

    apply(
        session,
        plan,
        &mut outcome,
        |ip: &IpAddress| payload(ip, device_id, &interface_ids),
        |ip: &IpAddress| Some(LookupKey::IpAddress { address: ip.key() }),
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}

fn payload(
    ip: &IpAddress,
    device_id: Option<ObjectId>,
    interface_ids: &HashMap<String, ObjectId>,
) -> Attributes {
    let mut attrs = ip.to_attributes();
    if let Some(id) = device_id {
        attrs.insert("device_id".into(), Value::from(id.0));
    }
    if let Some(id) = ip.interface.as_ref().and_then(|i| interface_ids.get(i)) {
        attrs.insert("interface_id".into(), Value::from(id.0));
    }
    attrs
}
