// Copyright (c) 2025 - Cowboy AI, Inc.
//! Interface sync
//!
//! Aggregates are created in a first phase so their members can reference
//! them by id in the second.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{apply, log_outcome, missing_parent, tolerate, Parent, SyncSession};
use crate::cmdb::{CmdbClient, LookupKey, ObjectId, RemoteObject, Scope};
use crate::diff::{diff, Diff, Observed};
use crate::errors::SyncResult;
use crate::model::{Attributes, EntityKind, Interface, InterfaceType, Record};
use crate::stats::SyncOutcome;

/// Reconcile the interfaces of one device
pub async fn sync_interfaces<C>(
    session: &mut SyncSession<'_, C>,
    device: &str,
    desired: &[Interface],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::Interface, device, session.is_dry_run());

    let parent = session.parent(device).await;
    let (device_id, observed) = match tolerate(&mut outcome, device, parent)? {
        None => {
            log_outcome(&outcome);
            return Ok(outcome);
        }
        Some(Parent::Missing) => {
            missing_parent(&mut outcome, device);
            return Ok(outcome);
        }
        Some(Parent::Planned) => (None, Vec::new()),
        Some(Parent::Found(id)) => {
            let listed = session
                .client()
                .list(EntityKind::Interface, &Scope::Device(id))
                .await;
            let Some(objects) = tolerate(&mut outcome, device, listed)? else {
                log_outcome(&outcome);
                return Ok(outcome);
            };
            (Some(id), prime(session, id, objects))
        }
    };

    let mut plan = diff(desired, &observed, false);
    if !session.options().update.allows(EntityKind::Interface) {
        plan.demote_updates();
    }

    if session.is_dry_run() {
        session.planned_interfaces.extend(
            plan.creates
                .iter()
                .map(|iface| (device.to_string(), iface.name.clone())),
        );
    }

    // Aggregate ids known so far: observed ones, then those created below
    let mut lag_ids: HashMap<String, ObjectId> = observed
        .iter()
        .filter(|o| o.record.kind == InterfaceType::Lag)
        .map(|o| (o.record.name.clone(), o.id))
        .collect();

    let (aggregates, members): (Vec<_>, Vec<_>) = std::mem::take(&mut plan.creates)
        .into_iter()
        .partition(|iface| iface.kind == InterfaceType::Lag);

    if !aggregates.is_empty() {
        debug!("Creating {} aggregates on {} first", aggregates.len(), device);
        let first = Diff {
            creates: aggregates,
            ..Diff::default()
        };
        let created = apply(
            session,
            first,
            &mut outcome,
            |iface: &Interface| payload(iface, device_id, &HashMap::new()),
            |iface: &Interface| device_id.map(|id| LookupKey::interface(id, &iface.name)),
        )
        .await?;
        lag_ids.extend(created.into_iter().map(|(iface, id)| (iface.name, id)));
    }

    plan.creates = members;
    apply(
        session,
        plan,
        &mut outcome,
        |iface: &Interface| payload(iface, device_id, &lag_ids),
        |iface: &Interface| device_id.map(|id| LookupKey::interface(id, &iface.name)),
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}

/// Decode listed interfaces and seed the cache with them
fn prime<C>(
    session: &mut SyncSession<'_, C>,
    device_id: ObjectId,
    objects: Vec<RemoteObject>,
) -> Vec<Observed<Interface>>
where
    C: CmdbClient + ?Sized,
{
    let mut observed = Vec::with_capacity(objects.len());
    for object in objects {
        let Some(record) = Interface::from_attributes(&object.attrs) else {
            debug!("Ignoring undecodable interface {}", object.id);
            continue;
        };
        session
            .cache_mut()
            .store(LookupKey::interface(device_id, &record.name), object.clone());
        observed.push(Observed::new(object.id, record));
    }
    observed
}

/// Flat attributes plus the device and aggregate references
fn payload(
    iface: &Interface,
    device_id: Option<ObjectId>,
    lag_ids: &HashMap<String, ObjectId>,
) -> Attributes {
    let mut attrs = iface.to_attributes();
    if let Some(id) = device_id {
        attrs.insert("device_id".into(), Value::from(id.0));
    }
    if let Some(lag) = &iface.lag {
        match lag_ids.get(lag) {
            Some(id) => {
                attrs.insert("lag_id".into(), Value::from(id.0));
            }
            None => warn!(
                "Aggregate {} for {}:{} is not in the CMDB",
                lag, iface.device, iface.name
            ),
        }
    }
    attrs
}
