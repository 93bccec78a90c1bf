// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cable sync; create only
//!
//! A cable is only created once both ends exist as interfaces in the CMDB.
//! Neighbors outside the inventory are counted as skipped. A dry run also
//! treats interfaces it plans to create as existing, and counts a cable seen
//! from both of its devices once.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{apply, log_outcome, missing_parent, tolerate, Parent, SyncSession};
use crate::cmdb::{CmdbClient, ObjectId, Scope};
use crate::diff::diff;
use crate::errors::SyncResult;
use crate::model::{Attributes, Cable, CableEndpoint, CableKey, EntityKind, Record};
use crate::stats::SyncOutcome;

/// Device and interface ids of one endpoint
#[derive(Debug, Clone, Copy)]
struct ResolvedEnd {
    device_id: ObjectId,
    interface_id: ObjectId,
}

#[derive(Debug, Clone, Copy)]
enum End {
    Resolved(ResolvedEnd),
    /// Created earlier in this dry run
    Planned,
    Missing,
}

/// Reconcile the cables seen from one device
pub async fn sync_cables<C>(
    session: &mut SyncSession<'_, C>,
    device: &str,
    desired: &[Cable],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::Cable, device, session.is_dry_run());

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

    let mut seen: HashSet<CableKey> = HashSet::new();
    let mut ends: HashMap<CableKey, (ResolvedEnd, ResolvedEnd)> = HashMap::new();
    let mut resolvable = Vec::with_capacity(desired.len());
    for cable in desired {
        let key = cable.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        if session.is_dry_run() && session.planned_cables.contains(&key) {
            debug!("Cable {} already planned from its other end", key);
            outcome.stats.skipped += 1;
            continue;
        }

        let a = resolve(session, &key.a).await;
        let Some(a) = tolerate(&mut outcome, key.to_string(), a)? else {
            continue;
        };
        let b = resolve(session, &key.b).await;
        let Some(b) = tolerate(&mut outcome, key.to_string(), b)? else {
            continue;
        };

        match (a, b) {
            (End::Missing, _) | (_, End::Missing) => {
                debug!("Skipping cable {}: endpoint not in CMDB", key);
                outcome.stats.skipped += 1;
            }
            (End::Resolved(a), End::Resolved(b)) => {
                ends.insert(key, (a, b));
                resolvable.push(cable.clone());
            }
            _ => resolvable.push(cable.clone()),
        }
    }

    let observed = match device_id {
        Some(id) => {
            let listed = session.observe::<Cable>(&Scope::Device(id)).await;
            let Some(listed) = tolerate(&mut outcome, device, listed)? else {
                log_outcome(&outcome);
                return Ok(outcome);
            };
            listed
        }
        None => Vec::new(),
    };
    let mut plan = diff(&resolvable, &observed, false);
    plan.demote_updates();

    if session.is_dry_run() {
        session
            .planned_cables
            .extend(plan.creates.iter().map(|cable| cable.key()));
    }

    apply(
        session,
        plan,
        &mut outcome,
        |cable: &Cable| payload(cable, &ends),
        |_: &Cable| None,
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}

async fn resolve<C>(session: &mut SyncSession<'_, C>, end: &CableEndpoint) -> SyncResult<End>
where
    C: CmdbClient + ?Sized,
{
    let device_id = session.device_id(&end.device).await?;
    let interface_id = match device_id {
        Some(id) => session.interface_id(id, &end.interface).await?,
        None => None,
    };
    Ok(match (device_id, interface_id) {
        (Some(device_id), Some(interface_id)) => End::Resolved(ResolvedEnd {
            device_id,
            interface_id,
        }),
        _ if session.plans_interface(&end.device, &end.interface) => End::Planned,
        _ => End::Missing,
    })
}

fn payload(cable: &Cable, ends: &HashMap<CableKey, (ResolvedEnd, ResolvedEnd)>) -> Attributes {
    let mut attrs = cable.to_attributes();
    if let Some((a, b)) = ends.get(&cable.key()) {
        attrs.insert("a_device_id".into(), Value::from(a.device_id.0));
        attrs.insert("a_interface_id".into(), Value::from(a.interface_id.0));
        attrs.insert("b_device_id".into(), Value::from(b.device_id.0));
        attrs.insert("b_interface_id".into(), Value::from(b.interface_id.0));
    }
    attrs
}
