// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device sync and scoped device cleanup

use std::collections::HashSet;
use tracing::{info, warn};

use super::{apply, decode, log_outcome, tolerate, DeviceScope, SyncSession};
use crate::cmdb::{CmdbClient, LookupKey};
use crate::diff::{diff, Diff, Observed};
use crate::errors::{SyncError, SyncResult};
use crate::model::{Device, EntityKind, Record};
use crate::stats::SyncOutcome;

/// Create missing devices, and update changed ones when device updates are
/// enabled. Observed devices are found by name through the session cache.
pub async fn sync_devices<C>(
    session: &mut SyncSession<'_, C>,
    desired: &[Device],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::Device, "devices", session.is_dry_run());

    // A device whose lookup failed is left out of this run
    let mut readable = Vec::with_capacity(desired.len());
    let mut observed = Vec::new();
    for device in desired {
        let found = session.lookup(&LookupKey::device(&device.name)).await;
        let Some(found) = tolerate(&mut outcome, &device.name, found)? else {
            continue;
        };
        readable.push(device.clone());
        if let Some(object) = found {
            match Device::from_attributes(&object.attrs) {
                Some(record) => observed.push(Observed::new(object.id, record)),
                None => warn!("Device {} in CMDB has no usable name", object.id),
            }
        }
    }

    let mut plan = diff(&readable, &observed, false);
    if !session.options().update.allows(EntityKind::Device) {
        plan.demote_updates();
    }

    if session.is_dry_run() {
        session
            .planned_devices
            .extend(plan.creates.iter().map(|d| d.name.clone()));
    }

    apply(
        session,
        plan,
        &mut outcome,
        |device: &Device| device.to_attributes(),
        |device: &Device| Some(LookupKey::device(&device.name)),
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}

/// Delete devices inside `guard` that are no longer observed.
///
/// Deletion is refused outright without a site or tenant guard: no lookup,
/// list, or delete is issued in that case.
pub async fn cleanup_devices<C>(
    session: &mut SyncSession<'_, C>,
    desired: &[Device],
    guard: Option<&DeviceScope>,
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let guard = guard.ok_or(SyncError::MissingScopeGuard {
        operation: "device cleanup",
    })?;
    let scope = guard.to_scope()?;

    let mut outcome =
        SyncOutcome::new(EntityKind::Device, guard.to_string(), session.is_dry_run());
    let listed = session.client().list(EntityKind::Device, &scope).await;
    let Some(listed) = tolerate(&mut outcome, guard.to_string(), listed)? else {
        log_outcome(&outcome);
        return Ok(outcome);
    };
    let observed: Vec<Observed<Device>> = decode(listed);

    let keep: HashSet<&str> = desired.iter().map(|d| d.name.as_str()).collect();
    let present: Vec<Device> = observed
        .iter()
        .filter(|o| keep.contains(o.record.name.as_str()))
        .map(|o| o.record.clone())
        .collect();

    // Only the delete set matters here; devices still present are left as-is
    let full = diff(&present, &observed, true);
    let plan = Diff {
        deletes: full.deletes,
        skips: full.skips,
        ..Diff::default()
    };

    if !plan.deletes.is_empty() {
        info!(
            "Removing {} devices from {} no longer observed",
            plan.deletes.len(),
            guard
        );
    }

    apply(
        session,
        plan,
        &mut outcome,
        |device: &Device| device.to_attributes(),
        |device: &Device| Some(LookupKey::device(&device.name)),
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}
