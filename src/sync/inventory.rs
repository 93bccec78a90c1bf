// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory item sync

use serde_json::Value;

use super::{apply, log_outcome, missing_parent, tolerate, Parent, SyncSession};
use crate::cmdb::{CmdbClient, LookupKey, Scope};
use crate::diff::diff;
use crate::errors::SyncResult;
use crate::model::{EntityKind, InventoryItem, Record};
use crate::stats::SyncOutcome;

/// Reconcile the modules, transceivers and PSUs of one device
pub async fn sync_inventory<C>(
    session: &mut SyncSession<'_, C>,
    device: &str,
    desired: &[InventoryItem],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::InventoryItem, device, session.is_dry_run());

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
            let listed = session.observe::<InventoryItem>(&Scope::Device(id)).await;
            let Some(listed) = tolerate(&mut outcome, device, listed)? else {
                log_outcome(&outcome);
                return Ok(outcome);
            };
            (Some(id), listed)
        }
    };

    let mut plan = diff(desired, &observed, false);
    if !session.options().update.allows(EntityKind::InventoryItem) {
        plan.demote_updates();
    }

    apply(
        session,
        plan,
        &mut outcome,
        |item: &InventoryItem| {
            let mut attrs = item.to_attributes();
            if let Some(id) = device_id {
                attrs.insert("device_id".into(), Value::from(id.0));
            }
            attrs
        },
        |item: &InventoryItem| {
            device_id.map(|id| LookupKey::InventoryItem {
                device_id: id,
                name: item.name.clone(),
            })
        },
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}
