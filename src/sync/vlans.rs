// Copyright (c) 2025 - Cowboy AI, Inc.
//! VLAN sync; create only

use super::{apply, log_outcome, tolerate, SyncSession};
use crate::cmdb::{CmdbClient, LookupKey};
use crate::diff::{diff, Observed};
use crate::errors::SyncResult;
use crate::model::{EntityKind, Record, Vlan};
use crate::stats::SyncOutcome;

fn lookup_key(vlan: &Vlan) -> LookupKey {
    LookupKey::Vlan {
        vid: vlan.vid.value(),
        site: vlan.site.clone(),
    }
}

/// Create VLANs missing from the CMDB. Existing VLANs are never renamed.
pub async fn sync_vlans<C>(
    session: &mut SyncSession<'_, C>,
    desired: &[Vlan],
) -> SyncResult<SyncOutcome>
where
    C: CmdbClient + ?Sized,
{
    let mut outcome = SyncOutcome::new(EntityKind::Vlan, "vlans", session.is_dry_run());

    let mut readable = Vec::with_capacity(desired.len());
    let mut observed = Vec::new();
    for vlan in desired {
        let found = session.lookup(&lookup_key(vlan)).await;
        let Some(found) = tolerate(&mut outcome, vlan.key().to_string(), found)? else {
            continue;
        };
        readable.push(vlan.clone());
        if let Some(object) = found {
            if let Some(record) = Vlan::from_attributes(&object.attrs) {
                observed.push(Observed::new(object.id, record));
            }
        }
    }

    let mut plan = diff(&readable, &observed, false);
    plan.demote_updates();

    apply(
        session,
        plan,
        &mut outcome,
        |vlan: &Vlan| vlan.to_attributes(),
        |vlan: &Vlan| Some(lookup_key(vlan)),
    )
    .await?;

    log_outcome(&outcome);
    Ok(outcome)
}
