// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sync Orchestrator
//!
//! One procedure per entity kind, each a free function over an explicit
//! [`SyncSession`] (client, run-scoped cache, options). Every procedure
//! wires the same pipeline:
//!
//! ```text
//! canonical records ──▶ observed (via cache / list) ──▶ diff ──▶ batch executor
//!                                                                  │
//!                                          dry run: stats from the diff
//! ```
//!
//! | Kind | Create | Update | Delete |
//! |---|---|---|---|
//! | device | yes | opt-in | only with a scope guard ([`cleanup_devices`]) |
//! | interface | yes | opt-in | no |
//! | ip-address | yes | opt-in | no |
//! | vlan | yes | no | no |
//! | cable | yes | no | no |
//! | inventory | yes | opt-in | no |
//!
//! Interface and address deletion stays disabled until explicitly signed
//! off; observed-only objects of those kinds are left alone.
//!
//! A missing parent device fails only that device's call for that kind
//! (`failed += 1`). Read errors other than authentication and permission
//! fail the call or item they belong to; those two abort with
//! [`SyncError::Cmdb`]. [`full_sync`] runs the kinds in their fixed
//! dependency order.

pub mod cables;
pub mod devices;
pub mod interfaces;
pub mod inventory;
pub mod ip_addresses;
pub mod vlans;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info};

use crate::cache::{CacheStats, SessionCache};
use crate::classifier::DeviceSnapshot;
use crate::cmdb::{CmdbClient, LookupKey, ObjectId, RemoteObject, Scope};
use crate::config::SyncOptions;
use crate::diff::{ChangeCategory, Diff, FieldChange, Observed};
use crate::errors::{SyncError, SyncResult};
use crate::executor::{BatchExecutor, PendingCreate, PendingDelete, PendingUpdate};
use crate::model::{Attributes, CableKey, EntityKind, Record};
use crate::stats::{SyncOutcome, SyncReport};

pub use cables::sync_cables;
pub use devices::{cleanup_devices, sync_devices};
pub use interfaces::sync_interfaces;
pub use inventory::sync_inventory;
pub use ip_addresses::sync_ip_addresses;
pub use vlans::sync_vlans;

/// Mandatory filter for device cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceScope {
    Site(String),
    Tenant(String),
}

impl DeviceScope {
    pub(crate) fn to_scope(&self) -> SyncResult<Scope> {
        let (value, scope) = match self {
            DeviceScope::Site(site) => (site, Scope::Site(site.clone())),
            DeviceScope::Tenant(tenant) => (tenant, Scope::Tenant(tenant.clone())),
        };
        if value.trim().is_empty() {
            return Err(SyncError::InvalidScope(format!("empty {}", self.label())));
        }
        Ok(scope)
    }

    fn label(&self) -> &'static str {
        match self {
            DeviceScope::Site(_) => "site",
            DeviceScope::Tenant(_) => "tenant",
        }
    }
}

impl fmt::Display for DeviceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceScope::Site(site) => write!(f, "site {}", site),
            DeviceScope::Tenant(tenant) => write!(f, "tenant {}", tenant),
        }
    }
}

/// Everything one reconciliation run shares between sync calls
pub struct SyncSession<'c, C: CmdbClient + ?Sized> {
    client: &'c C,
    cache: SessionCache,
    options: SyncOptions,
    /// Devices a dry run would have created
    planned_devices: HashSet<String>,
    /// Interfaces a dry run would have created, as (device, name)
    planned_interfaces: HashSet<(String, String)>,
    /// Cables a dry run would have created
    planned_cables: HashSet<CableKey>,
}

/// Resolution of a parent device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    Found(ObjectId),
    /// Not in the CMDB, but this dry run plans to create it
    Planned,
    Missing,
}

impl<'c, C> SyncSession<'c, C>
where
    C: CmdbClient + ?Sized,
{
    pub fn new(client: &'c C, options: SyncOptions) -> Self {
        Self {
            client,
            cache: SessionCache::new(),
            options,
            planned_devices: HashSet::new(),
            planned_interfaces: HashSet::new(),
            planned_cables: HashSet::new(),
        }
    }

    pub fn client(&self) -> &'c C {
        self.client
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// End the run: the cache is cleared and its accounting returned
    pub fn finish(mut self) -> CacheStats {
        self.cache.finish()
    }

    /// Cached natural-key lookup
    pub async fn lookup(&mut self, key: &LookupKey) -> SyncResult<Option<RemoteObject>> {
        Ok(self.cache.get_or_fetch(self.client, key).await?)
    }

    pub async fn device_id(&mut self, name: &str) -> SyncResult<Option<ObjectId>> {
        Ok(self.lookup(&LookupKey::device(name)).await?.map(|o| o.id))
    }

    pub async fn interface_id(
        &mut self,
        device_id: ObjectId,
        name: &str,
    ) -> SyncResult<Option<ObjectId>> {
        Ok(self
            .lookup(&LookupKey::interface(device_id, name))
            .await?
            .map(|o| o.id))
    }

    pub(crate) async fn parent(&mut self, device: &str) -> SyncResult<Parent> {
        if let Some(id) = self.device_id(device).await? {
            return Ok(Parent::Found(id));
        }
        if self.options.dry_run && self.planned_devices.contains(device) {
            return Ok(Parent::Planned);
        }
        Ok(Parent::Missing)
    }

    /// True if this dry run plans to create `device:name`
    pub(crate) fn plans_interface(&self, device: &str, name: &str) -> bool {
        self.options.dry_run
            && self
                .planned_interfaces
                .contains(&(device.to_string(), name.to_string()))
    }

    /// List a kind within a scope and decode it into records
    pub(crate) async fn observe<R: Record>(&self, scope: &Scope) -> SyncResult<Vec<Observed<R>>> {
        let objects = self.client.list(R::KIND, scope).await?;
        Ok(decode(objects))
    }
}

/// Decode remote objects, dropping any that lack their natural key
pub(crate) fn decode<R: Record>(objects: Vec<RemoteObject>) -> Vec<Observed<R>> {
    objects
        .into_iter()
        .filter_map(|object| match R::from_attributes(&object.attrs) {
            Some(record) => Some(Observed::new(object.id, record)),
            None => {
                debug!("Ignoring undecodable {} {}", R::KIND, object.id);
                None
            }
        })
        .collect()
}

/// Record a missing parent device against a call
pub(crate) fn missing_parent(outcome: &mut SyncOutcome, device: &str) {
    error!(
        "Device {} not found in CMDB, skipping {} sync",
        device, outcome.kind
    );
    outcome.fail(device, "parent device not found in CMDB");
}

/// Keep a non-fatal read error with the call instead of aborting the run.
///
/// Returns `Ok(None)` once the error is recorded against `identity`;
/// authentication and permission errors still propagate.
pub(crate) fn tolerate<T, E>(
    outcome: &mut SyncOutcome,
    identity: impl Into<String>,
    result: Result<T, E>,
) -> SyncResult<Option<T>>
where
    E: Into<SyncError>,
{
    match result.map_err(Into::into) {
        Ok(value) => Ok(Some(value)),
        Err(SyncError::Cmdb(err)) if !err.is_fatal() => {
            let identity = identity.into();
            error!("Reading {} {} failed: {}", outcome.kind, identity, err);
            outcome.fail(identity, err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Changed fields only, plus the `<field>_id` reference that goes with each
fn changed_attributes(payload: &Attributes, changes: &[FieldChange]) -> Attributes {
    let mut attrs = Attributes::new();
    for change in changes {
        let value = payload
            .get(&change.field)
            .cloned()
            .unwrap_or_else(|| change.after.clone());
        attrs.insert(change.field.clone(), value);

        let reference = format!("{}_id", change.field);
        if let Some(id) = payload.get(&reference) {
            attrs.insert(reference, id.clone());
        }
    }
    attrs
}

/// Apply a diff through the batch executor, writing every applied change
/// through to the session cache. Returns the records created, with ids.
///
/// In a dry run nothing is sent; statistics are the diff's projection.
pub(crate) async fn apply<C, R, P, K>(
    session: &mut SyncSession<'_, C>,
    diff: Diff<R>,
    outcome: &mut SyncOutcome,
    payload: P,
    cache_key: K,
) -> SyncResult<Vec<(R, ObjectId)>>
where
    C: CmdbClient + ?Sized,
    R: Record,
    P: Fn(&R) -> Attributes,
    K: Fn(&R) -> Option<LookupKey>,
{
    outcome.add_preview(diff.preview());

    if session.options.dry_run {
        outcome.stats += diff.projected_stats();
        return Ok(Vec::new());
    }
    outcome.stats.skipped += diff.skips.len();

    let client = session.client;
    let executor = BatchExecutor::new(client, R::KIND, session.options.bulk_chunk_size);

    let creates: Vec<PendingCreate> = diff
        .creates
        .iter()
        .map(|record| PendingCreate {
            identity: record.key().to_string(),
            attrs: payload(record),
        })
        .collect();
    let result = executor.create(&creates).await?;
    result.record_into(outcome, ChangeCategory::Create);

    let mut created = Vec::with_capacity(result.applied.len());
    for (index, id) in result.applied {
        let record = &diff.creates[index];
        if let Some(key) = cache_key(record) {
            session
                .cache
                .store(key, RemoteObject::new(id, creates[index].attrs.clone()));
        }
        created.push((record.clone(), id));
    }

    let updates: Vec<PendingUpdate> = diff
        .updates
        .iter()
        .map(|update| PendingUpdate {
            identity: update.record.key().to_string(),
            id: update.id,
            attrs: changed_attributes(&payload(&update.record), &update.changes),
        })
        .collect();
    let result = executor.update(&updates).await?;
    result.record_into(outcome, ChangeCategory::Update);
    for (index, ()) in result.applied {
        if let Some(key) = cache_key(&diff.updates[index].record) {
            session.cache.apply_update(&key, &updates[index].attrs);
        }
    }

    let deletes: Vec<PendingDelete> = diff
        .deletes
        .iter()
        .map(|observed| PendingDelete {
            identity: observed.record.key().to_string(),
            id: observed.id,
        })
        .collect();
    let result = executor.delete(&deletes).await?;
    result.record_into(outcome, ChangeCategory::Delete);
    for (index, ()) in result.applied {
        if let Some(key) = cache_key(&diff.deletes[index].record) {
            session.cache.mark_deleted(key);
        }
    }

    Ok(created)
}

/// Log the result of one call
pub(crate) fn log_outcome(outcome: &SyncOutcome) {
    info!(
        "{}{} sync for {}: {}",
        if outcome.dry_run { "[dry-run] " } else { "" },
        outcome.kind,
        outcome.scope,
        outcome.stats
    );
}

/// Reconcile every snapshot, kind by kind in the fixed dependency order:
/// devices, interfaces, ip-addresses, vlans, cables, inventory.
///
/// Fatal errors stop the run and are returned; every other failure is
/// recorded in the report.
pub async fn full_sync<C>(
    session: &mut SyncSession<'_, C>,
    snapshots: &[DeviceSnapshot],
) -> SyncResult<SyncReport>
where
    C: CmdbClient + ?Sized,
{
    let mut report = SyncReport::new(session.is_dry_run());
    info!(
        "Starting full sync {} of {} devices{}",
        report.run_id,
        snapshots.len(),
        if session.is_dry_run() { " (dry run)" } else { "" }
    );

    for kind in EntityKind::SYNC_ORDER {
        match kind {
            EntityKind::Device => {
                let devices: Vec<_> = snapshots.iter().map(|s| s.device.clone()).collect();
                report.push(sync_devices(session, &devices).await?);
            }
            EntityKind::Interface => {
                for snapshot in snapshots {
                    let outcome =
                        sync_interfaces(session, &snapshot.device.name, &snapshot.interfaces)
                            .await?;
                    report.push(outcome);
                }
            }
            EntityKind::IpAddress => {
                for snapshot in snapshots {
                    let outcome =
                        sync_ip_addresses(session, &snapshot.device.name, &snapshot.ip_addresses)
                            .await?;
                    report.push(outcome);
                }
            }
            EntityKind::Vlan => {
                let vlans: Vec<_> = snapshots.iter().flat_map(|s| s.vlans.clone()).collect();
                report.push(sync_vlans(session, &vlans).await?);
            }
            EntityKind::Cable => {
                for snapshot in snapshots {
                    let outcome =
                        sync_cables(session, &snapshot.device.name, &snapshot.cables).await?;
                    report.push(outcome);
                }
            }
            EntityKind::InventoryItem => {
                for snapshot in snapshots {
                    let outcome =
                        sync_inventory(session, &snapshot.device.name, &snapshot.inventory)
                            .await?;
                    report.push(outcome);
                }
            }
        }
    }

    report.finish();
    info!("Full sync {} finished: {}", report.run_id, report.total());
    Ok(report)
}
