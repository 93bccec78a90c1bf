// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory CMDB
//!
//! A [`CmdbClient`] that keeps objects in process memory. It serves as the
//! simulated store for dry-run comparisons and tests:
//!
//! - every client call is counted ([`CallLog`])
//! - bulk calls behave transactionally: one bad item fails the whole batch
//! - failures can be injected per kind, per item, or globally (auth)

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{CmdbClient, LookupKey, ObjectId, RemoteObject, Scope};
use crate::errors::{CmdbError, CmdbResult};
use crate::model::{Attributes, EntityKind};

/// Number of client calls received, per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    pub find: usize,
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub bulk_create: usize,
    pub bulk_update: usize,
    pub bulk_delete: usize,
}

impl CallLog {
    /// All calls, reads included
    pub fn total(&self) -> usize {
        self.find + self.list + self.mutations()
    }

    /// Calls that may change the store
    pub fn mutations(&self) -> usize {
        self.create
            + self.update
            + self.delete
            + self.bulk_create
            + self.bulk_update
            + self.bulk_delete
    }
}

#[derive(Debug, Default)]
struct Failures {
    auth: bool,
    bulk: HashSet<EntityKind>,
    next_list: HashSet<EntityKind>,
    rejected: HashSet<(EntityKind, String)>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<EntityKind, BTreeMap<ObjectId, Attributes>>,
    next_id: u64,
    calls: CallLog,
    failures: Failures,
}

impl State {
    fn insert(&mut self, kind: EntityKind, attrs: Attributes) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.entry(kind).or_default().insert(id, attrs);
        id
    }

    fn check_auth(&self) -> CmdbResult<()> {
        if self.failures.auth {
            return Err(CmdbError::Auth("invalid token".to_string()));
        }
        Ok(())
    }

    fn check_item(&self, kind: EntityKind, attrs: &Attributes) -> CmdbResult<()> {
        if let Some(label) = label_of(attrs) {
            if self.failures.rejected.contains(&(kind, label.clone())) {
                return Err(CmdbError::Rejected {
                    status: 400,
                    message: format!("{} {} failed validation", kind, label),
                });
            }
        }
        Ok(())
    }

    /// Consumes a pending one-shot list failure
    fn check_list(&mut self, kind: EntityKind) -> CmdbResult<()> {
        if self.failures.next_list.remove(&kind) {
            return Err(CmdbError::Transient(format!("{} list rate limited", kind)));
        }
        Ok(())
    }

    fn check_bulk(&self, kind: EntityKind) -> CmdbResult<()> {
        if self.failures.bulk.contains(&kind) {
            return Err(CmdbError::Transient(format!(
                "bulk {} endpoint unavailable",
                kind
            )));
        }
        Ok(())
    }

    fn existing(&self, kind: EntityKind, id: ObjectId) -> CmdbResult<&Attributes> {
        self.objects
            .get(&kind)
            .and_then(|objects| objects.get(&id))
            .ok_or_else(|| CmdbError::Rejected {
                status: 404,
                message: format!("{} {} not found", kind, id),
            })
    }

    fn merged(
        &self,
        kind: EntityKind,
        id: ObjectId,
        changes: &Attributes,
    ) -> CmdbResult<Attributes> {
        let mut attrs = self.existing(kind, id)?.clone();
        for (k, v) in changes {
            attrs.insert(k.clone(), v.clone());
        }
        Ok(attrs)
    }
}

/// Identity used for per-item rejection
fn label_of(attrs: &Attributes) -> Option<String> {
    if let Some(name) = attrs.get("name").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    if let Some(address) = attrs.get("address").and_then(Value::as_str) {
        return Some(address.to_string());
    }
    match (
        attrs.get("a_device").and_then(Value::as_str),
        attrs.get("a_interface").and_then(Value::as_str),
    ) {
        (Some(device), Some(interface)) => Some(format!("{}:{}", device, interface)),
        _ => None,
    }
}

fn has_id(attrs: &Attributes, key: &str, id: ObjectId) -> bool {
    attrs.get(key).and_then(Value::as_u64) == Some(id.0)
}

fn has_str(attrs: &Attributes, key: &str, expected: &str) -> bool {
    attrs.get(key).and_then(Value::as_str) == Some(expected)
}

fn in_scope(kind: EntityKind, id: ObjectId, attrs: &Attributes, scope: &Scope) -> bool {
    match scope {
        Scope::All => true,
        Scope::Device(device_id) => match kind {
            EntityKind::Device => id == *device_id,
            EntityKind::Cable => {
                has_id(attrs, "a_device_id", *device_id) || has_id(attrs, "b_device_id", *device_id)
            }
            _ => has_id(attrs, "device_id", *device_id),
        },
        Scope::Site(site) => has_str(attrs, "site", site),
        Scope::Tenant(tenant) => has_str(attrs, "tenant", tenant),
    }
}

fn matches_key(attrs: &Attributes, key: &LookupKey) -> bool {
    match key {
        LookupKey::Device { name } => has_str(attrs, "name", name),
        LookupKey::Interface { device_id, name } | LookupKey::InventoryItem { device_id, name } => {
            has_id(attrs, "device_id", *device_id) && has_str(attrs, "name", name)
        }
        LookupKey::IpAddress { address } => has_str(attrs, "address", address),
        LookupKey::Vlan { vid, site } => {
            let site_matches = match site {
                Some(site) => has_str(attrs, "site", site),
                None => attrs.get("site").map_or(true, Value::is_null),
            };
            attrs.get("vid").and_then(Value::as_u64) == Some(u64::from(*vid)) && site_matches
        }
    }
}

/// Simulated CMDB held in memory
#[derive(Debug, Default)]
pub struct InMemoryCmdb {
    state: Mutex<State>,
}

impl InMemoryCmdb {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert an object directly, bypassing call accounting
    pub fn seed(&self, kind: EntityKind, attrs: Attributes) -> ObjectId {
        self.state().insert(kind, attrs)
    }

    /// Snapshot of every object of `kind`
    pub fn objects(&self, kind: EntityKind) -> Vec<RemoteObject> {
        self.state()
            .objects
            .get(&kind)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(id, attrs)| RemoteObject::new(*id, attrs.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get one object
    pub fn get(&self, kind: EntityKind, id: ObjectId) -> Option<RemoteObject> {
        self.state()
            .objects
            .get(&kind)
            .and_then(|objects| objects.get(&id))
            .map(|attrs| RemoteObject::new(id, attrs.clone()))
    }

    /// Calls received so far
    pub fn calls(&self) -> CallLog {
        self.state().calls
    }

    /// Reset call accounting
    pub fn reset_calls(&self) {
        self.state().calls = CallLog::default();
    }

    /// Answer every call with an authentication failure
    pub fn fail_auth(&self, enabled: bool) {
        self.state().failures.auth = enabled;
    }

    /// Fail every bulk call for `kind` with a transient error
    pub fn fail_bulk(&self, kind: EntityKind) {
        self.state().failures.bulk.insert(kind);
    }

    /// Fail the next list of `kind` with a transient error
    pub fn fail_next_list(&self, kind: EntityKind) {
        self.state().failures.next_list.insert(kind);
    }

    /// Reject every write of the item identified by `label` (its name,
    /// address, or `device:interface` A-end for cables)
    pub fn reject(&self, kind: EntityKind, label: impl Into<String>) {
        self.state().failures.rejected.insert((kind, label.into()));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.state().failures = Failures::default();
    }
}

#[async_trait]
impl CmdbClient for InMemoryCmdb {
    async fn find_by_key(&self, key: &LookupKey) -> CmdbResult<Option<RemoteObject>> {
        let mut state = self.state();
        state.calls.find += 1;
        state.check_auth()?;

        Ok(state.objects.get(&key.kind()).and_then(|objects| {
            objects
                .iter()
                .find(|(_, attrs)| matches_key(attrs, key))
                .map(|(id, attrs)| RemoteObject::new(*id, attrs.clone()))
        }))
    }

    async fn list(&self, kind: EntityKind, scope: &Scope) -> CmdbResult<Vec<RemoteObject>> {
        let mut state = self.state();
        state.calls.list += 1;
        state.check_auth()?;
        state.check_list(kind)?;

        Ok(state
            .objects
            .get(&kind)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(id, attrs)| in_scope(kind, **id, attrs, scope))
                    .map(|(id, attrs)| RemoteObject::new(*id, attrs.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, kind: EntityKind, attrs: Attributes) -> CmdbResult<ObjectId> {
        let mut state = self.state();
        state.calls.create += 1;
        state.check_auth()?;
        state.check_item(kind, &attrs)?;

        let id = state.insert(kind, attrs);
        debug!("memory cmdb: created {} {}", kind, id);
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, id: ObjectId, attrs: Attributes) -> CmdbResult<()> {
        let mut state = self.state();
        state.calls.update += 1;
        state.check_auth()?;

        let merged = state.merged(kind, id, &attrs)?;
        state.check_item(kind, &merged)?;
        state.objects.entry(kind).or_default().insert(id, merged);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: ObjectId) -> CmdbResult<()> {
        let mut state = self.state();
        state.calls.delete += 1;
        state.check_auth()?;
        state.existing(kind, id)?;

        if let Some(objects) = state.objects.get_mut(&kind) {
            objects.remove(&id);
        }
        Ok(())
    }

    async fn bulk_create(
        &self,
        kind: EntityKind,
        items: Vec<Attributes>,
    ) -> CmdbResult<Vec<ObjectId>> {
        let mut state = self.state();
        state.calls.bulk_create += 1;
        state.check_auth()?;
        state.check_bulk(kind)?;
        for attrs in &items {
            state.check_item(kind, attrs)?;
        }

        Ok(items
            .into_iter()
            .map(|attrs| state.insert(kind, attrs))
            .collect())
    }

    async fn bulk_update(
        &self,
        kind: EntityKind,
        items: Vec<(ObjectId, Attributes)>,
    ) -> CmdbResult<()> {
        let mut state = self.state();
        state.calls.bulk_update += 1;
        state.check_auth()?;
        state.check_bulk(kind)?;

        let mut merged = Vec::with_capacity(items.len());
        for (id, changes) in &items {
            let attrs = state.merged(kind, *id, changes)?;
            state.check_item(kind, &attrs)?;
            merged.push((*id, attrs));
        }

        let objects = state.objects.entry(kind).or_default();
        for (id, attrs) in merged {
            objects.insert(id, attrs);
        }
        Ok(())
    }

    async fn bulk_delete(&self, kind: EntityKind, ids: Vec<ObjectId>) -> CmdbResult<()> {
        let mut state = self.state();
        state.calls.bulk_delete += 1;
        state.check_auth()?;
        state.check_bulk(kind)?;
        for id in &ids {
            state.existing(kind, *id)?;
        }

        if let Some(objects) = state.objects.get_mut(&kind) {
            for id in ids {
                objects.remove(&id);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory-cmdb"
    }
}
