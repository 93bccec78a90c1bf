// Copyright (c) 2025 - Cowboy AI, Inc.
//! CMDB Client Adapter
//!
//! The narrow contract the reconciliation engine drives. Adapters translate
//! between the engine's flat attribute schema and the wire format of a
//! concrete system of record.
//!
//! ```text
//! find_by_key(key)            -> Option<RemoteObject>
//! list(kind, scope)           -> Vec<RemoteObject>
//! create(kind, attrs)         -> ObjectId
//! update(kind, id, attrs)     -> ()
//! delete(kind, id)            -> ()
//! bulk_create / bulk_update / bulk_delete
//! ```
//!
//! Bulk calls are all-or-nothing from the engine's point of view: a single
//! error stands for failure of the whole batch.
//!
//! # Implementations
//!
//! - [`memory::InMemoryCmdb`] - simulated store with call accounting and
//!   failure injection
//! - `netbox::NetBoxClient` - NetBox REST API (feature `netbox`)

pub mod memory;

#[cfg(feature = "netbox")]
pub mod netbox;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CmdbResult;
use crate::model::{Attributes, EntityKind};

pub use memory::InMemoryCmdb;

#[cfg(feature = "netbox")]
pub use netbox::NetBoxClient;

/// Identifier assigned by the CMDB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An object as held by the CMDB, in the flat attribute schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub id: ObjectId,
    pub attrs: Attributes,
}

impl RemoteObject {
    pub fn new(id: ObjectId, attrs: Attributes) -> Self {
        Self { id, attrs }
    }

    /// Merge changed attributes in place
    pub fn apply(&mut self, changes: &Attributes) {
        for (k, v) in changes {
            self.attrs.insert(k.clone(), v.clone());
        }
    }
}

/// Natural-key lookup of a single object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKey {
    Device { name: String },
    Interface { device_id: ObjectId, name: String },
    IpAddress { address: String },
    Vlan { vid: u16, site: Option<String> },
    InventoryItem { device_id: ObjectId, name: String },
}

impl LookupKey {
    pub fn device(name: impl Into<String>) -> Self {
        Self::Device { name: name.into() }
    }

    pub fn interface(device_id: ObjectId, name: impl Into<String>) -> Self {
        Self::Interface {
            device_id,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Device { .. } => EntityKind::Device,
            Self::Interface { .. } => EntityKind::Interface,
            Self::IpAddress { .. } => EntityKind::IpAddress,
            Self::Vlan { .. } => EntityKind::Vlan,
            Self::InventoryItem { .. } => EntityKind::InventoryItem,
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { name } => write!(f, "device {}", name),
            Self::Interface { device_id, name } => {
                write!(f, "interface {} on device {}", name, device_id)
            }
            Self::IpAddress { address } => write!(f, "ip-address {}", address),
            Self::Vlan { vid, site } => {
                write!(f, "vlan {} at {}", vid, site.as_deref().unwrap_or("global"))
            }
            Self::InventoryItem { device_id, name } => {
                write!(f, "inventory item {} on device {}", name, device_id)
            }
        }
    }
}

/// Filter for `list`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Every object of the kind; only meaningful for small global kinds
    All,
    /// Objects owned by (or terminating on) a device
    Device(ObjectId),
    Site(String),
    Tenant(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Device(id) => write!(f, "device {}", id),
            Scope::Site(site) => write!(f, "site {}", site),
            Scope::Tenant(tenant) => write!(f, "tenant {}", tenant),
        }
    }
}

/// Client contract for a CMDB
///
/// Errors must be classified: authentication and permission failures are
/// fatal and propagated as-is, everything else is treated as recoverable.
#[async_trait]
pub trait CmdbClient: Send + Sync {
    /// Look up one object by natural key
    async fn find_by_key(&self, key: &LookupKey) -> CmdbResult<Option<RemoteObject>>;

    /// List every object of `kind` within `scope`
    async fn list(&self, kind: EntityKind, scope: &Scope) -> CmdbResult<Vec<RemoteObject>>;

    /// Create one object and return its identifier
    async fn create(&self, kind: EntityKind, attrs: Attributes) -> CmdbResult<ObjectId>;

    /// Apply changed attributes to one object
    async fn update(&self, kind: EntityKind, id: ObjectId, attrs: Attributes) -> CmdbResult<()>;

    /// Delete one object
    async fn delete(&self, kind: EntityKind, id: ObjectId) -> CmdbResult<()>;

    /// Create many objects in one request; identifiers are returned in
    /// request order
    async fn bulk_create(
        &self,
        kind: EntityKind,
        items: Vec<Attributes>,
    ) -> CmdbResult<Vec<ObjectId>>;

    /// Update many objects in one request
    async fn bulk_update(
        &self,
        kind: EntityKind,
        items: Vec<(ObjectId, Attributes)>,
    ) -> CmdbResult<()>;

    /// Delete many objects in one request
    async fn bulk_delete(&self, kind: EntityKind, ids: Vec<ObjectId>) -> CmdbResult<()>;

    /// Name of this adapter, for logs
    fn name(&self) -> &str;
}
