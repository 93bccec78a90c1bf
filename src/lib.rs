// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network-device to NetBox reconciliation for the Composable Information Machine
//!
//! Collected device state is classified into canonical records, compared
//! against what the CMDB holds, and reconciled through a batch executor that
//! degrades from bulk calls to per-item calls when a bulk call fails.
//!
//! ```text
//! collector ─▶ classifier ─▶ sync (cache, diff, executor) ─▶ CmdbClient
//!                                      │
//!                                      └─▶ SyncReport ─▶ NATS
//! ```

pub mod cache;
pub mod classifier;
pub mod cmdb;
pub mod collector;
pub mod config;
pub mod diff;
pub mod errors;
pub mod executor;
pub mod model;
pub mod nats;
pub mod stats;
pub mod subjects;
pub mod sync;

// Re-export commonly used types
pub use cache::{CacheStats, SessionCache};
pub use classifier::{Classifier, DeviceSnapshot};
pub use cmdb::{CmdbClient, InMemoryCmdb, LookupKey, ObjectId, RemoteObject, Scope};
pub use config::{NetBoxConfig, SyncOptions, UpdatePolicy};
pub use diff::{diff, ChangeCategory, Diff, Observed};
pub use errors::{CmdbError, CmdbResult, ConfigError, SyncError, SyncResult};
pub use model::{EntityKind, Record};
pub use nats::{NatsConfig, ReportPublisher};
pub use stats::{SyncOutcome, SyncReport, SyncStats};
pub use sync::{full_sync, DeviceScope, SyncSession};

#[cfg(feature = "netbox")]
pub use cmdb::NetBoxClient;
