// Copyright (c) 2025 - Cowboy AI, Inc.
//! Collector Contract
//!
//! Raw per-device observation rows as produced by a collector (command
//! execution plus template parsing), and a bounded worker pool that runs one
//! collection task per device.
//!
//! Rows are vendor-shaped: every column is optional and free text. The
//! [`classifier`](crate::classifier) turns them into canonical records.
//!
//! A failed device never affects the others: [`collect_all`] returns one
//! [`CollectionResult`] per target, in target order, with either an
//! observation or a failure marker.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Device identity and placement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDevice {
    pub hostname: String,
    pub site: Option<String>,
    pub role: Option<String>,
    pub tenant: Option<String>,
    pub serial: Option<String>,
    pub model: Option<String>,
    pub platform: Option<String>,
}

/// One interface row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInterface {
    pub name: String,
    pub description: Option<String>,
    pub alias: Option<String>,
    pub media_type: Option<String>,
    pub transceiver: Option<String>,
    pub hardware: Option<String>,
    pub switchport_mode: Option<String>,
    pub trunk_vlans: Option<String>,
    pub mtu: Option<String>,
    pub speed: Option<String>,
    pub bandwidth: Option<String>,
    pub status: Option<String>,
    /// Parent aggregate, as named by the device
    pub lag_parent: Option<String>,
    /// Primary address, with or without prefix length
    pub ip_address: Option<String>,
}

/// Address row from an IP table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIpAddress {
    pub interface: String,
    pub address: String,
    /// Dotted mask or prefix length when `address` carries none
    pub netmask: Option<String>,
}

/// Discovery-protocol neighbor row (LLDP/CDP)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNeighbor {
    pub local_interface: String,
    pub remote_device: String,
    pub remote_interface: String,
}

/// Hardware inventory row (modules, optics, power supplies)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInventoryItem {
    pub name: String,
    pub description: Option<String>,
    pub part_id: Option<String>,
    pub serial: Option<String>,
    pub vendor: Option<String>,
}

/// Everything collected from one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceObservation {
    pub device: RawDevice,
    pub interfaces: Vec<RawInterface>,
    pub ip_addresses: Vec<RawIpAddress>,
    pub neighbors: Vec<RawNeighbor>,
    pub inventory: Vec<RawInventoryItem>,
}

/// A device to collect from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub hostname: String,
    pub address: String,
    pub platform: Option<String>,
}

impl DeviceTarget {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            platform: None,
        }
    }
}

/// Collection failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("Connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    #[error("Authentication to {0} failed")]
    Auth(String),

    #[error("Timed out collecting from {0}")]
    Timeout(String),

    #[error("Failed to parse output from {host}: {message}")]
    Parse { host: String, message: String },

    #[error("Collection task for {0} did not complete")]
    Aborted(String),
}

/// Outcome for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    pub target: DeviceTarget,
    pub observation: Option<DeviceObservation>,
    pub error: Option<CollectError>,
}

impl CollectionResult {
    pub fn succeeded(target: DeviceTarget, observation: DeviceObservation) -> Self {
        Self {
            target,
            observation: Some(observation),
            error: None,
        }
    }

    pub fn failed(target: DeviceTarget, error: CollectError) -> Self {
        Self {
            target,
            observation: None,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Produces an observation for one device
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    async fn collect(&self, target: &DeviceTarget) -> Result<DeviceObservation, CollectError>;
}

/// Run one collection task per target with at most `max_workers` in flight
pub async fn collect_all<C: Collector>(
    collector: Arc<C>,
    targets: Vec<DeviceTarget>,
    max_workers: usize,
) -> Vec<CollectionResult> {
    let permits = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();

    info!(
        "Collecting from {} devices with {} workers",
        targets.len(),
        max_workers.max(1)
    );

    for (index, target) in targets.iter().cloned().enumerate() {
        let collector = Arc::clone(&collector);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => collector.collect(&target).await,
                Err(_) => Err(CollectError::Aborted(target.hostname.clone())),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<DeviceObservation, CollectError>>> =
        targets.iter().map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!("Collection task panicked or was cancelled: {}", e),
        }
    }

    targets
        .into_iter()
        .zip(slots)
        .map(|(target, slot)| match slot {
            Some(Ok(observation)) => {
                debug!(
                    "Collected {} interfaces from {}",
                    observation.interfaces.len(),
                    target.hostname
                );
                CollectionResult::succeeded(target, observation)
            }
            Some(Err(e)) => {
                warn!("Collection from {} failed: {}", target.hostname, e);
                CollectionResult::failed(target, e)
            }
            None => {
                let error = CollectError::Aborted(target.hostname.clone());
                CollectionResult::failed(target, error)
            }
        })
        .collect()
}
