// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS publishing of sync reports

use async_nats::{Client, ConnectOptions};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::PublishError;
use crate::stats::SyncReport;
use crate::subjects;

/// Result type for publishing
pub type PublishResult<T> = Result<T, PublishError>;

/// Configuration for the NATS connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    /// Client name shown in server monitoring
    pub name: String,
    pub connect_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "netbox-sync".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Failure notice for a sync that stopped on a fatal error
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure<'a> {
    pub device: &'a str,
    pub error: String,
}

/// Publishes sync reports as JSON
#[derive(Clone)]
pub struct ReportPublisher {
    client: Client,
}

impl ReportPublisher {
    /// Connect with the given configuration
    pub async fn connect(config: &NatsConfig) -> PublishResult<Self> {
        let options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.servers.join(","), options)
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        info!("Connected to NATS at {:?}", config.servers);
        Ok(Self::new(client))
    }

    /// Reuse an existing connection
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish a finished report on the completion subject
    pub async fn publish_report(&self, report: &SyncReport) -> PublishResult<()> {
        let subject = subjects::sync_completed();
        self.publish(&subject, report).await?;
        info!("Published sync report {} to {}", report.run_id, subject);
        Ok(())
    }

    /// Publish a fatal sync failure on the failure subject
    pub async fn publish_failure(&self, failure: &SyncFailure<'_>) -> PublishResult<()> {
        self.publish(&subjects::sync_failed(), failure).await
    }

    async fn publish<T: Serialize>(&self, subject: &str, message: &T) -> PublishResult<()> {
        let payload = encode(message)?;
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;
        debug!("Published message to subject: {}", subject);
        Ok(())
    }
}

/// JSON body of a published message
pub fn encode<T: Serialize>(message: &T) -> PublishResult<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}
