// Copyright (c) 2025 - Cowboy AI, Inc.
//! NetBox Sync Service
//!
//! Listens on a NATS JetStream consumer for device observations, reconciles
//! each device into NetBox, and publishes the sync report.
//!
//! - Observation → classify → full sync → report on `infrastructure.netbox.sync.completed`
//!
//! Run with: cargo run --bin netbox-sync --features netbox
//!
//! Prerequisites:
//! 1. NATS server running (default: localhost:4222)
//! 2. NetBox API accessible (via NETBOX_URL environment variable)
//! 3. NetBox API token set (via NETBOX_API_TOKEN environment variable)

use anyhow::{Context, Result};
use async_nats::jetstream;
use cim_netbox_sync::{
    collector::DeviceObservation,
    full_sync,
    nats::SyncFailure,
    subjects, Classifier, NetBoxClient, NetBoxConfig, ReportPublisher, SyncError, SyncOptions,
    SyncSession,
};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for the sync service
#[derive(Debug, Clone)]
struct ServiceConfig {
    nats_url: String,
    /// JetStream stream carrying observations
    stream_name: String,
    consumer_name: String,
    netbox: NetBoxConfig,
    sync: SyncOptions,
}

impl ServiceConfig {
    fn from_env() -> Result<Self> {
        let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "localhost:4222".to_string());

        let stream_name =
            std::env::var("NATS_STREAM").unwrap_or_else(|_| "INFRASTRUCTURE".to_string());

        let consumer_name =
            std::env::var("NATS_CONSUMER").unwrap_or_else(|_| "netbox-sync".to_string());

        let netbox = NetBoxConfig::from_env().context("Invalid NetBox configuration")?;
        let sync = SyncOptions::from_env().context("Invalid sync options")?;

        Ok(Self {
            nats_url,
            stream_name,
            consumer_name,
            netbox,
            sync,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting NetBox sync service");

    let config = ServiceConfig::from_env()?;
    info!("Configuration loaded:");
    info!("  - NATS URL: {}", config.nats_url);
    info!("  - Stream: {}", config.stream_name);
    info!("  - Consumer: {}", config.consumer_name);
    info!("  - NetBox URL: {}", config.netbox.base_url);
    info!("  - Dry run: {}", config.sync.dry_run);

    let netbox =
        NetBoxClient::new(config.netbox.clone()).context("Failed to create NetBox client")?;
    netbox
        .health_check()
        .await
        .context("NetBox health check failed")?;
    info!("NetBox reachable");

    info!("Connecting to NATS at {}", config.nats_url);
    let client = async_nats::connect(&config.nats_url)
        .await
        .context("Failed to connect to NATS")?;
    let publisher = ReportPublisher::new(client.clone());
    let jetstream = jetstream::new(client);

    let stream = match jetstream.get_stream(&config.stream_name).await {
        Ok(stream) => stream,
        Err(_) => {
            info!("Stream '{}' not found, creating...", config.stream_name);
            jetstream
                .create_stream(jetstream::stream::Config {
                    name: config.stream_name.clone(),
                    subjects: vec!["infrastructure.>".to_string()],
                    max_age: Duration::from_secs(7 * 24 * 60 * 60),
                    ..Default::default()
                })
                .await
                .context("Failed to create stream")?
        }
    };

    let consumer = match stream.get_consumer(&config.consumer_name).await {
        Ok(consumer) => consumer,
        Err(_) => {
            info!("Consumer '{}' not found, creating...", config.consumer_name);
            stream
                .create_consumer(jetstream::consumer::pull::Config {
                    durable_name: Some(config.consumer_name.clone()),
                    filter_subject: subjects::observation_received(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                })
                .await
                .context("Failed to create consumer")?
        }
    };

    let classifier = Classifier::from_options(&config.sync);

    info!("Waiting for observations on {}", subjects::observation_received());
    let messages = consumer
        .stream()
        .max_messages_per_batch(10)
        .messages()
        .await
        .context("Failed to start consuming messages")?;

    tokio::pin!(messages);

    let mut synced = 0u64;
    let mut errors = 0u64;

    while let Some(message) = messages.next().await {
        let msg = match message {
            Ok(msg) => msg,
            Err(e) => {
                errors += 1;
                error!("Error receiving message: {} (total errors: {})", e, errors);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        debug!("Received message from subject: {}", msg.subject);

        let observation = match serde_json::from_slice::<DeviceObservation>(&msg.payload) {
            Ok(observation) => observation,
            Err(e) => {
                errors += 1;
                error!("Failed to parse observation: {} (total errors: {})", e, errors);
                // Bad message format, retry won't help
                if let Err(e) = msg.ack_with(jetstream::AckKind::Term).await {
                    warn!("Failed to terminate message: {}", e);
                }
                continue;
            }
        };

        let snapshot = classifier.classify(&observation);
        let device = snapshot.device.name.clone();

        let mut session = SyncSession::new(&netbox, config.sync.clone());
        let result = full_sync(&mut session, std::slice::from_ref(&snapshot)).await;
        session.finish();

        match result {
            Ok(report) => {
                synced += 1;
                if let Err(e) = publisher.publish_report(&report).await {
                    warn!("Failed to publish report for {}: {}", device, e);
                }
                if let Err(e) = msg.ack().await {
                    warn!("Failed to acknowledge message: {}", e);
                }
            }
            Err(e) => {
                errors += 1;
                error!("Sync of {} stopped: {} (total errors: {})", device, e, errors);

                let failure = SyncFailure {
                    device: &device,
                    error: e.to_string(),
                };
                if let Err(e) = publisher.publish_failure(&failure).await {
                    warn!("Failed to publish failure for {}: {}", device, e);
                }

                // Fatal CMDB errors may clear once credentials are fixed
                let ack = match e {
                    SyncError::Cmdb(_) => jetstream::AckKind::Nak(None),
                    _ => jetstream::AckKind::Term,
                };
                if let Err(e) = msg.ack_with(ack).await {
                    warn!("Failed to reject message: {}", e);
                }
            }
        }

        if (synced + errors) % 100 == 0 {
            info!("Statistics: {} devices synced, {} errors", synced, errors);
        }
    }

    warn!("Message stream ended unexpectedly");
    Ok(())
}
