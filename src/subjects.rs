// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject hierarchy for sync traffic
//!
//! Subjects follow the infrastructure pattern:
//!
//! ```text
//! infrastructure.{aggregate}.{operation}
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cim_netbox_sync::subjects::{Aggregate, Operation, SubjectBuilder};
//!
//! let subject = SubjectBuilder::new(Aggregate::NetBoxSync)
//!     .operation(Operation::Completed)
//!     .build();
//! assert_eq!(subject, "infrastructure.netbox.sync.completed");
//!
//! let wildcard = SubjectBuilder::new(Aggregate::Collector).build();
//! assert_eq!(wildcard, "infrastructure.collector.>");
//! ```

use std::fmt;

/// Root namespace for all infrastructure subjects
pub const INFRASTRUCTURE_ROOT: &str = "infrastructure";

/// Producers of sync-related messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    /// Device collectors publishing raw observations
    Collector,
    /// The reconciliation engine
    NetBoxSync,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Collector => write!(f, "collector"),
            Aggregate::NetBoxSync => write!(f, "netbox.sync"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A device was observed by a collector
    Observed,
    /// A full sync finished
    Completed,
    /// A full sync stopped on a fatal error
    Failed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Observed => write!(f, "observed"),
            Operation::Completed => write!(f, "completed"),
            Operation::Failed => write!(f, "failed"),
        }
    }
}

/// Builder for sync subjects
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    aggregate: Aggregate,
    operation: Option<Operation>,
}

impl SubjectBuilder {
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            aggregate,
            operation: None,
        }
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Subject for the operation, or a wildcard over the aggregate when no
    /// operation was set
    pub fn build(self) -> String {
        match self.operation {
            Some(operation) => format!("{}.{}.{}", INFRASTRUCTURE_ROOT, self.aggregate, operation),
            None => format!("{}.{}.>", INFRASTRUCTURE_ROOT, self.aggregate),
        }
    }
}

pub fn observation_received() -> String {
    SubjectBuilder::new(Aggregate::Collector)
        .operation(Operation::Observed)
        .build()
}

pub fn sync_completed() -> String {
    SubjectBuilder::new(Aggregate::NetBoxSync)
        .operation(Operation::Completed)
        .build()
}

pub fn sync_failed() -> String {
    SubjectBuilder::new(Aggregate::NetBoxSync)
        .operation(Operation::Failed)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_subjects() {
        assert_eq!(observation_received(), "infrastructure.collector.observed");
        assert_eq!(sync_completed(), "infrastructure.netbox.sync.completed");
        assert_eq!(sync_failed(), "infrastructure.netbox.sync.failed");
    }

    #[test]
    fn test_wildcard_without_operation() {
        assert_eq!(
            SubjectBuilder::new(Aggregate::NetBoxSync).build(),
            "infrastructure.netbox.sync.>"
        );
    }
}
