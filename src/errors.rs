// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for reconciliation operations
//!
//! Errors are layered the way the sync pipeline is layered:
//!
//! - [`CmdbError`] - raised by a CMDB client adapter
//! - [`SyncError`] - raised by an entity-type sync call; only fatal remote
//!   errors and caller errors surface here, everything else is recorded in
//!   statistics
//! - [`ConfigError`] - raised while loading options
//! - [`PublishError`] - raised while publishing reports over NATS

use thiserror::Error;

/// Errors returned by a CMDB client adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CmdbError {
    /// Credentials were rejected
    #[error("CMDB authentication failed: {0}")]
    Auth(String),

    /// Credentials are valid but lack permission for the operation
    #[error("CMDB permission denied: {0}")]
    Permission(String),

    /// Rate limit, timeout, connection reset or server-side failure
    #[error("Transient CMDB failure: {0}")]
    Transient(String),

    /// The CMDB refused the request data
    #[error("CMDB rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The CMDB answered with something we could not interpret
    #[error("Failed to decode CMDB response: {0}")]
    Decode(String),
}

impl CmdbError {
    /// Fatal errors are propagated immediately and never degrade to
    /// per-item fallback; retrying with the same credentials cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CmdbError::Auth(_) | CmdbError::Permission(_))
    }

    /// Rate limits and timeouts
    pub fn is_transient(&self) -> bool {
        matches!(self, CmdbError::Transient(_))
    }
}

impl From<serde_json::Error> for CmdbError {
    fn from(err: serde_json::Error) -> Self {
        CmdbError::Decode(err.to_string())
    }
}

#[cfg(feature = "netbox")]
impl From<reqwest::Error> for CmdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CmdbError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            CmdbError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            // Timeouts, refused connections and resets
            CmdbError::Transient(err.to_string())
        }
    }
}

/// Result type for CMDB client operations
pub type CmdbResult<T> = Result<T, CmdbError>;

/// Errors that abort an entity-type sync call
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fatal remote failure (authentication or permission)
    #[error("CMDB error: {0}")]
    Cmdb(#[from] CmdbError),

    /// A destructive operation was requested without its mandatory scope
    #[error("Refusing {operation}: a scope guard is required")]
    MissingScopeGuard { operation: &'static str },

    /// A scope guard was supplied but cannot select anything safely
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Configuration errors, raised at load time
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable absent
    #[error("Missing configuration value: {0}")]
    Missing(String),

    /// Value present but unparseable
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },

    /// Interface type not in the canonical set
    #[error("Unknown interface type: {0}")]
    UnknownInterfaceType(String),

    /// Raw source identifier not in the closed source set
    #[error("Unknown source field: {0}")]
    UnknownSourceField(String),

    /// Canonical field identifier not mappable
    #[error("Unknown canonical field: {0}")]
    UnknownCanonicalField(String),

    /// Source field cannot feed the requested canonical field
    #[error("Source field {source_field} cannot feed {canonical}")]
    IncompatibleSource {
        canonical: String,
        source_field: String,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors publishing sync reports
#[derive(Debug, Error)]
pub enum PublishError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    Connection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    Publish(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<async_nats::Error> for PublishError {
    fn from(err: async_nats::Error) -> Self {
        PublishError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Serialization(err.to_string())
    }
}
