// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration
//!
//! Loaded once at startup from environment variables. Every value is checked
//! at load time; nothing is silently defaulted after a parse failure.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `NETBOX_URL` | NetBox base URL | required |
//! | `NETBOX_API_TOKEN` | API token | required |
//! | `NETBOX_TIMEOUT` | request timeout, seconds | 30 |
//! | `NETBOX_PAGE_SIZE` | list page size | 250 |
//! | `SYNC_DRY_RUN` | compute diffs without writing | false |
//! | `SYNC_UPDATE` | kinds allowed to update (`devices,interfaces,...`, `all`, `none`) | none |
//! | `SYNC_DEFAULT_INTERFACE_TYPE` | fallback interface type | `1000base-t` |
//! | `SYNC_FIELD_MAP` | `canonical=source[\|source]` pairs | built-in table |
//! | `SYNC_BULK_CHUNK` | items per bulk request | 100 |

use serde::{Deserialize, Serialize};

use crate::classifier::FieldMapping;
use crate::errors::{ConfigError, ConfigResult};
use crate::model::{EntityKind, InterfaceType};

/// Configuration for the NetBox connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBoxConfig {
    /// NetBox base URL (e.g., "https://netbox.example.com")
    pub base_url: String,

    /// API token for authentication
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Objects requested per page when listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    250
}

impl Default for NetBoxConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl NetBoxConfig {
    /// Load from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing(key.to_string()))
        };

        let base_url = required("NETBOX_URL")?.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "NETBOX_URL".to_string(),
                value: base_url,
            });
        }

        Ok(Self {
            base_url,
            api_token: required("NETBOX_API_TOKEN")?,
            timeout_secs: lookup("NETBOX_TIMEOUT")
                .map(|v| parse_number::<u64>("NETBOX_TIMEOUT", &v))
                .transpose()?
                .unwrap_or_else(default_timeout),
            page_size: lookup("NETBOX_PAGE_SIZE")
                .map(|v| parse_number::<usize>("NETBOX_PAGE_SIZE", &v))
                .transpose()?
                .unwrap_or_else(default_page_size),
        })
    }
}

/// Entity kinds allowed to update existing objects. Updates are opt-in;
/// VLANs and cables never update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    pub devices: bool,
    pub interfaces: bool,
    pub ip_addresses: bool,
    pub inventory: bool,
}

impl UpdatePolicy {
    /// Every updatable kind enabled
    pub fn all() -> Self {
        Self {
            devices: true,
            interfaces: true,
            ip_addresses: true,
            inventory: true,
        }
    }

    pub fn allows(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Device => self.devices,
            EntityKind::Interface => self.interfaces,
            EntityKind::IpAddress => self.ip_addresses,
            EntityKind::InventoryItem => self.inventory,
            EntityKind::Vlan | EntityKind::Cable => false,
        }
    }

    /// Parse `all`, `none`, or a comma list of kinds
    pub fn parse(spec: &str) -> ConfigResult<Self> {
        let spec = spec.trim();
        match spec.to_lowercase().as_str() {
            "all" => return Ok(Self::all()),
            "" | "none" => return Ok(Self::default()),
            _ => {}
        }

        let mut policy = Self::default();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let invalid = || ConfigError::Invalid {
                key: "SYNC_UPDATE".to_string(),
                value: token.to_string(),
            };
            match EntityKind::parse(token).ok_or_else(invalid)? {
                EntityKind::Device => policy.devices = true,
                EntityKind::Interface => policy.interfaces = true,
                EntityKind::IpAddress => policy.ip_addresses = true,
                EntityKind::InventoryItem => policy.inventory = true,
                EntityKind::Vlan | EntityKind::Cable => return Err(invalid()),
            }
        }
        Ok(policy)
    }
}

/// Options for one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Compute diffs and statistics without writing to the CMDB
    pub dry_run: bool,

    pub update: UpdatePolicy,

    /// Type used when no classification rule matches
    pub default_interface_type: InterfaceType,

    pub field_mapping: FieldMapping,

    /// Items per bulk request
    pub bulk_chunk_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            update: UpdatePolicy::default(),
            default_interface_type: InterfaceType::Base1000T,
            field_mapping: FieldMapping::default(),
            bulk_chunk_size: 100,
        }
    }
}

impl SyncOptions {
    /// Load from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bulk_chunk_size = match lookup("SYNC_BULK_CHUNK") {
            Some(v) => {
                let size: usize = parse_number("SYNC_BULK_CHUNK", &v)?;
                if size == 0 {
                    return Err(ConfigError::Invalid {
                        key: "SYNC_BULK_CHUNK".to_string(),
                        value: v,
                    });
                }
                size
            }
            None => defaults.bulk_chunk_size,
        };

        Ok(Self {
            dry_run: lookup("SYNC_DRY_RUN")
                .map(|v| parse_bool("SYNC_DRY_RUN", &v))
                .transpose()?
                .unwrap_or(defaults.dry_run),
            update: lookup("SYNC_UPDATE")
                .map(|v| UpdatePolicy::parse(&v))
                .transpose()?
                .unwrap_or(defaults.update),
            default_interface_type: lookup("SYNC_DEFAULT_INTERFACE_TYPE")
                .map(|v| v.parse::<InterfaceType>())
                .transpose()?
                .unwrap_or(defaults.default_interface_type),
            field_mapping: lookup("SYNC_FIELD_MAP")
                .map(|v| FieldMapping::parse(&v))
                .transpose()?
                .unwrap_or(defaults.field_mapping),
            bulk_chunk_size,
        })
    }

    /// Same options with writes disabled
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Same options with every updatable kind enabled
    pub fn with_updates(mut self) -> Self {
        self.update = UpdatePolicy::all();
        self
    }
}
