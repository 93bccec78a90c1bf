// Copyright (c) 2025 - Cowboy AI, Inc.
//! Source field mapping
//!
//! Parsers for different platforms put the same information in different
//! columns. A [`FieldMapping`] says which raw column feeds which canonical
//! input, as an ordered list of candidates (first non-empty wins).
//!
//! Both sides are closed enumerations. Mappings are validated when they are
//! loaded: an unknown identifier, or a source that cannot feed the requested
//! canonical field, is a [`ConfigError`] rather than a silently empty field.
//!
//! ```rust
//! use cim_netbox_sync::classifier::{CanonicalField, FieldMapping, SourceField};
//!
//! let mapping = FieldMapping::parse("description=alias|description, media=media_type").unwrap();
//! assert_eq!(
//!     mapping.sources(CanonicalField::Description),
//!     &[SourceField::Alias, SourceField::Description]
//! );
//! assert!(FieldMapping::parse("description=serial").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::collector::RawInterface;
use crate::errors::{ConfigError, ConfigResult};

/// Raw interface column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceField {
    Description,
    Alias,
    MediaType,
    Transceiver,
    Hardware,
    Speed,
    Bandwidth,
}

impl SourceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Alias => "alias",
            Self::MediaType => "media_type",
            Self::Transceiver => "transceiver",
            Self::Hardware => "hardware",
            Self::Speed => "speed",
            Self::Bandwidth => "bandwidth",
        }
    }

    /// Read this column from a raw row; blank values count as absent
    pub fn read<'a>(&self, raw: &'a RawInterface) -> Option<&'a str> {
        let value = match self {
            Self::Description => raw.description.as_deref(),
            Self::Alias => raw.alias.as_deref(),
            Self::MediaType => raw.media_type.as_deref(),
            Self::Transceiver => raw.transceiver.as_deref(),
            Self::Hardware => raw.hardware.as_deref(),
            Self::Speed => raw.speed.as_deref(),
            Self::Bandwidth => raw.bandwidth.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "description" => Ok(Self::Description),
            "alias" => Ok(Self::Alias),
            "media_type" | "media" => Ok(Self::MediaType),
            "transceiver" | "optic" => Ok(Self::Transceiver),
            "hardware" => Ok(Self::Hardware),
            "speed" => Ok(Self::Speed),
            "bandwidth" | "bw" => Ok(Self::Bandwidth),
            other => Err(ConfigError::UnknownSourceField(other.to_string())),
        }
    }
}

/// Classifier input fed from a raw column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Description,
    /// Installed transceiver / media descriptor (type rule 1)
    MediaDescriptor,
    /// Port capability descriptor (type rule 2)
    HardwareDescriptor,
    Speed,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        Self::Description,
        Self::MediaDescriptor,
        Self::HardwareDescriptor,
        Self::Speed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::MediaDescriptor => "media",
            Self::HardwareDescriptor => "hardware",
            Self::Speed => "speed",
        }
    }

    /// Sources permitted to feed this field
    pub fn permitted_sources(&self) -> &'static [SourceField] {
        match self {
            Self::Description => &[SourceField::Description, SourceField::Alias],
            Self::MediaDescriptor => &[SourceField::Transceiver, SourceField::MediaType],
            Self::HardwareDescriptor => &[SourceField::Hardware, SourceField::MediaType],
            Self::Speed => &[SourceField::Speed, SourceField::Bandwidth],
        }
    }

    /// Default candidates, in priority order
    fn default_sources(&self) -> Vec<SourceField> {
        match self {
            Self::Description => vec![SourceField::Description],
            Self::MediaDescriptor => vec![SourceField::Transceiver, SourceField::MediaType],
            Self::HardwareDescriptor => vec![SourceField::Hardware],
            Self::Speed => vec![SourceField::Speed, SourceField::Bandwidth],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "description" => Ok(Self::Description),
            "media" | "media_descriptor" => Ok(Self::MediaDescriptor),
            "hardware" | "hardware_descriptor" => Ok(Self::HardwareDescriptor),
            "speed" => Ok(Self::Speed),
            other => Err(ConfigError::UnknownCanonicalField(other.to_string())),
        }
    }
}

/// Validated canonical-field to source-column table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    entries: BTreeMap<CanonicalField, Vec<SourceField>>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            entries: CanonicalField::ALL
                .iter()
                .map(|field| (*field, field.default_sources()))
                .collect(),
        }
    }
}

impl FieldMapping {
    /// Override one canonical field, checking every source is permitted
    pub fn set(&mut self, field: CanonicalField, sources: Vec<SourceField>) -> ConfigResult<()> {
        if sources.is_empty() {
            return Err(ConfigError::Invalid {
                key: field.to_string(),
                value: String::new(),
            });
        }
        for source in &sources {
            if !field.permitted_sources().contains(source) {
                return Err(ConfigError::IncompatibleSource {
                    canonical: field.to_string(),
                    source_field: source.to_string(),
                });
            }
        }
        self.entries.insert(field, sources);
        Ok(())
    }

    /// Parse `canonical=source[|source...]` pairs separated by commas,
    /// starting from the default table
    pub fn parse(spec: &str) -> ConfigResult<Self> {
        let mut mapping = Self::default();

        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, sources) = pair.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "field mapping".to_string(),
                value: pair.to_string(),
            })?;

            let field: CanonicalField = field.parse()?;
            let sources = sources
                .split('|')
                .map(SourceField::from_str)
                .collect::<ConfigResult<Vec<_>>>()?;

            mapping.set(field, sources)?;
        }

        Ok(mapping)
    }

    /// Candidate sources for a canonical field
    pub fn sources(&self, field: CanonicalField) -> &[SourceField] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a canonical field against a raw row
    pub fn read<'a>(&self, field: CanonicalField, raw: &'a RawInterface) -> Option<&'a str> {
        self.sources(field).iter().find_map(|source| source.read(raw))
    }
}
