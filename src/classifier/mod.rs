// Copyright (c) 2025 - Cowboy AI, Inc.
//! Classifier
//!
//! Turns raw, vendor-shaped observation rows into canonical records. This is
//! the only place where interface type and switchport mode are decided; the
//! comparator only ever sees fully resolved records.
//!
//! Classification never fails. Unmatched input resolves to an explicit
//! default and unusable rows are dropped with a log line.
//!
//! ```text
//! DeviceObservation ──classify──▶ DeviceSnapshot
//!   device                          Device
//!   interfaces                      Vec<Interface>    (type, mode, LAG)
//!   ip_addresses + interface ips    Vec<IpAddress>
//!                                   Vec<Vlan>         (from SVI names)
//!   neighbors                       Vec<Cable>
//!   inventory                       Vec<InventoryItem>
//! ```

pub mod fields;
pub mod interface_type;
pub mod normalize;
pub mod switchport;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::collector::{
    DeviceObservation, RawDevice, RawInterface, RawInventoryItem, RawIpAddress, RawNeighbor,
};
use crate::config::SyncOptions;
use crate::model::{
    Cable, CableEndpoint, Device, Interface, InterfaceType, InventoryItem, IpAddress,
    IpAddressWithCidr, NetworkError, Record, Vlan,
};

pub use fields::{CanonicalField, FieldMapping, SourceField};
pub use interface_type::{TypeInputs, TypeResolution, TypeRule};
pub use switchport::{inherit_lag_modes, resolve_mode, AllowedVlans, VlanSet};

/// Longest VLAN name the CMDB accepts
const MAX_VLAN_NAME_LEN: usize = 64;

/// Every canonical record set for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub device: Device,
    pub interfaces: Vec<Interface>,
    pub ip_addresses: Vec<IpAddress>,
    pub vlans: Vec<Vlan>,
    pub cables: Vec<Cable>,
    pub inventory: Vec<InventoryItem>,
}

/// Raw-to-canonical converter
#[derive(Debug, Clone)]
pub struct Classifier {
    default_type: InterfaceType,
    mapping: FieldMapping,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(InterfaceType::Base1000T, FieldMapping::default())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Classifier {
    pub fn new(default_type: InterfaceType, mapping: FieldMapping) -> Self {
        Self {
            default_type,
            mapping,
        }
    }

    pub fn from_options(options: &SyncOptions) -> Self {
        Self::new(options.default_interface_type, options.field_mapping.clone())
    }

    pub fn default_type(&self) -> InterfaceType {
        self.default_type
    }

    /// Classify everything observed on one device
    pub fn classify(&self, observation: &DeviceObservation) -> DeviceSnapshot {
        let device = self.classify_device(&observation.device);
        let interfaces = self.classify_interfaces(&device.name, &observation.interfaces);
        let ip_addresses =
            self.classify_ip_addresses(&device, &observation.ip_addresses, &interfaces);
        let site = Some(device.site.clone()).filter(|s| !s.is_empty());
        let vlans = self.derive_vlans(&interfaces, site.as_deref());
        let cables = self.classify_cables(&device.name, &observation.neighbors);
        let inventory = self.classify_inventory(&device.name, &observation.inventory);

        debug!(
            "Classified {}: {} interfaces, {} addresses, {} vlans, {} cables, {} inventory items",
            device.name,
            interfaces.len(),
            ip_addresses.len(),
            vlans.len(),
            cables.len(),
            inventory.len()
        );

        DeviceSnapshot {
            device,
            interfaces,
            ip_addresses,
            vlans,
            cables,
            inventory,
        }
    }

    pub fn classify_device(&self, raw: &RawDevice) -> Device {
        Device {
            name: raw.hostname.trim().to_string(),
            site: non_empty(raw.site.as_deref()).unwrap_or_default(),
            role: non_empty(raw.role.as_deref()).unwrap_or_default(),
            tenant: non_empty(raw.tenant.as_deref()),
            serial: non_empty(raw.serial.as_deref()),
            model: non_empty(raw.model.as_deref()),
            platform: non_empty(raw.platform.as_deref()),
        }
    }

    fn resolve_type(&self, raw: &RawInterface) -> TypeResolution {
        interface_type::resolve(
            TypeInputs {
                media: self.mapping.read(CanonicalField::MediaDescriptor, raw),
                hardware: self.mapping.read(CanonicalField::HardwareDescriptor, raw),
                name: raw.name.trim(),
            },
            self.default_type,
        )
    }

    /// Classify one interface row in isolation (no LAG inheritance)
    pub fn classify_interface(&self, device: &str, raw: &RawInterface) -> Interface {
        let name = raw.name.trim();
        let resolution = self.resolve_type(raw);
        if resolution.rule == TypeRule::Default {
            debug!(
                "{}:{} matched no type rule, using {}",
                device, name, resolution.kind
            );
        }

        let ip = match non_empty(raw.ip_address.as_deref()) {
            Some(addr) => match IpAddressWithCidr::new(&addr) {
                Ok(ip) => Some(ip),
                Err(e) => {
                    warn!("{}:{} has an unusable address: {}", device, name, e);
                    None
                }
            },
            None => None,
        };

        Interface {
            device: device.to_string(),
            name: name.to_string(),
            kind: resolution.kind,
            mode: resolve_mode(raw.switchport_mode.as_deref(), raw.trunk_vlans.as_deref()),
            description: normalize::clean_description(
                self.mapping.read(CanonicalField::Description, raw),
            ),
            enabled: normalize::parse_enabled(raw.status.as_deref()),
            mtu: raw.mtu.as_deref().and_then(normalize::parse_mtu),
            speed: self
                .mapping
                .read(CanonicalField::Speed, raw)
                .and_then(normalize::parse_speed),
            lag: non_empty(raw.lag_parent.as_deref()).filter(|parent| parent != name),
            ip,
        }
    }

    /// Classify interface rows: duplicates dropped (first wins), aggregates
    /// typed and given their members' mode
    pub fn classify_interfaces(&self, device: &str, raws: &[RawInterface]) -> Vec<Interface> {
        let lag_parents: HashSet<&str> = raws
            .iter()
            .filter_map(|raw| raw.lag_parent.as_deref().map(str::trim))
            .filter(|parent| !parent.is_empty())
            .collect();

        let mut seen = HashSet::new();
        let mut interfaces = Vec::with_capacity(raws.len());

        for raw in raws {
            let name = raw.name.trim();
            if name.is_empty() {
                debug!("Skipping unnamed interface row on {}", device);
                continue;
            }
            if !seen.insert(name.to_string()) {
                warn!("Duplicate interface {}:{}, keeping the first", device, name);
                continue;
            }

            let mut iface = self.classify_interface(device, raw);
            // an aggregate named by its members but matching no rule
            if lag_parents.contains(name) && self.resolve_type(raw).rule == TypeRule::Default {
                iface.kind = InterfaceType::Lag;
            }
            interfaces.push(iface);
        }

        inherit_lag_modes(&mut interfaces);
        interfaces
    }

    fn parse_address(raw: &RawIpAddress) -> Result<IpAddressWithCidr, NetworkError> {
        let address = raw.address.trim();
        match non_empty(raw.netmask.as_deref()) {
            Some(mask) if !address.contains('/') => {
                if mask.contains('.') {
                    IpAddressWithCidr::with_netmask(address, &mask)
                } else {
                    IpAddressWithCidr::new(format!("{}/{}", address, mask.trim_start_matches('/')))
                }
            }
            _ => IpAddressWithCidr::new(address),
        }
    }

    /// Addresses from the IP table, then any interface address not already
    /// listed; de-duplicated by address
    pub fn classify_ip_addresses(
        &self,
        device: &Device,
        raws: &[RawIpAddress],
        interfaces: &[Interface],
    ) -> Vec<IpAddress> {
        let mut seen = HashSet::new();
        let mut addresses = Vec::new();

        let mut push = |address: IpAddressWithCidr, interface: &str| {
            let mut ip = IpAddress::assigned(address, &device.name, interface);
            ip.tenant = device.tenant.clone();
            if seen.insert(ip.key()) {
                addresses.push(ip);
            } else {
                debug!("Address {} already assigned on {}", ip.key(), device.name);
            }
        };

        for raw in raws {
            let interface = raw.interface.trim();
            if interface.is_empty() || raw.address.trim().is_empty() {
                continue;
            }
            match Self::parse_address(raw) {
                Ok(address) => push(address, interface),
                Err(e) => warn!(
                    "Dropping address row {} on {}:{}: {}",
                    raw.address, device.name, interface, e
                ),
            }
        }

        for iface in interfaces {
            if let Some(ip) = &iface.ip {
                push(ip.clone(), &iface.name);
            }
        }

        addresses
    }

    /// One VLAN per SVI, named after the SVI description when it has one
    pub fn derive_vlans(&self, interfaces: &[Interface], site: Option<&str>) -> Vec<Vlan> {
        let mut seen = HashSet::new();
        interfaces
            .iter()
            .filter_map(|iface| {
                let vid = normalize::svi_vlan(&iface.name)?;
                if !seen.insert(vid) {
                    return None;
                }
                let name = if iface.description.is_empty() {
                    format!("VLAN{}", vid)
                } else {
                    iface.description.chars().take(MAX_VLAN_NAME_LEN).collect()
                };
                Some(Vlan {
                    vid,
                    site: site.map(str::to_string),
                    name,
                })
            })
            .collect()
    }

    /// Cables from discovery neighbors; self-loops and incomplete rows are
    /// dropped
    pub fn classify_cables(&self, device: &str, neighbors: &[RawNeighbor]) -> Vec<Cable> {
        let mut seen = HashSet::new();
        let mut cables = Vec::new();

        for neighbor in neighbors {
            let local = neighbor.local_interface.trim();
            let remote_interface = neighbor.remote_interface.trim();
            let Some(remote_device) = normalize::neighbor_name(&neighbor.remote_device) else {
                continue;
            };
            if local.is_empty() || remote_interface.is_empty() {
                debug!("Skipping incomplete neighbor row on {}", device);
                continue;
            }
            if remote_device == device {
                debug!("Skipping self-loop {}:{}", device, local);
                continue;
            }

            let cable = Cable::new(
                CableEndpoint::new(device, local),
                CableEndpoint::new(remote_device, remote_interface),
            );
            if seen.insert(cable.key()) {
                cables.push(cable);
            }
        }

        cables
    }

    /// Inventory items; repeated names get the lowest free ` #n` suffix in
    /// report order, so every emitted name is unique
    pub fn classify_inventory(
        &self,
        device: &str,
        raws: &[RawInventoryItem],
    ) -> Vec<InventoryItem> {
        let mut emitted: HashSet<String> = HashSet::new();
        let mut suffixes: HashMap<String, usize> = HashMap::new();
        let mut items = Vec::with_capacity(raws.len());

        for raw in raws {
            let base = raw.name.trim();
            if base.is_empty() {
                debug!("Skipping unnamed inventory row on {}", device);
                continue;
            }
            let name = if emitted.contains(base) {
                let n = suffixes.entry(base.to_string()).or_insert(1);
                loop {
                    *n += 1;
                    let candidate = format!("{} #{}", base, n);
                    if !emitted.contains(&candidate) {
                        break candidate;
                    }
                }
            } else {
                base.to_string()
            };
            emitted.insert(name.clone());

            items.push(InventoryItem {
                device: device.to_string(),
                name,
                serial: non_empty(raw.serial.as_deref()),
                part_id: non_empty(raw.part_id.as_deref()),
                vendor: non_empty(raw.vendor.as_deref()),
                description: normalize::clean_description(raw.description.as_deref()),
            });
        }

        items
    }
}
