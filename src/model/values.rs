// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("Invalid netmask: {0}")]
    InvalidNetmask(String),

    #[error("Invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("Invalid MTU: {0} (must be 68-9216)")]
    InvalidMtu(u32),
}

/// IP Address with CIDR notation value object
///
/// The CMDB keys addresses by their CIDR string, so the canonical form always
/// carries a prefix length; a bare address is treated as a host route.
///
/// # Examples
///
/// ```rust
/// use cim_netbox_sync::model::IpAddressWithCidr;
///
/// let ip = IpAddressWithCidr::new("192.168.1.10/24").unwrap();
/// assert_eq!(ip.address().to_string(), "192.168.1.10");
/// assert_eq!(ip.prefix_length(), 24);
///
/// let masked = IpAddressWithCidr::with_netmask("10.0.0.1", "255.255.255.0").unwrap();
/// assert_eq!(masked.as_cidr(), "10.0.0.1/24");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IpAddressWithCidr {
    address: IpAddr,
    prefix_length: u8,
}

impl IpAddressWithCidr {
    /// Parse `address/prefix` or a bare address
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        if let Some((addr_str, prefix_str)) = cidr.split_once('/') {
            let address = IpAddr::from_str(addr_str)
                .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

            let prefix_length = prefix_str
                .parse::<u8>()
                .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

            Self::from_parts(address, prefix_length)
        } else {
            let address = IpAddr::from_str(cidr)
                .map_err(|_| NetworkError::InvalidIpAddress(cidr.to_string()))?;
            let prefix_length = Self::max_prefix(&address);
            Ok(Self {
                address,
                prefix_length,
            })
        }
    }

    /// Build from an IPv4 address and a dotted-quad netmask
    pub fn with_netmask(address: &str, netmask: &str) -> Result<Self, NetworkError> {
        let address = IpAddr::from_str(address.trim())
            .map_err(|_| NetworkError::InvalidIpAddress(address.to_string()))?;
        let mask = Ipv4Addr::from_str(netmask.trim())
            .map_err(|_| NetworkError::InvalidNetmask(netmask.to_string()))?;

        let bits = u32::from(mask);
        // contiguous ones followed by zeros
        if bits.leading_ones() + bits.trailing_zeros() != 32 {
            return Err(NetworkError::InvalidNetmask(netmask.to_string()));
        }

        Self::from_parts(address, bits.leading_ones() as u8)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > Self::max_prefix(&address) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn max_prefix(address: &IpAddr) -> u8 {
        match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    /// Get the IP address
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check if this is an IPv4 address
    pub fn is_ipv4(&self) -> bool {
        matches!(self.address, IpAddr::V4(_))
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.address, self.prefix_length)
    }
}

impl fmt::Display for IpAddressWithCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for IpAddressWithCidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// VLAN ID value object
///
/// Represents a VLAN ID (IEEE 802.1Q) with validation.
/// Invariants:
/// - Valid VLAN ID range (1-4094)
/// - VLAN 0 and 4095 are reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID
    pub const MAX: u16 = 4094;

    /// Create a new VLAN ID with validation
    pub fn new(id: u16) -> Result<Self, NetworkError> {
        if !(Self::MIN..=Self::MAX).contains(&id) {
            return Err(NetworkError::InvalidVlanId(id));
        }

        Ok(Self(id))
    }

    /// Get the VLAN ID value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// MTU value object
///
/// Invariants:
/// - 68 = minimum IPv4 MTU
/// - 9216 = largest jumbo frame commonly configured on switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mtu(u32);

impl Mtu {
    /// Minimum MTU (IPv4 minimum)
    pub const MIN: u32 = 68;

    /// Maximum MTU (switch jumbo frames)
    pub const MAX: u32 = 9216;

    /// Create a new MTU with validation
    pub fn new(size: u32) -> Result<Self, NetworkError> {
        if !(Self::MIN..=Self::MAX).contains(&size) {
            return Err(NetworkError::InvalidMtu(size));
        }

        Ok(Self(size))
    }

    /// Get the MTU value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Mtu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_address_cidr() {
        let ip = IpAddressWithCidr::new("192.168.1.10/24").unwrap();
        assert_eq!(ip.address().to_string(), "192.168.1.10");
        assert_eq!(ip.prefix_length(), 24);
        assert!(ip.is_ipv4());
        assert_eq!(ip.as_cidr(), "192.168.1.10/24");
    }

    #[test]
    fn test_bare_address_is_host_route() {
        assert_eq!(
            IpAddressWithCidr::new("192.168.1.10").unwrap().as_cidr(),
            "192.168.1.10/32"
        );
        assert_eq!(
            IpAddressWithCidr::new("2001:db8::1").unwrap().as_cidr(),
            "2001:db8::1/128"
        );
    }

    #[test]
    fn test_netmask() {
        let ip = IpAddressWithCidr::with_netmask("10.1.2.3", "255.255.255.252").unwrap();
        assert_eq!(ip.as_cidr(), "10.1.2.3/30");
        assert!(IpAddressWithCidr::with_netmask("10.1.2.3", "255.0.255.0").is_err());
        assert!(IpAddressWithCidr::with_netmask("10.1.2.3", "garbage").is_err());
    }

    #[test]
    fn test_invalid_ip() {
        assert!(IpAddressWithCidr::new("999.999.999.999").is_err());
        assert!(IpAddressWithCidr::new("192.168.1.10/33").is_err());
        assert!(IpAddressWithCidr::new("2001:db8::1/129").is_err());
    }

    #[test]
    fn test_vlan_id() {
        assert!(VlanId::new(100).is_ok());
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_mtu() {
        assert_eq!(Mtu::new(9216).unwrap().value(), 9216);
        assert!(Mtu::new(67).is_err());
        assert!(Mtu::new(10000).is_err());
    }
}
