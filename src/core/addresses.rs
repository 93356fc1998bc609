//! Address resolution for the canonical wired interface.
//!
//! Enumeration is platform-specific (`getifaddrs` on Unix, `netdev` elsewhere);
//! picking the first IPv4 and IPv6 address of the interface is a pure function
//! over the enumerated entries.

use std::net::IpAddr;

use crate::error::ObserverError;

/// Addresses found for one interface in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddresses {
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

/// One enumerated interface address, in OS order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub interface: String,
    pub address: IpAddr,
    /// IPv6 scope id; 0 for IPv4 and unscoped IPv6.
    pub scope_id: u32,
}

impl AddressEntry {
    /// Numeric host form, matching `getnameinfo(NI_NUMERICHOST)`: scoped IPv6
    /// addresses carry a `%ifname` suffix.
    pub fn numeric_host(&self) -> String {
        match self.address {
            IpAddr::V6(v6) if self.scope_id != 0 => format!("{v6}%{}", self.interface),
            addr => addr.to_string(),
        }
    }
}

/// Resolves the addresses bound to a named interface.
pub trait AddressResolver: Send + Sync {
    fn resolve_addresses(&self, interface: &str) -> InterfaceAddresses;
}

/// First IPv4 and first IPv6 address of `interface`. Starts from unknown and
/// only fills in what the entries contain.
pub fn select_interface_addresses<'a, I>(entries: I, interface: &str) -> InterfaceAddresses
where
    I: IntoIterator<Item = &'a AddressEntry>,
{
    let mut found = InterfaceAddresses::default();
    for entry in entries.into_iter().filter(|e| e.interface == interface) {
        match entry.address {
            IpAddr::V4(_) if found.ipv4.is_none() => found.ipv4 = Some(entry.numeric_host()),
            IpAddr::V6(_) if found.ipv6.is_none() => found.ipv6 = Some(entry.numeric_host()),
            _ => {}
        }
        if found.ipv4.is_some() && found.ipv6.is_some() {
            break;
        }
    }
    found
}

/// Enumerates interface addresses through the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAddressResolver;

impl AddressResolver for SystemAddressResolver {
    fn resolve_addresses(&self, interface: &str) -> InterfaceAddresses {
        match enumerate_addresses() {
            Ok(entries) => {
                let found = select_interface_addresses(&entries, interface);
                if found.ipv4.is_none() && found.ipv6.is_none() {
                    tracing::debug!("No addresses bound to {interface}");
                }
                found
            }
            Err(e) => {
                tracing::debug!("Interface enumeration failed: {e}");
                InterfaceAddresses::default()
            }
        }
    }
}

#[cfg(unix)]
fn enumerate_addresses() -> Result<Vec<AddressEntry>, ObserverError> {
    use std::net::{SocketAddrV4, SocketAddrV6};

    let addrs = nix::ifaddrs::getifaddrs()
        .map_err(|e| ObserverError::InterfaceEnumeration(format!("getifaddrs failed: {e}")))?;

    let mut entries = Vec::new();
    for ifaddr in addrs {
        let Some(storage) = ifaddr.address else {
            continue;
        };
        if let Some(sin) = storage.as_sockaddr_in() {
            entries.push(AddressEntry {
                interface: ifaddr.interface_name.clone(),
                address: IpAddr::V4(*SocketAddrV4::from(*sin).ip()),
                scope_id: 0,
            });
        } else if let Some(sin6) = storage.as_sockaddr_in6() {
            let sock = SocketAddrV6::from(*sin6);
            entries.push(AddressEntry {
                interface: ifaddr.interface_name.clone(),
                address: IpAddr::V6(*sock.ip()),
                scope_id: sock.scope_id(),
            });
        }
    }
    Ok(entries)
}

#[cfg(not(unix))]
fn enumerate_addresses() -> Result<Vec<AddressEntry>, ObserverError> {
    let mut entries = Vec::new();
    for iface in netdev::get_interfaces() {
        for net in &iface.ipv4 {
            entries.push(AddressEntry {
                interface: iface.name.clone(),
                address: IpAddr::V4(net.addr()),
                scope_id: 0,
            });
        }
        for net in &iface.ipv6 {
            let addr = net.addr();
            // Link-local addresses are scoped to the interface they sit on.
            let scope_id = if addr.segments()[0] & 0xffc0 == 0xfe80 { iface.index } else { 0 };
            entries.push(AddressEntry {
                interface: iface.name.clone(),
                address: IpAddr::V6(addr),
                scope_id,
            });
        }
    }
    Ok(entries)
}
