//! One full resolution pass: link, addresses and gateway into a fresh snapshot.

use crate::config::ObserverConfig;

use super::addresses::{AddressResolver, SystemAddressResolver};
use super::gateway::{GatewayResolver, RouteTableGateway};
use super::link::{DefaultRouteClassifier, LinkClassifier};
use super::snapshot::NetworkStatusSnapshot;

/// Bundles the three resolvers and the interface they report on.
pub struct StatusSampler {
    interface: String,
    link: Box<dyn LinkClassifier>,
    addresses: Box<dyn AddressResolver>,
    gateway: Box<dyn GatewayResolver>,
}

impl StatusSampler {
    pub fn new(
        interface: impl Into<String>,
        link: Box<dyn LinkClassifier>,
        addresses: Box<dyn AddressResolver>,
        gateway: Box<dyn GatewayResolver>,
    ) -> Self {
        Self {
            interface: interface.into(),
            link,
            addresses,
            gateway,
        }
    }

    /// Sampler backed by the OS resolvers.
    pub fn system(config: &ObserverConfig) -> Self {
        Self::new(
            config.interface.clone(),
            Box::new(DefaultRouteClassifier),
            Box::new(SystemAddressResolver),
            Box::new(RouteTableGateway::from_config(config)),
        )
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Resolve a complete snapshot. Never fails: anything that cannot be
    /// determined is left absent.
    pub fn resolve(&self) -> NetworkStatusSnapshot {
        let link_is_wired = self.link.is_wired();
        let addresses = self.addresses.resolve_addresses(&self.interface);
        let gateway_address = self.gateway.resolve_gateway();

        NetworkStatusSnapshot {
            link_is_wired,
            ipv4_address: addresses.ipv4,
            ipv6_address: addresses.ipv6,
            gateway_address,
        }
    }
}

impl std::fmt::Debug for StatusSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSampler")
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}
