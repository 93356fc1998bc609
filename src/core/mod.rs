//! Core logic: snapshot model and the resolvers behind it.
//!
//! - [`NetworkStatusSnapshot`] — one consistent link/address/gateway observation
//! - [`LinkClassifier`] — is the preferred path wired Ethernet
//! - [`AddressResolver`] — first IPv4/IPv6 of the canonical interface
//! - [`GatewayResolver`] — default route next hop from the routing table
//! - [`StatusSampler`] — one full resolution pass

pub mod addresses;
pub mod gateway;
pub mod link;
pub mod sampler;
pub mod snapshot;

pub use addresses::{
    select_interface_addresses, AddressEntry, AddressResolver, InterfaceAddresses,
    SystemAddressResolver,
};
pub use gateway::{gateway_from_route_table, GatewayResolver, RouteTableGateway};
pub use link::{DefaultRouteClassifier, LinkClassifier};
pub use sampler::StatusSampler;
pub use snapshot::{NetworkStatusSnapshot, StatusField};
