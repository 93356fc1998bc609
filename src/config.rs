//! Centralized runtime constants and observer configuration.
//!
//! Platform-specific names, the routing-table tool and thread names live here
//! so they can be found and adjusted in a single place.

use std::path::PathBuf;

/// Name of the primary built-in wired port.
#[cfg(target_os = "macos")]
pub const CANONICAL_WIRED_INTERFACE: &str = "en0";

/// Name of the primary built-in wired port.
#[cfg(not(target_os = "macos"))]
pub const CANONICAL_WIRED_INTERFACE: &str = "eth0";

/// Routing-table inspection tool.
pub const ROUTE_TABLE_PROGRAM: &str = "/usr/sbin/netstat";

/// Arguments requesting the numeric routing table.
pub const ROUTE_TABLE_ARGS: &[&str] = &["-nr"];

/// Token that marks the default route line in the routing table.
pub const DEFAULT_ROUTE_TOKEN: &str = "default";

/// Label shown for an absent snapshot field.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Thread performing resolution passes for one monitoring session.
pub const RESOLVER_THREAD_NAME: &str = "status-resolver";

/// Thread draining the delivery queue.
pub const DELIVERY_THREAD_NAME: &str = "status-delivery";

/// Thread owning the OS path-change watch for one subscription.
pub const PATH_WATCH_THREAD_NAME: &str = "path-watch";

/// Default `RUST_LOG` filter for the CLI.
pub const DEFAULT_LOG_FILTER: &str = "ethernet_status=info,ethernet_status_lib=info";

/// Runtime configuration for the system resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverConfig {
    /// Interface whose addresses are reported.
    pub interface: String,
    /// Program invoked to read the routing table.
    pub route_program: PathBuf,
    /// Arguments passed to `route_program`.
    pub route_args: Vec<String>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            interface: CANONICAL_WIRED_INTERFACE.to_string(),
            route_program: PathBuf::from(ROUTE_TABLE_PROGRAM),
            route_args: ROUTE_TABLE_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}
