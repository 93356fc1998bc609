//! Point-in-time view of wired link, interface addresses and default gateway.

use serde::{Deserialize, Serialize};

/// One complete, internally consistent observation.
///
/// Every field comes from the same resolution pass. `None` means "unknown",
/// never an empty or placeholder string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatusSnapshot {
    /// The preferred path uses a wired Ethernet interface.
    pub link_is_wired: bool,
    /// First IPv4 address bound to the canonical wired interface.
    pub ipv4_address: Option<String>,
    /// First IPv6 address bound to the canonical wired interface.
    pub ipv6_address: Option<String>,
    /// Next hop of the default route.
    pub gateway_address: Option<String>,
}

/// An address-valued snapshot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    Ipv4,
    Ipv6,
    Gateway,
}

impl StatusField {
    pub const ALL: [StatusField; 3] = [StatusField::Ipv4, StatusField::Ipv6, StatusField::Gateway];

    /// Human-readable field name.
    pub fn label(self) -> &'static str {
        match self {
            StatusField::Ipv4 => "IPv4 Address",
            StatusField::Ipv6 => "IPv6 Address",
            StatusField::Gateway => "Router Address",
        }
    }
}

impl NetworkStatusSnapshot {
    pub fn field(&self, field: StatusField) -> Option<&str> {
        match field {
            StatusField::Ipv4 => self.ipv4_address.as_deref(),
            StatusField::Ipv6 => self.ipv6_address.as_deref(),
            StatusField::Gateway => self.gateway_address.as_deref(),
        }
    }

    /// Whether a copy action for `field` has anything to copy.
    pub fn is_copyable(&self, field: StatusField) -> bool {
        self.field(field).is_some()
    }
}
