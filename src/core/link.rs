//! Wired link classification of the preferred network path.

use netdev::interface::InterfaceType;

/// Answers whether traffic is currently routed over a wired interface.
pub trait LinkClassifier: Send + Sync {
    fn is_wired(&self) -> bool;
}

/// Classifies the interface carrying the default route.
///
/// The OS picks the default interface as its preferred path; if that interface
/// is Ethernet, the link is wired. Any lookup failure reads as not wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRouteClassifier;

impl LinkClassifier for DefaultRouteClassifier {
    fn is_wired(&self) -> bool {
        match netdev::get_default_interface() {
            Ok(iface) => {
                let wired = is_wired_type(iface.if_type);
                tracing::debug!("Default interface {} ({:?}), wired={wired}", iface.name, iface.if_type);
                wired
            }
            Err(e) => {
                tracing::debug!("No default interface: {e}");
                false
            }
        }
    }
}

fn is_wired_type(if_type: InterfaceType) -> bool {
    matches!(if_type, InterfaceType::Ethernet)
}
