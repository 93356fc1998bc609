//! Presentation-neutral rendering of snapshots.
//!
//! These helpers take plain snapshots and return strings, so any consumer (the
//! CLI here, a menu bar elsewhere) renders "unknown" the same way.

use crate::config::UNKNOWN_LABEL;
use crate::core::{NetworkStatusSnapshot, StatusField};

/// Headline for the wired link state.
pub fn link_label(link_is_wired: bool) -> &'static str {
    if link_is_wired {
        "Ethernet connected"
    } else {
        "Ethernet not connected"
    }
}

/// Field value, or the unknown label when absent.
pub fn field_or_unknown(snapshot: &NetworkStatusSnapshot, field: StatusField) -> &str {
    snapshot.field(field).unwrap_or(UNKNOWN_LABEL)
}

/// Multi-line text summary of a snapshot.
pub fn format_status_summary(snapshot: &NetworkStatusSnapshot) -> String {
    let mut out = String::from(link_label(snapshot.link_is_wired));
    for field in StatusField::ALL {
        out.push_str(&format!("\n{}: {}", field.label(), field_or_unknown(snapshot, field)));
    }
    out
}

/// Single JSON line for a snapshot.
pub fn format_status_json(snapshot: &NetworkStatusSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}
