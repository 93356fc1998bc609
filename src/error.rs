//! Unified error type for the status observer.
//!
//! `ObserverError` covers every failure the observer can run into. Resolution
//! failures never leave the resolver that hit them: they are logged and turned
//! into an absent snapshot field. Only `start` hands an error back to the caller.
//! It serializes as `{ "kind": "...", "message": "..." }` for JSON consumers.

use serde::ser::SerializeStruct;

/// Observer-level error.
///
/// Each variant maps to a distinct failure domain.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The OS interface/address enumeration call failed.
    #[error("{0}")]
    InterfaceEnumeration(String),

    /// The routing-table tool could not be launched.
    #[error("{0}")]
    SubprocessLaunch(String),

    /// The routing-table tool ran but terminated abnormally or produced undecodable output.
    #[error("{0}")]
    SubprocessExecution(String),

    /// No usable default-route line in the routing-table output.
    #[error("{0}")]
    ParseMiss(String),

    /// The path-change subscription could not be established.
    #[error("{0}")]
    PathMonitor(String),

    /// I/O and OS-level errors (thread spawning).
    #[error("{0}")]
    Io(String),

    /// `start` was called on an observer that is already monitoring.
    #[error("observer is already monitoring")]
    AlreadyMonitoring,
}

impl ObserverError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            ObserverError::InterfaceEnumeration(_) => "InterfaceEnumeration",
            ObserverError::SubprocessLaunch(_) => "SubprocessLaunch",
            ObserverError::SubprocessExecution(_) => "SubprocessExecution",
            ObserverError::ParseMiss(_) => "ParseMiss",
            ObserverError::PathMonitor(_) => "PathMonitor",
            ObserverError::Io(_) => "Io",
            ObserverError::AlreadyMonitoring => "AlreadyMonitoring",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }`.
impl serde::Serialize for ObserverError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("ObserverError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<std::io::Error> for ObserverError {
    fn from(err: std::io::Error) -> Self {
        ObserverError::Io(err.to_string())
    }
}
