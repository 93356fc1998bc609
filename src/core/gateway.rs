//! Default gateway resolution from the textual routing table.
//!
//! Depends on the column layout of an external tool, so everything sits behind
//! [`GatewayResolver`] and can be replaced by a native routing-table query.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::{self, ObserverConfig};
use crate::error::ObserverError;

/// Resolves the next hop of the default route.
pub trait GatewayResolver: Send + Sync {
    fn resolve_gateway(&self) -> Option<String>;
}

/// Runs the routing-table tool and parses its stdout.
#[derive(Debug, Clone)]
pub struct RouteTableGateway {
    program: PathBuf,
    args: Vec<String>,
}

impl RouteTableGateway {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ObserverConfig) -> Self {
        Self::new(config.route_program.clone(), config.route_args.clone())
    }

    /// Run the tool to completion and return its stdout.
    ///
    /// The exit code is not inspected; only termination by a signal counts as
    /// abnormal.
    fn capture_route_table(&self) -> Result<String, ObserverError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ObserverError::SubprocessLaunch(format!(
                    "failed to launch {}: {e}",
                    self.program.display()
                ))
            })?;

        if output.status.code().is_none() {
            return Err(ObserverError::SubprocessExecution(format!(
                "{} terminated abnormally: {}",
                self.program.display(),
                output.status
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            ObserverError::SubprocessExecution(format!(
                "{} produced non-UTF-8 output: {e}",
                self.program.display()
            ))
        })
    }
}

impl Default for RouteTableGateway {
    fn default() -> Self {
        Self::from_config(&ObserverConfig::default())
    }
}

impl GatewayResolver for RouteTableGateway {
    fn resolve_gateway(&self) -> Option<String> {
        match self.capture_route_table() {
            Ok(table) => gateway_from_route_table(&table),
            Err(e) => {
                tracing::debug!("Gateway unknown ({}): {e}", e.kind());
                None
            }
        }
    }
}

/// Gateway from routing-table text, or `None` when no usable default route
/// line exists.
pub fn gateway_from_route_table(table: &str) -> Option<String> {
    match parse_default_gateway(table) {
        Ok(gateway) => Some(gateway),
        Err(e) => {
            tracing::debug!("Gateway unknown: {e}");
            None
        }
    }
}

/// First line containing the default token; its second whitespace-separated
/// token is the gateway.
fn parse_default_gateway(table: &str) -> Result<String, ObserverError> {
    let line = table
        .lines()
        .find(|line| line.contains(config::DEFAULT_ROUTE_TOKEN))
        .ok_or_else(|| {
            ObserverError::ParseMiss(format!(
                "no line containing `{}`",
                config::DEFAULT_ROUTE_TOKEN
            ))
        })?;

    line.split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| ObserverError::ParseMiss(format!("default route line too short: {line:?}")))
}
