//! Ethernet status CLI
//!
//! Runs the network status observer headless and prints every snapshot.
//!
//! Usage:
//!   ethernet-status
//!   ethernet-status --once --json
//!   ethernet-status --interface en7 --route-program /usr/sbin/netstat --route-arg -nr

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use ethernet_status_lib::config::{self, ObserverConfig};
use ethernet_status_lib::{OutputFormat, RunOptions};

#[derive(Parser)]
#[command(name = "ethernet-status")]
#[command(about = "Report wired link, interface addresses and default gateway")]
struct Cli {
    /// Canonical wired interface
    #[arg(long, env = "ETHERNET_STATUS_INTERFACE", default_value = config::CANONICAL_WIRED_INTERFACE)]
    interface: String,

    /// Routing-table tool
    #[arg(long, env = "ETHERNET_STATUS_ROUTE_PROGRAM", default_value = config::ROUTE_TABLE_PROGRAM)]
    route_program: PathBuf,

    /// Argument for the routing-table tool (repeatable; defaults to -nr)
    #[arg(long = "route-arg", allow_hyphen_values = true)]
    route_args: Vec<String>,

    /// Print snapshots as JSON lines
    #[arg(long)]
    json: bool,

    /// Print the initial snapshot and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn into_options(self) -> RunOptions {
        let route_args = if self.route_args.is_empty() {
            ObserverConfig::default().route_args
        } else {
            self.route_args
        };
        RunOptions {
            config: ObserverConfig {
                interface: self.interface,
                route_program: self.route_program,
                route_args,
            },
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            once: self.once,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ethernet_status_lib::init_logging();
    ethernet_status_lib::run(cli.into_options())
}
