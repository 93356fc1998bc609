pub mod config;
pub mod core;
pub mod error;
pub mod observer;
pub mod report;

use std::sync::mpsc;
use std::sync::Arc;

pub use config::ObserverConfig;
pub use crate::core::{NetworkStatusSnapshot, StatusField, StatusSampler};
pub use error::ObserverError;
pub use observer::{DeliveryContext, DeliveryQueue, InlineDelivery, NetworkStatusObserver};

/// How the headless runner prints snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: ObserverConfig,
    pub format: OutputFormat,
    /// Print the initial snapshot and exit.
    pub once: bool,
}

/// Install the tracing subscriber and a panic hook that logs through it.
pub fn init_logging() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in ethernet-status: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.into()),
        )
        .init();
}

/// Run the observer as a headless consumer, printing every snapshot to stdout.
pub fn run(options: RunOptions) -> anyhow::Result<()> {
    let queue = Arc::new(DeliveryQueue::spawn()?);
    let mut observer = NetworkStatusObserver::system(&options.config, queue.clone());
    tracing::info!("Watching interface {}", options.config.interface);

    let (tx, rx) = mpsc::channel();
    let format = options.format;
    observer.start(move |snapshot| {
        match render(&snapshot, format) {
            Ok(text) => println!("{text}"),
            Err(e) => tracing::warn!("Failed to render snapshot: {e}"),
        }
        let _ = tx.send(());
    })?;

    if options.once {
        rx.recv()?;
    } else {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(tokio::signal::ctrl_c())?;
        tracing::info!("Interrupted");
    }

    observer.stop();
    queue.shutdown();
    Ok(())
}

fn render(snapshot: &NetworkStatusSnapshot, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => format!("{}\n", report::format_status_summary(snapshot)),
        OutputFormat::Json => report::format_status_json(snapshot)?,
    })
}
