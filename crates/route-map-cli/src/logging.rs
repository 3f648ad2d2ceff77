use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over `default_filter`. Stdout is left to the protocol.
pub fn setup_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_filter(filter);
    // A second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();

    tracing::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
