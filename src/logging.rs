//! Global tracing subscriber.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER_ONCE: OnceLock<()> = OnceLock::new();
const DEFAULT_FILTER: &str = "info";

/// Install the stderr fmt subscriber, filtered by `RUST_LOG` (default
/// `info`). Safe to call more than once.
pub fn init_logging() {
    LOGGER_ONCE.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter);

        // Another subscriber may already be installed by an embedding host.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
        tracing::info!("logging initialised");
    }
}
