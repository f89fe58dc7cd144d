//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.log_filter`. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = %config.log_filter, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = EngineConfig::isolated(".");
        init_tracing(&config);
        init_tracing(&config);
        tracing::info!("still logging after second init");
    }

    #[test]
    fn bad_filter_falls_back() {
        let mut config = EngineConfig::isolated(".");
        config.log_filter = "not a [valid filter".to_string();
        init_tracing(&config);
    }
}
