//! Logging initialization.
//!
//! Called once by the host binary before any repository is opened.
//! Reads `RUST_LOG` if set, otherwise falls back to the level in
//! [`crate::core::Config`].

use crate::core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber from logging configuration.
///
/// Safe to call more than once; subsequent calls are no-ops (the
/// underlying `set_global_default` failure is swallowed, matching the
/// teacher's `init()` which is also meant to run exactly once per
/// process but must not panic if a test harness calls it twice).
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        let config = LoggingConfig {
            level: "info".to_string(),
        };
        init(&config);
        init(&config);
    }
}
