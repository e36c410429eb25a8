//! Tracing subscriber setup.
//!
//! `RUST_LOG`, when set, takes precedence over the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `config`.
///
/// Returns `false` if a global subscriber was already installed (by an
/// earlier call or by the embedding application); the existing one is kept.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> =
        if config.format.eq_ignore_ascii_case("json") {
            Box::new(base.json().finish())
        } else {
            Box::new(base.compact().finish())
        };

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        // Another test may already have installed a subscriber
        let _ = init(&config);
        assert!(!init(&LoggingConfig::default()));
    }
}
