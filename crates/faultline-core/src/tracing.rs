//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level. Initialization is
//! idempotent: a second call (or a subscriber installed by the host process)
//! leaves the existing one in place.

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let config = ObservabilityConfig {
            level: "not a [valid directive".to_string(),
            json: false,
        };
        let _ = init_tracing(&config);
        assert!(!init_tracing(&ObservabilityConfig::default()));
    }
}
