//! Logger setup for the CLI.

use std::sync::Once;

/// Logger configuration.
///
/// `filter` follows the `env_logger` filter syntax (e.g. "info",
/// "pathtrace_core=debug"). Without one, `RUST_LOG` is used, then `warn`.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// `warn`, `info`, `debug`, then `trace` for each extra `-v`.
    pub fn from_verbosity(verbose: u8) -> Self {
        let level = match verbose {
            0 => return Self::default(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            filter: Some(level.to_string()),
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Warn);
            }
        }
        builder.target(env_logger::Target::Stderr).init();
        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_verbosity_defers_to_environment() {
        assert!(LoggingConfig::from_verbosity(0).filter.is_none());
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(LoggingConfig::from_verbosity(1).filter.as_deref(), Some("info"));
        assert_eq!(LoggingConfig::from_verbosity(2).filter.as_deref(), Some("debug"));
        assert_eq!(LoggingConfig::from_verbosity(7).filter.as_deref(), Some("trace"));
    }
}
