//! Logging setup shared by the runner tools
//!
//! Structured logging through the `tracing` crate. `RUST_LOG` always wins
//! over the configured default filter.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive (e.g. "info", "warn,runner_export=debug")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    /// Show source file in log output
    pub show_file: bool,
    /// Show line number in log output
    pub show_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "warn,runner_export=info,runner_format=info".to_string(),
            show_target: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TracingConfig {
    /// Map a `-v` count to a config: 0 = warn, 1 = info, 2 = debug, more = trace
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            default_level: level.to_string(),
            show_target: verbosity >= 2,
            ..Self::default()
        }
    }
}

/// Initialize the default subscriber. Later calls are ignored.
pub fn init_default() {
    init_with_config(TracingConfig::default());
}

/// Initialize with a custom configuration. Later calls are ignored.
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    // a host application may already own the global subscriber
    let _ = tracing_subscriber::registry().with(fmt_layer).with(filter).try_init();
}

/// Run `f` inside an info span and log how long it took
pub fn instrument<T, F>(operation: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let span = tracing::info_span!("op", operation = %operation);
    let _guard = span.enter();

    let start = std::time::Instant::now();
    let result = f();
    tracing::debug!(duration_ms = %start.elapsed().as_millis(), "{operation} complete");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(config.default_level.starts_with("warn"));
        assert!(config.default_level.contains("runner_export=info"));
        assert!(!config.show_target);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(TracingConfig::from_verbosity(0).default_level, "warn");
        assert_eq!(TracingConfig::from_verbosity(1).default_level, "info");
        assert_eq!(TracingConfig::from_verbosity(2).default_level, "debug");
        assert!(TracingConfig::from_verbosity(2).show_target);
        assert_eq!(TracingConfig::from_verbosity(7).default_level, "trace");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_default();
        init_with_config(TracingConfig::from_verbosity(3));
    }

    #[test]
    fn test_instrument_returns_value() {
        assert_eq!(instrument("test", || 42), 42);
    }
}
