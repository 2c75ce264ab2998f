//! Logging setup.
//!
//! Everything logs through the `log` facade; `env_logger` is the backend.

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax (e.g. "info",
/// "prism=debug,wgpu_core=warn"). When unset, `RUST_LOG` is consulted, then
/// the built-in default.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Filter used when neither the config nor `RUST_LOG` provide one.
///
/// wgpu is chatty at info level.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // try_init: a test harness may have installed a logger already
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized with filter '{filter}'");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig {
            env_filter: Some("debug".into()),
            ..Default::default()
        });
        init_logging(LoggingConfig::default());
        log::info!("still alive after double init");
    }
}
