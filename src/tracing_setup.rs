use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::models::LoggingConfig;

/// Initialize logging from the `[logging]` configuration section.
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .wrap_err_with(|| format!("Invalid log level: {}", logging.level))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let registry = Registry::default().with(env_filter);
    let result = if logging.json {
        registry
            .with(
                fmt_layer
                    .json()
                    .with_current_span(false)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry.with(fmt_layer.pretty()).try_init()
    };
    result.wrap_err("Failed to install tracing subscriber")?;

    tracing::info!(
        level = %logging.level,
        json = logging.json,
        "Adapter logging initialized"
    );
    Ok(())
}

/// Initialize console-friendly logging for development
pub fn init_console_tracing() -> Result<()> {
    init_tracing(&LoggingConfig::default())
}

/// Shutdown tracing gracefully
pub fn shutdown_tracing() {
    // tracing-subscriber has no explicit shutdown; the fmt layer writes synchronously.
    tracing::info!("Adapter tracing shutdown complete");
}

/// Span for one adapter lifecycle operation (boot, start, stop).
pub fn create_lifecycle_span(adapter: &str, operation: &'static str) -> tracing::Span {
    tracing::info_span!("adapter", name = adapter, operation = operation)
}
