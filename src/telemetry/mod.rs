use crate::config::{LogFormat, Settings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Logs go to stderr
/// so that reports written to stdout stay machine-readable.
pub fn init_logging(settings: &Settings) -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .map_err(|e| {
            crate::TreatyError::ConfigError(format!(
                "invalid log filter '{}': {}",
                settings.log_filter, e
            ))
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let installed = match settings.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| {
        crate::TreatyError::ConfigError(format!("failed to install tracing subscriber: {}", e))
    })?;

    tracing::debug!(format = ?settings.log_format, "tracing initialized");
    Ok(())
}
