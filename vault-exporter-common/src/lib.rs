//! Vault Exporter Common Library
//!
//! Shared pieces used by the exporter binary:
//!
//! - [`config`] - Logging configuration and JSON5 config loading
//! - [`build_info`] - Version, revision and branch baked in at compile time
//! - [`error`] - Error types

pub mod build_info;
pub mod config;
pub mod error;

pub use build_info::BuildInfo;
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{Error, Result};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level` when set.
///
/// # Example
///
/// ```ignore
/// use vault_exporter_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*};

    let filter = env_filter(config)?;

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}

/// Build the level filter for `config`, preferring `RUST_LOG` when present.
fn env_filter(config: &LoggingConfig) -> Result<tracing_subscriber::EnvFilter> {
    use tracing_subscriber::EnvFilter;

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level)
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))
}
