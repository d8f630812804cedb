//! Structured logging setup

use crate::config::{ApiConfig, Environment, LogFormat};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for the API process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directives (e.g. "info" or "acadash_auth=debug,tower_http=info")
    pub filter: String,
    pub format: LogFormat,
    /// Include file and line number information
    pub include_location: bool,
    pub service_name: String,
    pub service_version: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl LoggingConfig {
    /// JSON lines at info
    pub fn production() -> Self {
        Self {
            filter: "info,acadash_auth=info,tower_http=warn".to_string(),
            format: LogFormat::Json,
            include_location: false,
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Pretty output with request traces
    pub fn development() -> Self {
        Self {
            filter: "debug,acadash_auth=debug,tower_http=debug,hyper=info".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Self::production()
        }
    }

    /// Errors only
    pub fn test() -> Self {
        Self {
            filter: "error".to_string(),
            format: LogFormat::Plain,
            include_location: false,
            ..Self::production()
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
        }
    }

    /// Environment preset with `LOG_LEVEL` / `LOG_FORMAT` overrides applied
    pub fn from_api_config(config: &ApiConfig) -> Self {
        let mut logging = Self::for_environment(config.environment);
        if let Some(level) = &config.log_level {
            logging.filter = level.clone();
        }
        if let Some(format) = config.log_format {
            logging.format = format;
        }
        logging
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .pretty(),
            )
            .try_init()?,
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        filter = %config.filter,
        format = ?config.format,
        "Structured logging initialized"
    );
    Ok(())
}
