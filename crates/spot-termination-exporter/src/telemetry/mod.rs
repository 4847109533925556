//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat};
use crate::error::{ExporterError, Result};

/// Build the filter: the configured level, refined by `RUST_LOG` if set
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy()
}

/// Install the global tracing subscriber
pub fn init(config: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
    };

    installed.map_err(|e| ExporterError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_uses_configured_level() {
        let filter = env_filter(&LogConfig {
            level: tracing::Level::DEBUG,
            format: LogFormat::Text,
        });
        assert!(filter.to_string().contains("debug"));
    }
}
