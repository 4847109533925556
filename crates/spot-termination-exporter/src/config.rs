//! Command-line configuration
//!
//! Parsed once at startup into an immutable [`ExporterConfig`] that is handed to
//! the collector and the HTTP server by value.

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::contracts::DEFAULT_METADATA_ENDPOINT;
use crate::error::{ExporterError, Result};

/// Hard per-request timeout for every outbound probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default Spotinst API base URL
pub const DEFAULT_SPOTINST_API_URL: &str = "https://api.spotinst.io";

#[derive(Parser, Debug, Clone)]
#[command(name = "spot-termination-exporter")]
#[command(about = "Prometheus exporter for EC2 spot interruption and rebalance notices")]
#[command(version)]
pub struct Cli {
    /// Bind address for the metrics server
    #[arg(long, default_value = ":9189", env = "BIND_ADDR")]
    pub bind_addr: String,

    /// Path to metrics endpoint
    #[arg(long, default_value = "/metrics", env = "METRICS_PATH")]
    pub metrics_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Metadata endpoint to query
    #[arg(long, default_value = DEFAULT_METADATA_ENDPOINT, env = "METADATA_ENDPOINT")]
    pub metadata_endpoint: String,

    /// Probe instance-type and attach it as a label
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub instance_type_label: bool,

    /// What to do when the instance identity cannot be fetched
    #[arg(long, value_enum, default_value_t = IdentityPolicy::Abort)]
    pub identity_failure: IdentityPolicy,

    /// Spotinst API token
    #[arg(long, env = "SPOTINST_TOKEN", hide_env_values = true)]
    pub spotinst_token: Option<String>,

    /// Spotinst account ID
    #[arg(long, env = "SPOTINST_ACCOUNT_ID")]
    pub spotinst_account_id: Option<String>,

    /// Spotinst API base URL
    #[arg(long, default_value = DEFAULT_SPOTINST_API_URL)]
    pub spotinst_api_url: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Text,
}

/// Behaviour when the `instance-id` or `instance-type` probe fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IdentityPolicy {
    /// Emit no metrics for the scrape
    #[default]
    Abort,
    /// Continue with an empty label value
    EmptyLabel,
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: tracing::Level,
    pub format: LogFormat,
}

/// Spotinst status lookup settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotinstConfig {
    pub api_url: String,
    pub token: String,
    pub account_id: String,
}

impl SpotinstConfig {
    /// Both credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() && !self.account_id.is_empty()
    }
}

/// Settings read by the collector on every scrape
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Base URL, always ending in `/`
    pub metadata_endpoint: String,
    pub instance_type_label: bool,
    pub identity_policy: IdentityPolicy,
    pub spotinst: Option<SpotinstConfig>,
    pub probe_timeout: Duration,
}

impl CollectorConfig {
    pub fn new(metadata_endpoint: impl Into<String>) -> Self {
        Self {
            metadata_endpoint: normalize_base_url(metadata_endpoint.into()),
            instance_type_label: true,
            identity_policy: IdentityPolicy::Abort,
            spotinst: None,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_identity_policy(mut self, policy: IdentityPolicy) -> Self {
        self.identity_policy = policy;
        self
    }

    pub fn with_instance_type_label(mut self, enabled: bool) -> Self {
        self.instance_type_label = enabled;
        self
    }

    pub fn with_spotinst(mut self, spotinst: SpotinstConfig) -> Self {
        self.spotinst = Some(spotinst);
        self
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_ENDPOINT)
    }
}

/// Complete process configuration
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Socket address or `host:port` accepted by the listener
    pub bind_addr: String,
    pub metrics_path: String,
    pub log: LogConfig,
    pub collector: CollectorConfig,
}

impl TryFrom<Cli> for ExporterConfig {
    type Error = ExporterError;

    fn try_from(cli: Cli) -> Result<Self> {
        let level = parse_log_level(&cli.log_level)?;

        if !cli.metrics_path.starts_with('/') || cli.metrics_path == "/" {
            return Err(ExporterError::invalid_config(format!(
                "metrics path must start with '/' and not be the root: {:?}",
                cli.metrics_path
            )));
        }

        if cli.metadata_endpoint.trim().is_empty() {
            return Err(ExporterError::invalid_config("metadata endpoint is empty"));
        }

        let token = cli.spotinst_token.unwrap_or_default();
        let account_id = cli.spotinst_account_id.unwrap_or_default();
        let spotinst = (!token.is_empty() || !account_id.is_empty()).then(|| SpotinstConfig {
            api_url: cli.spotinst_api_url.trim_end_matches('/').to_string(),
            token,
            account_id,
        });

        Ok(Self {
            bind_addr: normalize_bind_addr(&cli.bind_addr),
            metrics_path: cli.metrics_path,
            log: LogConfig {
                level,
                format: cli.log_format,
            },
            collector: CollectorConfig {
                metadata_endpoint: normalize_base_url(cli.metadata_endpoint),
                instance_type_label: cli.instance_type_label,
                identity_policy: cli.identity_failure,
                spotinst,
                probe_timeout: PROBE_TIMEOUT,
            },
        })
    }
}

/// Parse a log level name, accepting the logrus spellings as well
pub fn parse_log_level(raw: &str) -> Result<tracing::Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" | "warning" => Ok(tracing::Level::WARN),
        "error" | "fatal" | "panic" => Ok(tracing::Level::ERROR),
        _ => Err(ExporterError::InvalidLogLevel(raw.to_string())),
    }
}

/// `:9189` listens on every interface
pub fn normalize_bind_addr(raw: &str) -> String {
    if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    }
}

fn normalize_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["spot-termination-exporter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::try_from(parse(&[])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9189");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.log.level, tracing::Level::INFO);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.collector.metadata_endpoint,
            "http://169.254.169.254/latest/meta-data/"
        );
        assert!(config.collector.instance_type_label);
        assert_eq!(config.collector.identity_policy, IdentityPolicy::Abort);
        assert!(config.collector.spotinst.is_none());
        assert_eq!(config.collector.probe_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--bind-addr",
            "127.0.0.1:9000",
            "--metrics-path",
            "/probe",
            "--log-level",
            "warning",
            "--log-format",
            "text",
            "--metadata-endpoint",
            "http://localhost:9092/latest/meta-data",
            "--instance-type-label",
            "false",
            "--identity-failure",
            "empty-label",
        ]);
        let config = ExporterConfig::try_from(cli).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.metrics_path, "/probe");
        assert_eq!(config.log.level, tracing::Level::WARN);
        assert_eq!(config.log.format, LogFormat::Text);
        assert_eq!(
            config.collector.metadata_endpoint,
            "http://localhost:9092/latest/meta-data/"
        );
        assert!(!config.collector.instance_type_label);
        assert_eq!(config.collector.identity_policy, IdentityPolicy::EmptyLabel);
    }

    #[test]
    fn test_invalid_log_level_is_fatal() {
        let err = ExporterConfig::try_from(parse(&["--log-level", "loud"])).unwrap_err();
        assert!(matches!(err, ExporterError::InvalidLogLevel(_)));
    }

    #[test]
    fn test_invalid_metrics_path() {
        assert_err!(ExporterConfig::try_from(parse(&["--metrics-path", "metrics"])));
        assert_err!(ExporterConfig::try_from(parse(&["--metrics-path", "/"])));
    }

    #[test]
    fn test_log_level_spellings() {
        assert_eq!(assert_ok!(parse_log_level("DEBUG")), tracing::Level::DEBUG);
        assert_eq!(assert_ok!(parse_log_level("fatal")), tracing::Level::ERROR);
        assert_err!(parse_log_level(""));
    }

    #[test]
    fn test_spotinst_enabled_by_any_credential() {
        let config = ExporterConfig::try_from(parse(&[
            "--spotinst-token",
            "secret",
            "--spotinst-api-url",
            "http://localhost:1234/",
        ]))
        .unwrap();

        let spotinst = config.collector.spotinst.unwrap();
        assert_eq!(spotinst.api_url, "http://localhost:1234");
        assert!(!spotinst.has_credentials());
    }

    #[test]
    fn test_bind_addr_normalization() {
        assert_eq!(normalize_bind_addr(":9189"), "0.0.0.0:9189");
        assert_eq!(normalize_bind_addr("localhost:9189"), "localhost:9189");
    }
}
