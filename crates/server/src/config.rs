use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use zipgate::ArchiveConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a claimed key stays busy
    #[serde(default = "default_release_delay_secs")]
    pub release_delay_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address for the Prometheus exporter; disabled when unset
    #[serde(default)]
    pub metrics_addr: Option<String>,

    /// Archive locations handed to the archiver
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            release_delay_secs: default_release_delay_secs(),
            log_level: default_log_level(),
            metrics_addr: None,
            archive: ArchiveConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("zipgate").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("ZIPGATE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;

        if config.release_delay_secs == 0 {
            tracing::warn!("release_delay_secs is 0, duplicate requests will not be suppressed");
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get the Prometheus exporter address, if one is configured
    pub fn metrics_socket_addr(&self) -> anyhow::Result<Option<SocketAddr>> {
        self.metrics_addr
            .as_deref()
            .map(|addr| addr.parse::<SocketAddr>().map_err(anyhow::Error::from))
            .transpose()
    }

    /// Get release delay as Duration
    pub fn release_delay(&self) -> Duration {
        Duration::from_secs(self.release_delay_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_release_delay_secs() -> u64 {
    zipgate::DEFAULT_RELEASE_DELAY.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}
