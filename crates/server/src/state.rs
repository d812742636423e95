use crate::config::ServerConfig;
use std::sync::Arc;
use std::time::Duration;
use zipgate::{Archiver, KeyRegistry, NoopArchiver};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Busy keys, one registry per server instance
    pub registry: Arc<KeyRegistry>,

    /// Processing step run for every claimed key
    pub archiver: Arc<dyn Archiver>,
}

impl ServerState {
    /// Create new server state backed by the no-op archiver
    pub fn new(config: ServerConfig) -> Self {
        Self::with_archiver(config, Arc::new(NoopArchiver))
    }

    /// Create new server state with a custom archiver
    pub fn with_archiver(config: ServerConfig, archiver: Arc<dyn Archiver>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(KeyRegistry::new()),
            archiver,
        }
    }

    /// How long a claimed key stays busy
    pub fn release_delay(&self) -> Duration {
        self.config.release_delay()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("busy_keys", &self.registry.len())
            .finish_non_exhaustive()
    }
}
