//! # Runtime Configuration
//!
//! Unified configuration for the store, the ingress API, the external
//! collaborators, and both core services. Every concern gets its own struct
//! with sane defaults; `CORONET_*` environment variables override the few
//! knobs an operator actually changes per deployment.

use coronet_reconciler::ReconcilerConfig;
use coronet_scheduler::SchedulerConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Persistent store configuration.
    pub store: StoreConfig,
    /// Ingress API configuration.
    pub api: ApiConfig,
    /// Chain height source configuration.
    pub chain: ChainConfig,
    /// Commit Provider configuration.
    pub provider: ProviderConfig,
    /// Secondary launch trigger configuration.
    pub launch: LaunchConfig,
    /// Competition scheduler knobs.
    pub scheduler: SchedulerConfig,
    /// Order reconciliation monitor knobs.
    pub reconciler: ReconcilerConfig,
}

impl RuntimeConfig {
    /// Defaults overridden by `CORONET_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Apply overrides from a name -> value lookup.
    ///
    /// Unparseable values are logged and ignored; the default stands.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = get("CORONET_DATA_DIR") {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get("CORONET_STORE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.store.backend = parsed,
                Err(()) => warn!(value = %backend, "unknown CORONET_STORE_BACKEND, keeping default"),
            }
        }
        if let Some(port) = get("CORONET_API_PORT") {
            match port.parse() {
                Ok(parsed) => self.api.bind.set_port(parsed),
                Err(_) => warn!(value = %port, "unparseable CORONET_API_PORT, keeping default"),
            }
        }
        if let Some(url) = get("CORONET_CHAIN_URL") {
            self.chain.base_url = url;
        }
        if let Some(url) = get("CORONET_PROVIDER_URL") {
            self.provider.base_url = url;
        }
        if let Some(key) = get("CORONET_PROVIDER_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(address) = get("CORONET_DESTINATION_ADDRESS") {
            self.provider.destination_address = address;
        }
        if let Some(url) = get("CORONET_LAUNCH_URL") {
            self.launch.webhook_url = Some(url);
        }
        if let Some(secs) = get("CORONET_TICK_INTERVAL_SECS") {
            match secs.parse() {
                Ok(parsed) => self.scheduler.tick_interval = Duration::from_secs(parsed),
                Err(_) => {
                    warn!(value = %secs, "unparseable CORONET_TICK_INTERVAL_SECS, keeping default")
                }
            }
        }
        if let Some(secs) = get("CORONET_CYCLE_INTERVAL_SECS") {
            match secs.parse() {
                Ok(parsed) => self.reconciler.cycle_interval = Duration::from_secs(parsed),
                Err(_) => {
                    warn!(value = %secs, "unparseable CORONET_CYCLE_INTERVAL_SECS, keeping default")
                }
            }
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "scheduler.tick_interval" });
        }
        if self.reconciler.cycle_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "reconciler.cycle_interval" });
        }
        if self.scheduler.leaderboard_min_blocks == 0 {
            return Err(ConfigError::ZeroSurvivalWindow);
        }
        if self.store.backend == StoreBackend::Rocks && self.store.data_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::MissingDataDir);
        }
        if !self.provider.base_url.is_empty() && self.provider.destination_address.is_empty() {
            return Err(ConfigError::MissingDestinationAddress);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A periodic driver cannot run on a zero interval.
    #[error("{name} must be non-zero")]
    ZeroInterval {
        /// Offending option.
        name: &'static str,
    },

    /// A zero survival window would commit leaders on the crowning block.
    #[error("scheduler.leaderboard_min_blocks must be at least 1")]
    ZeroSurvivalWindow,

    /// The rocksdb backend needs somewhere to live.
    #[error("store.backend is rocksdb but store.data_dir is empty; set CORONET_DATA_DIR")]
    MissingDataDir,

    /// Orders cannot be created without a destination for the inscription.
    #[error("provider is configured but destination_address is empty; set CORONET_DESTINATION_ADDRESS")]
    MissingDestinationAddress,
}

/// Persistent store selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Which backend to open.
    pub backend: StoreBackend,
    /// Data directory for the rocksdb backend.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps; state dies with the process. Tests and local runs.
    Memory,
    /// On-disk rocksdb; survives restarts. Production.
    Rocks,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::Rocks),
            _ => Err(()),
        }
    }
}

/// Ingress API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Serve the ingress API at all.
    pub enabled: bool,
    /// Bind address.
    pub bind: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
        }
    }
}

/// Chain height source configuration (esplora-style HTTP API).
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Base URL of the esplora instance.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blockstream.info/api".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Commit Provider configuration (order desk HTTP API).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the order desk.
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Address the finished inscription is delivered to.
    pub destination_address: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7070".to_string(),
            api_key: None,
            destination_address: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Secondary launch trigger configuration.
#[derive(Debug, Clone, Default)]
pub struct LaunchConfig {
    /// Webhook to POST winning proposals to. `None` disables the trigger.
    pub webhook_url: Option<String>,
}
