//! Worker configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::time::Duration;

use url::Url;

use crate::coordinator::config::{ConfigError, DEFAULT_COORDINATOR_PORT, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::coordinator::registry::{ANALYTICS_CAPABILITY, STUDENTS_CAPABILITY};

pub const DEFAULT_WORKER_PORT: u16 = 8001;
pub const DEFAULT_MAX_HISTORY: usize = 1000;

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_WORKER_PORT))
}

/// Configuration for the Worker server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Base URL of the coordinator
    pub coordinator_url: String,

    /// Fixed worker id; generated as `worker-xxxxxxxx` when unset
    pub node_id: Option<String>,

    /// Host announced to the coordinator; the LAN address is probed when unset
    pub advertise_host: Option<String>,

    /// Timeout for calls to the coordinator, in seconds
    pub request_timeout_secs: u64,

    /// Lower bound of the simulated processing delay
    pub min_delay_ms: u64,

    /// Upper bound of the simulated processing delay
    pub max_delay_ms: u64,

    /// Processed records kept in memory
    pub max_history: usize,

    /// Capabilities advertised at registration
    pub capabilities: Vec<String>,

    /// Register with the coordinator once the listener is bound
    pub register_on_startup: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            coordinator_url: format!("http://127.0.0.1:{DEFAULT_COORDINATOR_PORT}"),
            node_id: None,
            advertise_host: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            min_delay_ms: 100,
            max_delay_ms: 500,
            max_history: DEFAULT_MAX_HISTORY,
            capabilities: vec![
                STUDENTS_CAPABILITY.to_string(),
                ANALYTICS_CAPABILITY.to_string(),
            ],
            register_on_startup: true,
            enable_request_logging: true,
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `WORKER_BIND`: bind address [default: 0.0.0.0:8001]
    /// - `COORDINATOR_URL`: coordinator base URL [default: http://127.0.0.1:8000]
    /// - `WORKER_NODE_ID`: fixed worker id
    /// - `ADVERTISE_HOST`: host announced to the coordinator
    /// - `REQUEST_TIMEOUT`: coordinator call timeout in seconds [default: 10]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_address = match env::var("WORKER_BIND") {
            Ok(addr) => addr.parse().map_err(|_| ConfigError::InvalidValue {
                field: "WORKER_BIND".to_string(),
                reason: format!("Invalid address: {addr}"),
            })?,
            Err(_) => defaults.bind_address,
        };

        let config = Self {
            bind_address,
            coordinator_url: env::var("COORDINATOR_URL").unwrap_or(defaults.coordinator_url),
            node_id: env::var("WORKER_NODE_ID").ok().filter(|s| !s.is_empty()),
            advertise_host: env::var("ADVERTISE_HOST").ok().filter(|s| !s.is_empty()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.coordinator_url).map_err(|e| ConfigError::InvalidValue {
            field: "coordinator_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "coordinator_url".to_string(),
                reason: format!("Unsupported scheme: {}", url.scheme()),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }

        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "min_delay_ms".to_string(),
                reason: format!(
                    "min_delay_ms ({}) exceeds max_delay_ms ({})",
                    self.min_delay_ms, self.max_delay_ms
                ),
            });
        }

        if self.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_history".to_string(),
                reason: "Must keep at least 1 record".to_string(),
            });
        }

        if self.capabilities.is_empty() {
            return Err(ConfigError::MissingField {
                field: "capabilities".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Simulated processing delay bounds in milliseconds
    pub fn delay_range(&self) -> RangeInclusive<u64> {
        self.min_delay_ms..=self.max_delay_ms
    }
}
