//! Configuration for the inventory service.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// Default RPC address of the local Serf agent.
pub const DEFAULT_RPC_ADDR: &str = "127.0.0.1:7373";

/// Docker Swarm cluster management port.
pub const DEFAULT_MANAGER_PORT: u16 = 2377;

/// Default bound on a single reachability probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default bound on establishing the directory connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

/// Default pattern a `docker_role` tag must contain to mark a manager.
pub const DEFAULT_MANAGER_PATTERN: &str = "master";

/// Default name of the Serf executable.
pub const DEFAULT_SERF_BINARY: &str = "serf";

/// Configuration shared by the directory connector, prober and classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// RPC address (`host:port`) of the Serf agent acting as discovery server.
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: String,

    /// Optional RPC auth key for the agent.
    #[serde(default)]
    pub rpc_auth: Option<String>,

    /// Serf executable name or path.
    #[serde(default = "default_serf_binary")]
    pub serf_binary: String,

    /// Port probed to detect swarm managers.
    #[serde(default = "default_manager_port")]
    pub manager_port: u16,

    /// Reachability probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Directory connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Regex searched for in the `docker_role` tag (unanchored).
    #[serde(default = "default_manager_pattern")]
    pub manager_pattern: String,
}

fn default_rpc_addr() -> String {
    DEFAULT_RPC_ADDR.to_string()
}

fn default_serf_binary() -> String {
    DEFAULT_SERF_BINARY.to_string()
}

fn default_manager_port() -> u16 {
    DEFAULT_MANAGER_PORT
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_manager_pattern() -> String {
    DEFAULT_MANAGER_PATTERN.to_string()
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            rpc_addr: default_rpc_addr(),
            rpc_auth: None,
            serf_binary: default_serf_binary(),
            manager_port: DEFAULT_MANAGER_PORT,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            manager_pattern: default_manager_pattern(),
        }
    }
}

impl InventoryConfig {
    /// Create a config pointing at the given agent RPC address.
    #[must_use]
    pub fn new(rpc_addr: impl Into<String>) -> Self {
        Self {
            rpc_addr: rpc_addr.into(),
            ..Self::default()
        }
    }

    /// Set the probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the manager port.
    #[must_use]
    pub fn with_manager_port(mut self, port: u16) -> Self {
        self.manager_port = port;
        self
    }

    /// Set the manager role pattern.
    #[must_use]
    pub fn with_manager_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.manager_pattern = pattern.into();
        self
    }

    /// Reachability probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Directory connection timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Compile the manager role pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn compiled_manager_pattern(&self) -> Result<Regex> {
        Regex::new(&self.manager_pattern).map_err(|e| {
            InventoryError::invalid_config(format!(
                "manager pattern '{}' is not a valid regex: {e}",
                self.manager_pattern
            ))
        })
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unusable value.
    pub fn validate(&self) -> Result<()> {
        validate_rpc_addr(&self.rpc_addr)?;

        if self.serf_binary.trim().is_empty() {
            return Err(InventoryError::invalid_config("serf binary cannot be empty"));
        }
        if self.manager_port == 0 {
            return Err(InventoryError::invalid_config("manager port cannot be 0"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(InventoryError::invalid_config(
                "probe timeout must be positive",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(InventoryError::invalid_config(
                "connect timeout must be positive",
            ));
        }

        self.compiled_manager_pattern()?;
        Ok(())
    }
}

fn validate_rpc_addr(addr: &str) -> Result<()> {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(InventoryError::invalid_config(format!(
            "rpc address must be host:port, got '{addr}'"
        )));
    };

    if host.trim_start_matches('[').trim_end_matches(']').is_empty() {
        return Err(InventoryError::invalid_config(format!(
            "rpc address has no host: '{addr}'"
        )));
    }

    match port.parse::<u16>() {
        Ok(p) if p != 0 => Ok(()),
        _ => Err(InventoryError::invalid_config(format!(
            "rpc address has invalid port: '{addr}'"
        ))),
    }
}
