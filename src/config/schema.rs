//! Configuration schema definitions.
//!
//! This module defines the static configuration of the gateway. All types
//! derive Serde traits for deserialization from TOML or JSON files. The
//! admission fields also accept the camelCase names of the legacy
//! `config.json` layout, and unknown keys (such as `_comment` entries) are
//! ignored.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Upstream JSON-RPC endpoints (http, https, ws, wss).
    pub upstreams: Vec<String>,

    /// Dispatch strategy tag: NAIVE, RACE or FALLBACK.
    pub strategy: String,

    /// Enforce the method allow list and contract whitelist.
    #[serde(alias = "methodLimitationEnabled")]
    pub method_limitation_enabled: bool,

    /// Methods admitted when limitation is enabled.
    #[serde(alias = "allowedMethods")]
    pub allowed_methods: Vec<String>,

    /// Contract addresses admitted for eth_call, eth_estimateGas and
    /// eth_sendRawTransaction.
    #[serde(alias = "contractWhitelist")]
    pub contract_whitelist: Vec<String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3005"). Changing it requires a restart.
    pub bind_address: String,

    /// Maximum request body size in bytes. Changing it requires a restart.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3005".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for dispatching one inbound request, in seconds. 0 disables it.
    ///
    /// Expiry answers with a JSON-RPC internal error. Applies on reload.
    pub request_secs: u64,

    /// Deadline for a single upstream call, in seconds. 0 disables it.
    pub upstream_secs: u64,

    /// Upstream connection establishment timeout, in seconds. 0 disables it.
    pub connect_secs: u64,

    /// Time allowed for in-flight requests to drain on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
            connect_secs: 5,
            shutdown_grace_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
