//! Running configuration: the immutable, ready-to-dispatch snapshot.
//!
//! # Build Steps
//! ```text
//! GatewayConfig
//!     → validation.rs (strategy tag, upstream count, URL schemes)
//!     → one independent client per upstream (http/https: reqwest, ws/wss: tungstenite)
//!     → compiled method set + lowercase contract set
//!     → RunningConfig (shared via Arc, never mutated)
//! ```
//!
//! Clients are owned locally until the snapshot is assembled, so a failed
//! build drops every client it created.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ListenerConfig};
use crate::config::validation::{parse_upstream_url, validate_config, ValidationError};
use crate::dispatch::{Dispatcher, StrategyKind};
use crate::resilience::timeouts;
use crate::security::RequestValidator;
use crate::upstream::{redacted_label, HttpUpstream, Upstream, UpstreamClient, WsUpstream};

/// Construction fault; fatal at startup, rejects a reload.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to create client for upstream {index}: {source}")]
    Client {
        index: usize,
        #[source]
        source: reqwest::Error,
    },
}

/// Immutable snapshot consumed by the request handler.
#[derive(Debug)]
pub struct RunningConfig {
    dispatcher: Dispatcher,
    validator: RequestValidator,
    request_timeout: Option<Duration>,
    /// Listener settings the router was built with; not hot-reloadable.
    listener: ListenerConfig,
}

impl RunningConfig {
    /// Build a snapshot from static configuration.
    pub fn build(config: &GatewayConfig) -> Result<Self, BuildError> {
        let strategy = validate_config(config)?;
        let upstream_timeout = timeouts::from_secs(config.timeouts.upstream_secs);
        let connect_timeout = timeouts::from_secs(config.timeouts.connect_secs);

        let mut upstreams = Vec::with_capacity(config.upstreams.len());
        for (index, raw) in config.upstreams.iter().enumerate() {
            let url = parse_upstream_url(raw)?;
            let label = redacted_label(&url);
            let client: Arc<dyn UpstreamClient> = match url.scheme() {
                "ws" | "wss" => Arc::new(WsUpstream::new(url)),
                _ => Arc::new(
                    HttpUpstream::new(url, connect_timeout)
                        .map_err(|source| BuildError::Client { index, source })?,
                ),
            };
            upstreams.push(Upstream::new(index, label, client, upstream_timeout));
        }

        let dispatcher = Dispatcher::new(strategy, upstreams)?;
        let validator = RequestValidator::new(
            config.method_limitation_enabled,
            config.allowed_methods.iter().cloned(),
            &config.contract_whitelist,
        );

        tracing::info!(
            strategy = %strategy,
            upstreams = ?dispatcher.upstreams().iter().map(Upstream::label).collect::<Vec<_>>(),
            method_limitation_enabled = validator.method_limitation_enabled(),
            allowed_methods = validator.allowed_method_count(),
            whitelisted_contracts = validator.whitelist_len(),
            "Running config built"
        );

        Ok(Self {
            dispatcher,
            validator,
            request_timeout: timeouts::from_secs(config.timeouts.request_secs),
            listener: config.listener.clone(),
        })
    }

    /// Assemble a snapshot from parts already built (used by tests and embedders).
    ///
    /// No request deadline is set; see [`RunningConfig::with_request_timeout`].
    pub fn from_parts(dispatcher: Dispatcher, validator: RequestValidator) -> Self {
        Self {
            dispatcher,
            validator,
            request_timeout: None,
            listener: ListenerConfig::default(),
        }
    }

    pub fn with_request_timeout(mut self, limit: Option<Duration>) -> Self {
        self.request_timeout = limit;
        self
    }

    pub(crate) fn with_listener(mut self, listener: ListenerConfig) -> Self {
        self.listener = listener;
        self
    }

    /// Deadline for a whole dispatch, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn listener(&self) -> &ListenerConfig {
        &self.listener
    }

    pub fn strategy(&self) -> StrategyKind {
        self.dispatcher.kind()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn upstreams(&self) -> &[Upstream] {
        self.dispatcher.upstreams()
    }

    pub fn method_limitation_enabled(&self) -> bool {
        self.validator.method_limitation_enabled()
    }
}
