//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve the strategy tag to a [`StrategyKind`]
//! - Enforce the strategy's upstream-count invariant
//! - Check upstream URLs parse and use a supported scheme
//!
//! # Design Decisions
//! - Validation is a pure function of the static configuration
//! - Runs before any upstream client is constructed
//! - Violations abort construction; nothing is coerced

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::dispatch::StrategyKind;

/// Schemes the upstream clients can speak.
pub const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown strategy `{0}` (expected NAIVE, RACE or FALLBACK)")]
    UnknownStrategy(String),

    #[error("strategy {strategy} requires {} upstream(s), got {count}", required(.strategy))]
    UpstreamCount { strategy: StrategyKind, count: usize },

    #[error("invalid upstream url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported upstream scheme `{scheme}` (expected http, https, ws or wss)")]
    UnsupportedScheme { scheme: String },
}

fn required(strategy: &StrategyKind) -> &'static str {
    match strategy {
        StrategyKind::Naive => "exactly 1",
        StrategyKind::Race | StrategyKind::Fallback => "at least 2",
    }
}

/// Enforce the topology invariant for `strategy`.
pub fn check_upstream_count(strategy: StrategyKind, count: usize) -> Result<(), ValidationError> {
    if strategy.accepts(count) {
        Ok(())
    } else {
        Err(ValidationError::UpstreamCount { strategy, count })
    }
}

/// Parse an upstream URL and check its scheme.
pub fn parse_upstream_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ValidationError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}

/// Validate the static configuration and return the resolved strategy.
pub fn validate_config(config: &GatewayConfig) -> Result<StrategyKind, ValidationError> {
    let strategy: StrategyKind = config.strategy.parse()?;
    check_upstream_count(strategy, config.upstreams.len())?;
    for raw in &config.upstreams {
        parse_upstream_url(raw)?;
    }
    Ok(strategy)
}
