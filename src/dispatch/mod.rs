//! Dispatch strategies.
//!
//! # Data Flow
//! ```text
//! Admitted request bytes
//!     → Dispatcher (variant bound once at config build time)
//!         Naive    → the single upstream
//!         Race     → every upstream concurrently, first transport success wins
//!         Fallback → upstreams in order, advance on transport failure
//!     → winning payload (verbatim) or DispatchError
//! ```
//!
//! # Design Decisions
//! - Closed set of variants, matched statically; no per-request string checks
//! - A JSON-RPC error payload is a win; only transport failures count as losses
//! - Aggregate failures list every upstream in configured order

pub mod fallback;
pub mod naive;
pub mod race;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use thiserror::Error;

use crate::config::validation::{check_upstream_count, ValidationError};
use crate::upstream::{Upstream, UpstreamError};

pub use fallback::Fallback;
pub use naive::Naive;
pub use race::Race;

/// Strategy tag as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Naive,
    Race,
    Fallback,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Naive => "NAIVE",
            StrategyKind::Race => "RACE",
            StrategyKind::Fallback => "FALLBACK",
        }
    }

    /// Whether `count` upstreams form a valid topology for this strategy.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            StrategyKind::Naive => count == 1,
            StrategyKind::Race | StrategyKind::Fallback => count >= 2,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ValidationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "NAIVE" => Ok(StrategyKind::Naive),
            "RACE" => Ok(StrategyKind::Race),
            "FALLBACK" => Ok(StrategyKind::Fallback),
            _ => Err(ValidationError::UnknownStrategy(tag.to_string())),
        }
    }
}

/// Transport failure attributed to one upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub index: usize,
    pub error: UpstreamError,
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream[{}]: {}", self.index, self.error)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The only upstream failed (Naive).
    #[error("{0}")]
    Upstream(UpstreamFailure),

    /// Every upstream failed (Race, Fallback).
    #[error("all {count} upstreams failed: {list}", count = .0.len(), list = join_failures(.0))]
    Exhausted(Vec<UpstreamFailure>),
}

fn join_failures(failures: &[UpstreamFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The strategy bound into a running configuration.
#[derive(Debug)]
pub enum Dispatcher {
    Naive(Naive),
    Race(Race),
    Fallback(Fallback),
}

impl Dispatcher {
    /// Bind `upstreams` to the strategy, enforcing its topology invariant.
    pub fn new(kind: StrategyKind, upstreams: Vec<Upstream>) -> Result<Self, ValidationError> {
        check_upstream_count(kind, upstreams.len())?;

        Ok(match kind {
            StrategyKind::Naive => {
                let upstream = upstreams
                    .into_iter()
                    .next()
                    .ok_or(ValidationError::UpstreamCount { strategy: kind, count: 0 })?;
                Dispatcher::Naive(Naive::new(upstream))
            }
            StrategyKind::Race => Dispatcher::Race(Race::new(upstreams)),
            StrategyKind::Fallback => Dispatcher::Fallback(Fallback::new(upstreams)),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Dispatcher::Naive(_) => StrategyKind::Naive,
            Dispatcher::Race(_) => StrategyKind::Race,
            Dispatcher::Fallback(_) => StrategyKind::Fallback,
        }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        match self {
            Dispatcher::Naive(s) => s.upstreams(),
            Dispatcher::Race(s) => s.upstreams(),
            Dispatcher::Fallback(s) => s.upstreams(),
        }
    }

    /// Forward `request` and return the winning payload.
    pub async fn dispatch(&self, request: Bytes) -> Result<Bytes, DispatchError> {
        match self {
            Dispatcher::Naive(s) => s.dispatch(request).await,
            Dispatcher::Race(s) => s.dispatch(request).await,
            Dispatcher::Fallback(s) => s.dispatch(request).await,
        }
    }
}
