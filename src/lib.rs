//! Protective JSON-RPC gateway for Ethereum nodes.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod upstream;

pub use config::{ConfigHandle, GatewayConfig, RunningConfig};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
