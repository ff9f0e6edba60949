//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (strategy tag, upstream count, URL schemes)
//!     → running.rs (RunningConfig: clients, whitelists, bound strategy)
//!     → handle.rs (ConfigHandle, shared with the request handler)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs / signals detect change
//!     → loader.rs loads new config
//!     → running.rs builds a new snapshot
//!     → atomic swap in handle.rs
//!     → in-flight requests finish on the snapshot they started with
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; changes require a full rebuild
//! - All fields have defaults to allow minimal configs
//! - A broken reload never replaces a working snapshot

pub mod handle;
pub mod loader;
pub mod running;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use handle::ConfigHandle;
pub use loader::{load_config, ConfigError};
pub use running::{BuildError, RunningConfig};
pub use schema::{GatewayConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig};
pub use validation::ValidationError;
