//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce per-upstream deadline)
//!     → On failure: the dispatch strategy decides (race loss, fallback advance)
//! ```
//!
//! # Design Decisions
//! - Every upstream call can carry its own deadline so one slow upstream
//!   cannot stall the gateway
//! - No retries inside a single upstream; redundancy comes from the strategy

pub mod timeouts;
