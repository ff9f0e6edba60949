//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request bytes
//!     → types.rs (Upstream: deadline, metrics, logging)
//!     → http.rs (reqwest, http/https) | ws.rs (tokio-tungstenite, ws/wss)
//!     → raw response bytes or UpstreamError
//! ```
//!
//! # Design Decisions
//! - Dispatchers depend on the `UpstreamClient` capability, never on a transport
//! - Every upstream owns an independent client; nothing is shared between them
//! - Labels exclude URL paths so API keys never reach logs or clients

pub mod http;
pub mod types;
pub mod ws;

pub use http::HttpUpstream;
pub use types::{redacted_label, Upstream, UpstreamClient, UpstreamError};
pub use ws::WsUpstream;
