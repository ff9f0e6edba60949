//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handler)
//!     → request.rs (parse the JSON-RPC envelope)
//!     → [security layer decides admission]
//!     → [dispatch layer forwards to upstreams]
//!     → response.rs (raw passthrough or JSON-RPC error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Params, RequestData};
pub use response::ErrorResponse;
pub use server::GatewayServer;
