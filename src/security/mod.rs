//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed RequestData:
//!     → validator.rs (method allow list, default-deny rules)
//!     → raw_tx.rs (hex + RLP decode for eth_sendRawTransaction)
//!     → Verdict: Allowed / Denied / DecodeError
//! ```
//!
//! # Design Decisions
//! - Fail closed: unknown methods are denied even when allow-listed
//! - No trust in client input: every decode stage is fallible, nothing panics
//! - Validation is a pure function of the whitelist tables and the request

pub mod raw_tx;
pub mod types;
pub mod validator;

pub use types::{DecodeError, DenyReason, Verdict};
pub use validator::RequestValidator;
