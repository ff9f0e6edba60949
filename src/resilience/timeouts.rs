//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a per-upstream deadline
//! - Cancel the wrapped call cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other transport errors
//! - `None` means no deadline; the caller's own cancellation still applies

use std::future::Future;
use std::time::Duration;

use crate::upstream::UpstreamError;

/// Run `fut` under an optional deadline.
///
/// On expiry the inner future is dropped, cancelling the call.
pub async fn with_timeout<F, T>(deadline: Option<Duration>, fut: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(UpstreamError::Timeout(limit))),
        None => fut.await,
    }
}

/// Interpret a seconds setting where 0 disables the deadline.
pub fn from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
