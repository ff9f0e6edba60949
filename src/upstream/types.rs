//! Upstream capability and transport error definitions.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;
use url::Url;

use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Transport-level failure talking to one upstream.
///
/// JSON-RPC error payloads are not failures; they come back as `Ok` bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("connection closed before a response was received")]
    Closed,

    #[error("forwarding task aborted: {0}")]
    Aborted(String),
}

/// The `send(request) -> response-or-error` capability.
///
/// Implementations own their transport state; two clients never share it.
pub trait UpstreamClient: Send + Sync + 'static {
    /// Forward the request bytes unmodified and return the raw response bytes.
    fn send(&self, request: Bytes) -> BoxFuture<'_, Result<Bytes, UpstreamError>>;
}

/// A configured upstream: position, log-safe label, client and call deadline.
#[derive(Clone)]
pub struct Upstream {
    index: usize,
    label: String,
    client: Arc<dyn UpstreamClient>,
    timeout: Option<Duration>,
}

impl Upstream {
    pub fn new(
        index: usize,
        label: impl Into<String>,
        client: Arc<dyn UpstreamClient>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            index,
            label: label.into(),
            client,
            timeout,
        }
    }

    /// Position in the configured upstream list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Scheme, host and port only; paths often carry API keys.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Forward a request, bounded by this upstream's deadline.
    pub async fn call(&self, request: Bytes) -> Result<Bytes, UpstreamError> {
        let start = Instant::now();
        let result = with_timeout(self.timeout, self.client.send(request)).await;

        metrics::record_upstream_call(self.index, result.is_ok(), start);
        if let Err(e) = &result {
            tracing::warn!(
                upstream = self.index,
                label = %self.label,
                error = %e,
                "Upstream call failed"
            );
        }
        result
    }
}

impl fmt::Debug for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upstream")
            .field("index", &self.index)
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Log-safe rendering of an upstream URL.
pub fn redacted_label(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", url.scheme(), host),
        _ => url.scheme().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scripted upstream for dispatcher tests.
    pub(crate) struct MockUpstream {
        pub delay: Duration,
        pub result: Result<Bytes, UpstreamError>,
        pub calls: AtomicUsize,
        /// Set when an in-flight call is dropped before completing.
        pub cancelled: Arc<AtomicBool>,
    }

    impl MockUpstream {
        pub(crate) fn ok(delay_ms: u64, body: &'static str) -> Arc<Self> {
            Arc::new(Self::with(delay_ms, Ok(Bytes::from_static(body.as_bytes()))))
        }

        pub(crate) fn err(delay_ms: u64, error: UpstreamError) -> Arc<Self> {
            Arc::new(Self::with(delay_ms, Err(error)))
        }

        fn with(delay_ms: u64, result: Result<Bytes, UpstreamError>) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                result,
                calls: AtomicUsize::new(0),
                cancelled: Arc::new(AtomicBool::new(false)),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn was_cancelled(&self) -> bool {
            self.cancelled.load(Ordering::SeqCst)
        }
    }

    struct CancelGuard {
        flag: Arc<AtomicBool>,
        armed: bool,
    }

    impl Drop for CancelGuard {
        fn drop(&mut self) {
            if self.armed {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    impl UpstreamClient for MockUpstream {
        fn send(&self, _request: Bytes) -> BoxFuture<'_, Result<Bytes, UpstreamError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let mut guard = CancelGuard {
                    flag: self.cancelled.clone(),
                    armed: true,
                };
                tokio::time::sleep(self.delay).await;
                guard.armed = false;
                self.result.clone()
            })
        }
    }

    pub(crate) fn upstream(index: usize, client: Arc<MockUpstream>) -> Upstream {
        Upstream::new(index, format!("mock://{index}"), client, None)
    }

    #[test]
    fn test_redacted_label_hides_path() {
        let url: Url = "https://mainnet.example.io/v3/secret-key".parse().unwrap();
        assert_eq!(redacted_label(&url), "https://mainnet.example.io");

        let url: Url = "ws://127.0.0.1:8546/".parse().unwrap();
        assert_eq!(redacted_label(&url), "ws://127.0.0.1:8546");
    }

    #[tokio::test]
    async fn test_call_applies_timeout() {
        let mock = MockUpstream::ok(500, "{}");
        let upstream = Upstream::new(0, "mock://0", mock.clone(), Some(Duration::from_millis(20)));

        let err = upstream.call(Bytes::new()).await.unwrap_err();
        assert_eq!(err, UpstreamError::Timeout(Duration::from_millis(20)));
        assert!(mock.was_cancelled());
    }
}
