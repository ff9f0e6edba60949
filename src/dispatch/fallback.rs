//! Sequential fallback chain.

use bytes::Bytes;

use crate::dispatch::{DispatchError, UpstreamFailure};
use crate::upstream::Upstream;

/// Tries upstreams strictly in configured order; no concurrency within a request.
#[derive(Debug)]
pub struct Fallback {
    upstreams: Vec<Upstream>,
}

impl Fallback {
    pub fn new(upstreams: Vec<Upstream>) -> Self {
        Self { upstreams }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    pub async fn dispatch(&self, request: Bytes) -> Result<Bytes, DispatchError> {
        let mut failures = Vec::with_capacity(self.upstreams.len());

        for upstream in &self.upstreams {
            match upstream.call(request.clone()).await {
                Ok(payload) => {
                    if !failures.is_empty() {
                        tracing::info!(
                            upstream = upstream.index(),
                            skipped = failures.len(),
                            "Fallback upstream answered"
                        );
                    }
                    return Ok(payload);
                }
                Err(error) => failures.push(UpstreamFailure {
                    index: upstream.index(),
                    error,
                }),
            }
        }

        Err(DispatchError::Exhausted(failures))
    }
}
