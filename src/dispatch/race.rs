//! Concurrent race across all upstreams.
//!
//! Every upstream gets its own task in a request-scoped `JoinSet`. The first
//! transport success wins and the set is aborted, cancelling the losers
//! without touching tasks that belong to other requests. Dropping the
//! dispatch future (client gone, request timeout) aborts the set as well.

use bytes::Bytes;
use tokio::task::JoinSet;

use crate::dispatch::{DispatchError, UpstreamFailure};
use crate::upstream::{Upstream, UpstreamError};

#[derive(Debug)]
pub struct Race {
    upstreams: Vec<Upstream>,
}

impl Race {
    pub fn new(upstreams: Vec<Upstream>) -> Self {
        Self { upstreams }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    pub async fn dispatch(&self, request: Bytes) -> Result<Bytes, DispatchError> {
        let mut tasks = JoinSet::new();
        for (slot, upstream) in self.upstreams.iter().enumerate() {
            let upstream = upstream.clone();
            let request = request.clone();
            tasks.spawn(async move { (slot, upstream.call(request).await) });
        }

        let mut errors: Vec<Option<UpstreamError>> = vec![None; self.upstreams.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, Ok(payload))) => {
                    tasks.abort_all();
                    tracing::debug!(
                        winner = self.upstreams[slot].index(),
                        cancelled = tasks.len(),
                        "Race won"
                    );
                    return Ok(payload);
                }
                Ok((slot, Err(error))) => errors[slot] = Some(error),
                Err(e) => tracing::error!(error = %e, "Race task failed"),
            }
        }

        let failures = self
            .upstreams
            .iter()
            .zip(errors)
            .map(|(upstream, error)| UpstreamFailure {
                index: upstream.index(),
                error: error.unwrap_or_else(|| UpstreamError::Aborted("task failed".to_string())),
            })
            .collect();
        Err(DispatchError::Exhausted(failures))
    }
}
