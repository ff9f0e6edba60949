//! Single-upstream pass-through.

use bytes::Bytes;

use crate::dispatch::{DispatchError, UpstreamFailure};
use crate::upstream::Upstream;

/// Forwards to exactly one upstream, no retry.
#[derive(Debug)]
pub struct Naive {
    upstream: Upstream,
}

impl Naive {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        std::slice::from_ref(&self.upstream)
    }

    pub async fn dispatch(&self, request: Bytes) -> Result<Bytes, DispatchError> {
        self.upstream.call(request).await.map_err(|error| {
            DispatchError::Upstream(UpstreamFailure {
                index: self.upstream.index(),
                error,
            })
        })
    }
}
