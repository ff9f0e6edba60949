//! HTTP(S) upstream client.

use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use url::Url;

use crate::upstream::types::{UpstreamClient, UpstreamError};

/// Forwards requests to a single JSON-RPC endpoint over HTTP(S).
///
/// Each instance owns its own connection pool.
#[derive(Debug)]
pub struct HttpUpstream {
    url: Url,
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(url: Url, connect_timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(limit) = connect_timeout {
            builder = builder.connect_timeout(limit);
        }
        Ok(Self {
            url,
            client: builder.build()?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn post(&self, request: Bytes) -> Result<Bytes, UpstreamError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        response.bytes().await.map_err(classify)
    }
}

impl UpstreamClient for HttpUpstream {
    fn send(&self, request: Bytes) -> BoxFuture<'_, Result<Bytes, UpstreamError>> {
        Box::pin(self.post(request))
    }
}

/// Map reqwest failures onto transport errors, dropping the URL.
fn classify(err: reqwest::Error) -> UpstreamError {
    let err = err.without_url();
    if err.is_connect() {
        UpstreamError::Connect(err.to_string())
    } else {
        UpstreamError::Transport(err.to_string())
    }
}
