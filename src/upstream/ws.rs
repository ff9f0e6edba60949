//! WS(S) upstream client.
//!
//! Opens a dedicated connection per call, sends the request as one text
//! frame and returns the first data frame. A fresh connection carries no
//! subscriptions, so the first data frame is the response, and the request
//! id never needs rewriting.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::upstream::types::{UpstreamClient, UpstreamError};

#[derive(Debug)]
pub struct WsUpstream {
    url: Url,
}

impl WsUpstream {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn roundtrip(&self, request: Bytes) -> Result<Bytes, UpstreamError> {
        let text = String::from_utf8(request.to_vec())
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let (mut stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        stream.send(Message::text(text)).await.map_err(ws_error)?;

        while let Some(message) = stream.next().await {
            let payload = match message.map_err(ws_error)? {
                Message::Text(text) => Bytes::copy_from_slice(text.as_str().as_bytes()),
                Message::Binary(data) => data,
                Message::Close(_) => return Err(UpstreamError::Closed),
                _ => continue,
            };
            if let Err(e) = stream.close(None).await {
                tracing::debug!(error = %e, "Websocket close handshake failed");
            }
            return Ok(payload);
        }

        Err(UpstreamError::Closed)
    }
}

impl UpstreamClient for WsUpstream {
    fn send(&self, request: Bytes) -> BoxFuture<'_, Result<Bytes, UpstreamError>> {
        Box::pin(self.roundtrip(request))
    }
}

fn ws_error(err: tokio_tungstenite::tungstenite::Error) -> UpstreamError {
    UpstreamError::WebSocket(err.to_string())
}
