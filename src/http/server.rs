//! HTTP server setup and the JSON-RPC request handler.
//!
//! # Responsibilities
//! - Create the Axum router for `POST /`
//! - Wire up middleware (tracing, body limit, request ID)
//! - Parse → validate → dispatch → respond for every request
//! - Serve with graceful shutdown bounded by a grace period
//!
//! # Design Decisions
//! - The request deadline is enforced around dispatch, not as a tower layer,
//!   so expiry still answers with the JSON-RPC error shape
//! - The deadline comes from the per-request snapshot and follows reloads

use std::future::IntoFuture;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigHandle, GatewayConfig};
use crate::http::request::{best_effort_id, RequestData};
use crate::http::response::{json_response, ErrorResponse};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::security::Verdict;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: ConfigHandle,
}

/// HTTP front end of the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, handle: ConfigHandle) -> Self {
        let state = GatewayState { config: handle };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: GatewayState) -> Router {
        Router::new()
            .route("/", post(rpc_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until shutdown is signalled.
    ///
    /// In-flight requests get `grace` to finish after the signal; whatever is
    /// left after that is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
        grace: Duration,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let deadline = shutdown.resubscribe();
        let server = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::signalled(shutdown))
            .into_future();

        tokio::select! {
            result = server => result?,
            _ = shutdown::grace_expired(deadline, grace) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period expired, dropping in-flight requests");
            }
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Handle one JSON-RPC request.
async fn rpc_handler(State(state): State<GatewayState>, body: Bytes) -> Response {
    let start = Instant::now();

    let request = match RequestData::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed request body");
            metrics::record_request("decode_error", start);
            return ErrorResponse::invalid_params(best_effort_id(&body), e.to_string()).into_response();
        }
    };

    // One snapshot for the whole request; a concurrent reload does not affect it.
    let running = state.config.current();

    match running.validator().validate(&request) {
        Verdict::Allowed => {}
        Verdict::Denied(reason) => {
            tracing::info!(method = %request.method, reason = %reason, "Request denied");
            metrics::record_request("denied", start);
            return ErrorResponse::invalid_params(request.id, reason.to_string()).into_response();
        }
        Verdict::DecodeError(e) => {
            tracing::info!(method = %request.method, error = %e, "Request params rejected");
            metrics::record_request("decode_error", start);
            return ErrorResponse::invalid_params(request.id, e.to_string()).into_response();
        }
    }

    let dispatched = match running.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, running.dispatcher().dispatch(body))
            .await
            .map_err(|_| limit),
        None => Ok(running.dispatcher().dispatch(body).await),
    };

    match dispatched {
        Ok(Ok(payload)) => {
            tracing::debug!(
                method = %request.method,
                strategy = %running.strategy(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request forwarded"
            );
            metrics::record_request("forwarded", start);
            json_response(payload)
        }
        Ok(Err(e)) => {
            tracing::warn!(method = %request.method, strategy = %running.strategy(), error = %e, "Dispatch failed");
            metrics::record_request("upstream_error", start);
            ErrorResponse::internal(request.id, e.to_string()).into_response()
        }
        Err(limit) => {
            tracing::warn!(method = %request.method, strategy = %running.strategy(), deadline = ?limit, "Request deadline exceeded");
            metrics::record_request("timeout", start);
            ErrorResponse::internal(request.id, format!("request timed out after {limit:?}")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunningConfig;
    use crate::dispatch::{Dispatcher, StrategyKind};
    use crate::http::response::codes;
    use crate::security::raw_tx::tests::{legacy_tx, TOKEN};
    use crate::security::RequestValidator;
    use crate::upstream::types::tests::{upstream, MockUpstream};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn running_with(kind: StrategyKind, mocks: &[Arc<MockUpstream>], limitation: bool) -> RunningConfig {
        let upstreams = mocks
            .iter()
            .enumerate()
            .map(|(i, mock)| upstream(i, mock.clone()))
            .collect();
        let dispatcher = Dispatcher::new(kind, upstreams).unwrap();
        let validator = RequestValidator::new(
            limitation,
            ["eth_getBalance", "eth_sendRawTransaction", "eth_call"],
            [TOKEN.to_string()],
        );
        RunningConfig::from_parts(dispatcher, validator)
    }

    fn router_for(running: RunningConfig) -> Router {
        GatewayServer::new(&GatewayConfig::default(), ConfigHandle::new(running)).router()
    }

    fn server_with(kind: StrategyKind, mocks: &[Arc<MockUpstream>], limitation: bool) -> Router {
        router_for(running_with(kind, mocks, limitation))
    }

    const BALANCE: &str = r#"{"jsonrpc":"2.0","id":8,"method":"eth_getBalance","params":["0x01","latest"]}"#;

    async fn send_rpc(router: Router, body: impl Into<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, request_id, bytes.to_vec())
    }

    fn error_of(body: &[u8]) -> (i64, i64, String) {
        let value: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        (
            value["id"].as_i64().unwrap(),
            value["error"]["code"].as_i64().unwrap(),
            value["error"]["message"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_upstream_payload_passes_through_verbatim() {
        let payload = r#"{"jsonrpc":"2.0", "id":5,"result":"0x10" }"#;
        let mock = MockUpstream::ok(0, payload);
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let request = r#"{"jsonrpc":"2.0","id":5,"method":"eth_getBalance","params":["0x01","latest"]}"#;
        let (status, request_id, body) = send_rpc(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(request_id.is_some());
        assert_eq!(body, payload.as_bytes());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_invalid_params_with_default_id() {
        let mock = MockUpstream::ok(0, "{}");
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let (status, _, body) = send_rpc(router, "{not json").await;

        assert_eq!(status, StatusCode::OK);
        let (id, code, _) = error_of(&body);
        assert_eq!(id, 0);
        assert_eq!(code, codes::INVALID_PARAMS);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_denied_method_never_reaches_upstream() {
        let mock = MockUpstream::ok(0, "{}");
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let request = r#"{"jsonrpc":"2.0","id":9,"method":"debug_traceTransaction","params":[]}"#;
        let (_, _, body) = send_rpc(router, request).await;

        let (id, code, message) = error_of(&body);
        assert_eq!(id, 9);
        assert_eq!(code, codes::INVALID_PARAMS);
        assert_eq!(message, "not allowed method");
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_limitation_off_forwards_anything() {
        let mock = MockUpstream::ok(0, r#"{"result":1}"#);
        let router = server_with(StrategyKind::Naive, &[mock.clone()], false);

        let request = r#"{"jsonrpc":"2.0","id":1,"method":"debug_traceTransaction","params":[]}"#;
        let (_, _, body) = send_rpc(router, request).await;

        assert_eq!(body, br#"{"result":1}"#.to_vec());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_raw_transaction_to_unlisted_contract_is_denied() {
        let mock = MockUpstream::ok(0, "{}");
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let raw = legacy_tx(&[0x11; 20]);
        let request = json!({"jsonrpc":"2.0","id":3,"method":"eth_sendRawTransaction","params":[raw]});
        let (_, _, body) = send_rpc(router, request.to_string()).await;

        let (id, code, message) = error_of(&body);
        assert_eq!(id, 3);
        assert_eq!(code, codes::INVALID_PARAMS);
        assert_eq!(message, "contract not in whitelist");
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_transaction_to_listed_contract_is_forwarded() {
        let mock = MockUpstream::ok(0, r#"{"result":"0xhash"}"#);
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let raw = legacy_tx(TOKEN.as_slice());
        let request = json!({"jsonrpc":"2.0","id":3,"method":"eth_sendRawTransaction","params":[raw]});
        let (_, _, body) = send_rpc(router, request.to_string()).await;

        assert_eq!(body, br#"{"result":"0xhash"}"#.to_vec());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_params_get_invalid_params() {
        let mock = MockUpstream::ok(0, "{}");
        let router = server_with(StrategyKind::Naive, &[mock.clone()], true);

        let request = r#"{"jsonrpc":"2.0","id":4,"method":"eth_sendRawTransaction","params":["zz"]}"#;
        let (_, _, body) = send_rpc(router, request).await;

        let (id, code, _) = error_of(&body);
        assert_eq!(id, 4);
        assert_eq!(code, codes::INVALID_PARAMS);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_dispatch_gets_internal_error() {
        let mocks = [
            MockUpstream::err(0, crate::upstream::UpstreamError::Closed),
            MockUpstream::err(0, crate::upstream::UpstreamError::Status(502)),
        ];
        let router = server_with(StrategyKind::Fallback, &mocks, true);

        let (status, _, body) = send_rpc(router, BALANCE).await;

        assert_eq!(status, StatusCode::OK);
        let (id, code, message) = error_of(&body);
        assert_eq!(id, 8);
        assert_eq!(code, codes::INTERNAL_ERROR);
        assert!(message.contains("upstream[1]"), "{message}");
        assert!(!message.contains("http://"), "{message}");
    }

    #[tokio::test]
    async fn test_slow_fallback_chain_gets_error_shape_at_deadline() {
        let mocks = [
            MockUpstream::ok(60_000, "{}"),
            MockUpstream::ok(60_000, "{}"),
            MockUpstream::ok(60_000, "{}"),
        ];
        let running = running_with(StrategyKind::Fallback, &mocks, true)
            .with_request_timeout(Some(Duration::from_millis(50)));

        let start = Instant::now();
        let (status, _, body) = send_rpc(router_for(running), BALANCE).await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(status, StatusCode::OK);
        let (id, code, message) = error_of(&body);
        assert_eq!(id, 8);
        assert_eq!(code, codes::INTERNAL_ERROR);
        assert!(message.contains("timed out"), "{message}");
        assert!(mocks[0].was_cancelled());
        assert_eq!(mocks[1].calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_request_deadline_waits_for_upstream() {
        let mock = MockUpstream::ok(100, r#"{"result":"late"}"#);
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 0;
        let running = running_with(StrategyKind::Naive, &[mock.clone()], true)
            .with_request_timeout(crate::resilience::timeouts::from_secs(config.timeouts.request_secs));
        assert_eq!(running.request_timeout(), None);

        let router = GatewayServer::new(&config, ConfigHandle::new(running)).router();
        let (status, _, body) = send_rpc(router, BALANCE).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"result":"late"}"#.to_vec());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_is_not_routed() {
        let mock = MockUpstream::ok(0, "{}");
        let router = server_with(StrategyKind::Naive, &[mock], true);

        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
