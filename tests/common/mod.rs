//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Bytes, http::StatusCode, routing::post, Router};
use tokio::net::TcpListener;

use jsonrpc_gateway::config::GatewayConfig;
use jsonrpc_gateway::{ConfigHandle, GatewayServer, RunningConfig, Shutdown};

/// Behaviour of a mock upstream node.
#[derive(Clone)]
pub struct MockNode {
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Duration,
}

impl MockNode {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status,
            body: "upstream failure",
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A running mock node and the request bodies it has seen.
pub struct RunningNode {
    pub url: String,
    hits: Arc<AtomicUsize>,
    received: Arc<std::sync::Mutex<Vec<Bytes>>>,
}

impl RunningNode {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock JSON-RPC node on an ephemeral port.
pub async fn start_mock_node(node: MockNode) -> RunningNode {
    let hits = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(std::sync::Mutex::new(Vec::new()));

    let (h, r) = (hits.clone(), received.clone());
    let app = Router::new().route(
        "/",
        post(move |body: Bytes| {
            let node = node.clone();
            let (h, r) = (h.clone(), r.clone());
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                r.lock().unwrap().push(body);
                tokio::time::sleep(node.delay).await;
                (node.status, node.body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    RunningNode {
        url: format!("http://{addr}/"),
        hits,
        received,
    }
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Gateway config with the given strategy and upstreams and an open policy.
pub fn gateway_config(strategy: &str, upstreams: Vec<String>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.strategy = strategy.to_string();
    config.upstreams = upstreams;
    config.timeouts.upstream_secs = 5;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, ConfigHandle, Shutdown) {
    let running = RunningConfig::build(&config).unwrap();
    let handle = ConfigHandle::new(running);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(&config, handle.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server
            .run(listener, server_shutdown, Duration::from_secs(1))
            .await;
    });

    (addr, handle, shutdown)
}

/// POST a JSON-RPC body to the gateway and return the response body.
pub async fn rpc(addr: SocketAddr, body: &str) -> (u16, String) {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .post(format!("http://{addr}/"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .expect("Gateway unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}
