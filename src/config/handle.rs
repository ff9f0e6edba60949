//! Atomically swappable handle to the current [`RunningConfig`].
//!
//! Requests call [`ConfigHandle::current`] once at start and keep that
//! `Arc` for their whole lifetime. A reload stores a new snapshot; the old
//! one (and its upstream clients) is dropped when the last in-flight request
//! holding it finishes.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::running::{BuildError, RunningConfig};
use crate::config::schema::GatewayConfig;
use crate::observability::metrics;

#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<RunningConfig>>,
}

impl ConfigHandle {
    pub fn new(initial: RunningConfig) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Snapshot for one request. Lock-free.
    pub fn current(&self) -> Arc<RunningConfig> {
        self.current.load_full()
    }

    /// Install an already built snapshot.
    pub fn install(&self, next: RunningConfig) {
        let previous = self.current.swap(Arc::new(next));
        tracing::debug!(
            in_flight_refs = Arc::strong_count(&previous) - 1,
            "Previous running config retired"
        );
    }

    /// Build a snapshot from `config` and swap it in.
    ///
    /// On failure the current snapshot stays in place. Listener settings are
    /// fixed when the router is built, so changes to them are reported and
    /// carried over unchanged.
    pub fn reload(&self, config: &GatewayConfig) -> Result<(), BuildError> {
        match RunningConfig::build(config) {
            Ok(next) => {
                let bound = self.current().listener().clone();
                if *next.listener() != bound {
                    tracing::warn!(
                        bound_address = %bound.bind_address,
                        requested_address = %config.listener.bind_address,
                        bound_max_body_size = bound.max_body_size,
                        requested_max_body_size = config.listener.max_body_size,
                        "Listener settings changed; restart required for them to take effect"
                    );
                }
                self.install(next.with_listener(bound));
                metrics::record_reload(true);
                tracing::info!("Running config reloaded");
                Ok(())
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(error = %e, "Reload rejected, keeping current configuration");
                Err(e)
            }
        }
    }

    /// Apply configuration updates until the sender side closes.
    pub async fn apply_updates(self, mut updates: mpsc::UnboundedReceiver<GatewayConfig>) {
        while let Some(config) = updates.recv().await {
            let _ = self.reload(&config);
        }
        tracing::debug!("Config update channel closed");
    }
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("strategy", &self.current().strategy())
            .finish()
    }
}
