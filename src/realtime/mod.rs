//! Push-driven refresh.
//!
//! A [`RealtimeLink`] keeps a connection to an [`UpdateChannel`] open and
//! refreshes its session (cache dropped, debounced term searched again)
//! whenever an update arrives. A closed stream is treated as a disconnect
//! and reconnected with [`RetryConfig`] backoff.
//!
//! ```text
//! Disconnected → Connecting → Connected ──stream closed──→ Reconnecting
//!                    │                                         │
//!                    └──── retries exhausted ──→ Disconnected ←┘
//! ```

mod retry;

pub use retry::{retry, RetryConfig};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::FetchError;
use crate::metrics;
use crate::session::{SearchSession, Shared};

/// A change notification pushed by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// What changed, e.g. `"documents"`
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl UpdateEvent {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: Value::Null,
        }
    }
}

/// Source of push updates (websocket, SSE, message bus, ...).
#[async_trait]
pub trait UpdateChannel: Send + Sync {
    /// Open a stream. The link treats the receiver closing as a disconnect.
    async fn connect(&self) -> Result<mpsc::Receiver<UpdateEvent>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionStatus {
    /// Gauge value
    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Reconnecting => 3,
        }
    }
}

/// Background connection that refreshes a session on every update.
///
/// Dropping the link aborts the connection task.
pub struct RealtimeLink {
    status: watch::Receiver<ConnectionStatus>,
    updates: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl RealtimeLink {
    /// Start connecting `session` to `channel`.
    ///
    /// The link only holds a weak reference to the session and stops once
    /// the session is gone.
    pub fn spawn<T>(session: &SearchSession<T>, channel: Arc<dyn UpdateChannel>, retry: RetryConfig) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let updates = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(
            Arc::downgrade(&session.shared),
            channel,
            retry,
            status_tx,
            Arc::clone(&updates),
        ));
        Self {
            status: status_rx,
            updates,
            task,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Updates received since the link started.
    #[must_use]
    pub fn updates_received(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RealtimeLink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn set_status(tx: &watch::Sender<ConnectionStatus>, status: ConnectionStatus) {
    debug!(?status, "Realtime status");
    metrics::set_realtime_status(status.as_u8());
    tx.send_replace(status);
}

async fn run<T>(
    session: Weak<Shared<T>>,
    channel: Arc<dyn UpdateChannel>,
    retry_config: RetryConfig,
    status: watch::Sender<ConnectionStatus>,
    updates: Arc<AtomicU64>,
) where
    T: Clone + Send + Sync + 'static,
{
    let mut reconnecting = false;

    loop {
        set_status(
            &status,
            if reconnecting {
                ConnectionStatus::Reconnecting
            } else {
                ConnectionStatus::Connecting
            },
        );

        let mut stream = match retry("realtime_connect", &retry_config, || channel.connect()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Realtime link gave up connecting");
                set_status(&status, ConnectionStatus::Disconnected);
                return;
            }
        };
        set_status(&status, ConnectionStatus::Connected);
        info!("Realtime link connected");

        while let Some(event) = stream.recv().await {
            let Some(shared) = session.upgrade() else {
                set_status(&status, ConnectionStatus::Disconnected);
                return;
            };
            let live = SearchSession { shared };

            updates.fetch_add(1, Ordering::Relaxed);
            metrics::record_realtime_update();
            debug!(session = %live.id(), topic = %event.topic, "Update received, refreshing");
            live.refresh().await;
        }

        if session.strong_count() == 0 {
            set_status(&status, ConnectionStatus::Disconnected);
            return;
        }
        info!("Realtime stream closed, reconnecting");
        reconnecting = true;
    }
}
