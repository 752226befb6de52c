//! Order sync gateway.
//!
//! Pushes orders to the remote order store. Local state is the source of
//! truth: a push never blocks or fails the user flow. Pushes are spawned on
//! the tokio runtime and failures go to a [`SyncObserver`].
//!
//! | Kind | Endpoint |
//! |------|----------|
//! | [`PushKind::Pending`] | `POST /api/orders` |
//! | [`PushKind::Confirmed`] | `POST /api/save-order` |
//!
//! The store upserts by order number, so repeating a push is harmless.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::instrument;
use url::Url;

use bazaar_core::{ErrorBody, Order, OrderNumber};

/// Errors from pushing an order.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid order store URL: {0}")]
    Url(#[from] url::ParseError),

    /// The store answered with a non-success status.
    #[error("order store rejected push ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Called outside a tokio runtime, so nothing could be spawned.
    #[error("no async runtime available for background push")]
    NoRuntime,
}

/// Which endpoint an order goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Pending,
    Confirmed,
}

impl PushKind {
    const fn path(self) -> &'static str {
        match self {
            Self::Pending => "api/orders",
            Self::Confirmed => "api/save-order",
        }
    }
}

impl std::fmt::Display for PushKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Where the order lifecycle sends orders after saving them locally.
pub trait OrderPublisher: Send + Sync {
    fn publish_pending(&self, order: &Order);
    fn publish_confirmed(&self, order: &Order);
}

/// Receives the outcome of background pushes.
pub trait SyncObserver: Send + Sync {
    fn push_failed(&self, kind: PushKind, order_number: &OrderNumber, error: &SyncError);

    fn push_succeeded(&self, _kind: PushKind, _order_number: &OrderNumber) {}
}

/// Logs failed pushes as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn push_failed(&self, kind: PushKind, order_number: &OrderNumber, error: &SyncError) {
        tracing::warn!(
            order_number = %order_number,
            kind = %kind,
            error = %error,
            "Order push failed"
        );
    }

    fn push_succeeded(&self, kind: PushKind, order_number: &OrderNumber) {
        tracing::debug!(order_number = %order_number, kind = %kind, "Order pushed");
    }
}

// =============================================================================
// SyncGateway
// =============================================================================

/// Deadline for one push, connection included.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the order store.
#[derive(Clone)]
pub struct SyncGateway {
    inner: Arc<SyncGatewayInner>,
}

struct SyncGatewayInner {
    client: reqwest::Client,
    base_url: Url,
    observer: Arc<dyn SyncObserver>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncGateway {
    /// Gateway that logs failures.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_observer(base_url, Arc::new(TracingObserver))
    }

    /// Gateway reporting to `observer`. Endpoint paths are resolved relative
    /// to `base_url`, so a base with a path needs a trailing slash.
    #[must_use]
    pub fn with_observer(base_url: Url, observer: Arc<dyn SyncObserver>) -> Self {
        Self::with_timeout(base_url, observer, PUSH_TIMEOUT)
    }

    /// Gateway whose pushes give up after `timeout`, reported to the observer
    /// as `SyncError::Http`.
    #[must_use]
    pub fn with_timeout(
        base_url: Url,
        observer: Arc<dyn SyncObserver>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SyncGatewayInner {
                client: super::http_client(timeout),
                base_url,
                observer,
                in_flight: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Push `order` and wait for the answer.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Http` if the store is unreachable, or
    /// `SyncError::Rejected` if it refuses the order.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn send(&self, kind: PushKind, order: &Order) -> Result<(), SyncError> {
        let url = self.inner.base_url.join(kind.path())?;
        let response = self.inner.client.post(url).json(order).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text).map_or(text, |body| body.error);
        Err(SyncError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    /// Wait for every background push started so far.
    pub async fn drain(&self) {
        let handles = match self.inner.in_flight.lock() {
            Ok(mut in_flight) => std::mem::take(&mut *in_flight),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Order push task failed");
            }
        }
    }

    fn spawn(&self, kind: PushKind, order: &Order) {
        let Ok(runtime) = Handle::try_current() else {
            self.inner
                .observer
                .push_failed(kind, &order.order_number, &SyncError::NoRuntime);
            return;
        };

        let gateway = self.clone();
        let order = order.clone();
        let handle = runtime.spawn(async move {
            match gateway.send(kind, &order).await {
                Ok(()) => gateway.inner.observer.push_succeeded(kind, &order.order_number),
                Err(e) => gateway
                    .inner
                    .observer
                    .push_failed(kind, &order.order_number, &e),
            }
        });

        if let Ok(mut in_flight) = self.inner.in_flight.lock() {
            in_flight.retain(|h| !h.is_finished());
            in_flight.push(handle);
        }
    }
}

impl OrderPublisher for SyncGateway {
    fn publish_pending(&self, order: &Order) {
        self.spawn(PushKind::Pending, order);
    }

    fn publish_confirmed(&self, order: &Order) {
        self.spawn(PushKind::Confirmed, order);
    }
}
