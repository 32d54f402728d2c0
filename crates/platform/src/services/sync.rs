//! Change notifications.
//!
//! Every mutation publishes a [`SyncEvent`] on a bounded broadcast channel.
//! Open browser sessions receive them over SSE and re-fetch; the storefront
//! uses them to drop cached stores and to wait for a store that is being
//! created. Subscribers that fall more than [`SyncHub::CAPACITY`] events
//! behind skip ahead and are expected to reload everything.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, error::RecvError};
use tracing::debug;

use bazaar_core::{ApplicationId, OrderId, ProductId, StoreId, UserId};

/// A change to platform data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum SyncEvent {
    StoreCreated {
        store_id: StoreId,
        subdomain: String,
        owner_id: UserId,
    },
    StoreUpdated {
        store_id: StoreId,
        subdomain: String,
    },
    StoreCustomizationUpdated {
        store_id: StoreId,
        subdomain: String,
    },
    ProductCreated {
        store_id: StoreId,
        product_id: ProductId,
    },
    ProductUpdated {
        store_id: StoreId,
        product_id: ProductId,
    },
    ProductDeleted {
        store_id: StoreId,
        product_id: ProductId,
    },
    CategoriesUpdated {
        store_id: StoreId,
    },
    CustomersUpdated {
        store_id: StoreId,
    },
    OrderCreated {
        store_id: StoreId,
        order_id: OrderId,
    },
    OrderUpdated {
        store_id: StoreId,
        order_id: OrderId,
    },
    ApplicationSubmitted {
        application_id: ApplicationId,
    },
    ApplicationApproved {
        application_id: ApplicationId,
        store_id: StoreId,
    },
    ApplicationRejected {
        application_id: ApplicationId,
    },
}

impl SyncEvent {
    /// Store the event concerns, if any.
    #[must_use]
    pub const fn store_id(&self) -> Option<&StoreId> {
        match self {
            Self::StoreCreated { store_id, .. }
            | Self::StoreUpdated { store_id, .. }
            | Self::StoreCustomizationUpdated { store_id, .. }
            | Self::ProductCreated { store_id, .. }
            | Self::ProductUpdated { store_id, .. }
            | Self::ProductDeleted { store_id, .. }
            | Self::CategoriesUpdated { store_id }
            | Self::CustomersUpdated { store_id }
            | Self::OrderCreated { store_id, .. }
            | Self::OrderUpdated { store_id, .. }
            | Self::ApplicationApproved { store_id, .. } => Some(store_id),
            Self::ApplicationSubmitted { .. } | Self::ApplicationRejected { .. } => None,
        }
    }

    /// Whether the store document itself changed.
    #[must_use]
    pub const fn changes_store(&self) -> bool {
        matches!(
            self,
            Self::StoreCreated { .. }
                | Self::StoreUpdated { .. }
                | Self::StoreCustomizationUpdated { .. }
        )
    }
}

/// An event with its publication time (unix millis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncMessage {
    #[serde(flatten)]
    pub event: SyncEvent,
    pub timestamp: i64,
}

/// Callback run inside [`SyncHub::publish`].
type Listener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// In-process broadcast hub for [`SyncEvent`]s.
///
/// Listeners registered with [`SyncHub::with_listener`] run synchronously
/// before the event is broadcast, so their effects are visible as soon as
/// the publishing write returns.
#[derive(Clone)]
pub struct SyncHub {
    sender: broadcast::Sender<SyncMessage>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for SyncHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHub")
            .field("subscribers", &self.sender.receiver_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncHub {
    /// Events buffered per subscriber before it starts lagging.
    pub const CAPACITY: usize = 256;

    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self {
            sender,
            listeners: Vec::new(),
        }
    }

    /// Run `listener` on every published event, before subscribers see it.
    #[must_use]
    pub fn with_listener(mut self, listener: impl Fn(&SyncEvent) + Send + Sync + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Run the listeners, then broadcast an event to every current
    /// subscriber.
    pub fn publish(&self, event: SyncEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        let message = SyncMessage {
            event,
            timestamp: Utc::now().timestamp_millis(),
        };
        // Sending only fails when nobody listens.
        let receivers = self.sender.send(message).unwrap_or(0);
        debug!(receivers, "Published sync event");
    }

    #[must_use]
    pub fn subscribe(&self) -> Receiver<SyncMessage> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Wait up to `timeout` for an event accepted by `matches`.
///
/// Lagging is tolerated (skipped events are simply missed); a closed
/// channel or the deadline yields `None`.
pub async fn wait_for<F>(
    rx: &mut Receiver<SyncMessage>,
    timeout: Duration,
    mut matches: F,
) -> Option<SyncEvent>
where
    F: FnMut(&SyncEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Err(_) | Ok(Err(RecvError::Closed)) => return None,
            Ok(Err(RecvError::Lagged(skipped))) => {
                debug!(skipped, "Sync subscriber lagged while waiting");
            }
            Ok(Ok(message)) if matches(&message.event) => return Some(message.event),
            Ok(Ok(_)) => {}
        }
    }
}
