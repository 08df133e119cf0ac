use std::sync::Arc;

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::trace;

use crate::stdlib::FunctionDecl;

/// Kinds of compilation events published by the lowering rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StdlibFunctionImported,
    StdlibMissingItem,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StdlibFunctionImported => "stdlib_function_imported",
            EventKind::StdlibMissingItem => "stdlib_missing_item",
        }
    }
}

/// An event instance that can be published
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A standard library function was brought into scope
    StdlibFunctionImported { module: String, function: FunctionDecl },
    /// An imported name does not exist in the module
    StdlibMissingItem {
        module: String,
        name: String,
        origin: Option<String>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StdlibFunctionImported { .. } => EventKind::StdlibFunctionImported,
            Event::StdlibMissingItem { .. } => EventKind::StdlibMissingItem,
        }
    }
}

/// Type alias for event callback function
pub type EventCallback = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

pub type SubscriptionId = u64;

/// Event subscription for a listener
#[derive(Clone)]
pub struct EventSubscription {
    pub id: SubscriptionId,
    /// `None` receives every kind
    pub kind: Option<EventKind>,
    pub callback: EventCallback,
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("callback", &"<function>")
            .finish()
    }
}

/// In-process publish/subscribe bus
///
/// Delivery is synchronous and follows subscription order. Handlers see the
/// subscriber list as it was when `publish` was called, so they may subscribe
/// or unsubscribe without deadlocking the bus.
pub struct EventBus {
    subscriptions: RwLock<Vec<EventSubscription>>,
    next_subscription_id: Mutex<SubscriptionId>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            subscriptions: RwLock::new(Vec::new()),
            next_subscription_id: Mutex::new(1),
        }
    }

    /// Subscribe to one kind of event
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.add_subscription(Some(kind), Arc::new(callback))
    }

    /// Subscribe to every event
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        self.add_subscription(None, Arc::new(callback))
    }

    fn add_subscription(&self, kind: Option<EventKind>, callback: EventCallback) -> SubscriptionId {
        let id = {
            let mut next_id = self.next_subscription_id.lock();
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.subscriptions.write().push(EventSubscription { id, kind, callback });
        id
    }

    /// Unsubscribe from events
    pub fn unsubscribe(&self, subscription_id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != subscription_id);
        subscriptions.len() != before
    }

    /// Deliver `event` to every matching subscriber
    ///
    /// The first handler error stops delivery and is returned to the publisher.
    pub fn publish(&self, event: Event) -> Result<()> {
        let kind = event.kind();
        let matching: Vec<EventCallback> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.kind.is_none() || s.kind == Some(kind))
            .map(|s| s.callback.clone())
            .collect();

        trace!(event = kind.as_str(), handlers = matching.len(), "publishing event");

        for callback in matching {
            callback(&event)?;
        }

        Ok(())
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &*self.subscriptions.read())
            .finish()
    }
}
