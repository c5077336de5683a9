//! # Subscription registry - type-keyed membership of handlers.
//!
//! Registry maps every [`EventType`] to the ordered list of its subscriptions:
//! - `add` → appends a subscription, rejecting a second copy of the same handler
//! - `remove` → drops every subscription carrying the token's id
//! - `snapshot_for` → returns the bucket as an immutable slice
//!
//! ## Architecture
//! ```text
//! Mutex<HashMap<EventType, Arc<[Subscription]>>>
//!            │
//!            ├─► add(handler)     → build new slice (old + new) → swap in
//!            ├─► remove(token)    → build new slice (old - id)  → swap in / drop bucket
//!            └─► snapshot_for(ty) → Arc::clone(bucket)
//! ```
//!
//! ## Rules
//! - One lock guards the whole map; every operation holds it for its entire body
//! - Buckets are copy-on-write: a snapshot never changes after it is taken
//! - Insertion order is delivery order
//! - The lock is never held while a handler runs

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{DispatchError, HandlerError};
use crate::events::EventType;
use crate::handlers::Handler;

type Invoker = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), HandlerError> + Send + Sync>;

/// Handle returned by `subscribe`, required to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    event_type: EventType,
    id: Uuid,
}

impl Token {
    /// Event type the subscription was made for.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Unique subscription id.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// One handler registered for one event type.
///
/// Owned by the [`Registry`]; snapshots hand out shared read-only copies.
#[derive(Clone)]
pub struct Subscription {
    id: Uuid,
    event_type: EventType,
    handler: Cow<'static, str>,
    identity: usize,
    invoke: Invoker,
}

impl Subscription {
    fn new<E: Any + Send + Sync>(id: Uuid, handler: Handler<E>) -> Self {
        let name = Cow::Owned(handler.name().to_string());
        let identity = handler.identity();
        let invoke: Invoker = Arc::new(move |event: &(dyn Any + Send + Sync)| {
            match event.downcast_ref::<E>() {
                Some(event) => handler.call(event),
                None => Err(HandlerError::TypeMismatch {
                    expected: std::any::type_name::<E>(),
                }),
            }
        });

        Self {
            id,
            event_type: EventType::of::<E>(),
            handler: name,
            identity,
            invoke,
        }
    }

    /// Subscription id (the token's id).
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Event type this subscription routes.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Name of the subscribed handler.
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Runs the handler on `event`.
    pub(crate) fn invoke(&self, event: &(dyn Any + Send + Sync)) -> Result<(), HandlerError> {
        (self.invoke)(event)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Thread-safe registry of subscriptions keyed by event type.
#[derive(Default)]
pub struct Registry {
    buckets: Mutex<HashMap<EventType, Arc<[Subscription]>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to events of type `E`.
    ///
    /// Fails with [`DispatchError::DuplicateSubscriber`] if the same handler is
    /// already subscribed to `E`; membership is unchanged in that case.
    ///
    /// Only reachable through [`Dispatcher::subscribe`](crate::Dispatcher::subscribe),
    /// which enforces the post-shutdown rules.
    pub(crate) fn add<E: Any + Send + Sync>(&self, handler: Handler<E>) -> Result<Token, DispatchError> {
        let token = Token {
            event_type: EventType::of::<E>(),
            id: Uuid::new_v4(),
        };
        let subscription = Subscription::new(token.id, handler);

        let mut buckets = self.buckets.lock();
        let current = buckets.get(&token.event_type);

        if let Some(bucket) = current {
            if bucket.iter().any(|s| s.identity == subscription.identity) {
                return Err(DispatchError::DuplicateSubscriber {
                    handler: subscription.handler.to_string(),
                    event_type: token.event_type,
                });
            }
        }

        let next: Arc<[Subscription]> = current
            .into_iter()
            .flat_map(|bucket| bucket.iter().cloned())
            .chain(std::iter::once(subscription))
            .collect();
        let size = next.len();
        buckets.insert(token.event_type, next);
        drop(buckets);

        debug!(event_type = %token.event_type, id = %token.id, subscribers = size, "subscribed");
        Ok(token)
    }

    /// Removes every subscription whose id equals the token's id.
    ///
    /// Idempotent: unknown tokens and already removed subscriptions are ignored.
    /// Returns the number of removed subscriptions.
    pub fn remove(&self, token: &Token) -> usize {
        let mut buckets = self.buckets.lock();
        let Some(bucket) = buckets.get(&token.event_type) else {
            return 0;
        };

        let next: Vec<Subscription> = bucket.iter().filter(|s| s.id != token.id).cloned().collect();
        let removed = bucket.len() - next.len();
        if removed == 0 {
            return 0;
        }

        if next.is_empty() {
            buckets.remove(&token.event_type);
        } else {
            buckets.insert(token.event_type, next.into());
        }
        drop(buckets);

        debug!(event_type = %token.event_type, id = %token.id, removed, "unsubscribed");
        removed
    }

    /// Returns the current subscriptions for `event_type` in delivery order.
    ///
    /// The slice is immutable; later `add`/`remove` calls do not affect it.
    pub fn snapshot_for(&self, event_type: EventType) -> Arc<[Subscription]> {
        let snapshot = self
            .buckets
            .lock()
            .get(&event_type)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()));
        trace!(event_type = %event_type, subscribers = snapshot.len(), "snapshot taken");
        snapshot
    }

    /// Returns the stored key equal to `event_type`, which carries the type name.
    ///
    /// Keys built by [`EventType::of_val`] have no readable name; this recovers it
    /// while the type has subscribers. Otherwise `event_type` is returned as is.
    pub(crate) fn resolve(&self, event_type: EventType) -> EventType {
        self.buckets
            .lock()
            .get_key_value(&event_type)
            .map(|(key, _)| *key)
            .unwrap_or(event_type)
    }

    /// Number of subscriptions for `event_type`.
    pub fn len(&self, event_type: EventType) -> usize {
        self.buckets
            .lock()
            .get(&event_type)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }

    /// True if no event type has subscriptions.
    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }

    /// Returns sorted names of event types with at least one subscription.
    pub fn event_types(&self) -> Vec<&'static str> {
        let buckets = self.buckets.lock();
        let mut names: Vec<&'static str> = buckets.keys().map(EventType::name).collect();
        names.sort_unstable();
        names
    }

    /// Drops every subscription.
    pub fn clear(&self) {
        let dropped: usize = {
            let mut buckets = self.buckets.lock();
            let count = buckets.values().map(|b| b.len()).sum();
            buckets.clear();
            count
        };
        debug!(dropped, "registry cleared");
    }
}
